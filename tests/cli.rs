use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const REGISTER: &str = "\
Date,Account,Payee,Memo,Category Group,Category,Outflow,Inflow
01/01/2025,Joint Checking: Bob & Amy,Starting Balance,,Inflow,Ready to Assign,$0.00,\"$1,000.00\"
01/02/2025,Joint Checking: Bob & Amy,Costco,,Everyday,Groceries,$80.00,$0.00
01/02/2025,Joint Checking: Bob & Amy,Costco,,Everyday,Household,$20.00,$0.00
01/02/2025,Joint Checking: Bob & Amy,Corner Coffee,double latte,Everyday,Dining,$4.50,$0.00
01/03/2025,Joint Checking: Bob & Amy,Transfer : Savings,,,,$100.00,$0.00
01/03/2025,Savings,Transfer : Joint Checking: Bob & Amy,,,,$0.00,$100.00
01/03/2025,Joint Checking: Bob & Amy,Mystery Shop,,Weird Group,Weird Category,$10.00,$0.00
";

const MAPPING: &str = r#"[
  {"source_group": "Everyday", "source_category": "Groceries",
   "monarch_group": "Food", "monarch_category": "Groceries", "tags": ["household"]},
  {"source_group": "Everyday", "source_category": "Household",
   "monarch_group": "Home", "monarch_category": "Supplies"},
  {"source_group": "Everyday", "source_category": "Dining",
   "monarch_group": "Food", "monarch_category": "Coffee", "memo": "latte"}
]"#;

fn write_fixtures(dir: &Path) -> (String, String) {
    let register = dir.join("register.csv");
    let mapping = dir.join("mapping.json");
    std::fs::write(&register, REGISTER).unwrap();
    std::fs::write(&mapping, MAPPING).unwrap();
    (
        register.to_str().unwrap().to_string(),
        mapping.to_str().unwrap().to_string(),
    )
}

fn convert(register: &str, mapping: &str, out_dir: &str) -> Command {
    let mut cmd = Command::cargo_bin("ynab2monarch").unwrap();
    cmd.args([
        "convert",
        "--ynab-register",
        register,
        "--category-mapping",
        mapping,
        "--out-dir",
        out_dir,
    ]);
    cmd
}

#[test]
fn convert_writes_consolidated_and_per_account_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (register, mapping) = write_fixtures(dir.path());
    let out = dir.path().join("out");

    convert(&register, &mapping, out.to_str().unwrap())
        .assert()
        .success();

    let account_dir = out.join("Joint_Checking__Bob_&_Amy");
    assert!(out.join("transactions_mapped.csv").exists());
    assert!(out.join("balances_mapped.csv").exists());
    assert!(out.join("unmapped_categories.csv").exists());
    assert!(account_dir.join("transactions.csv").exists());
    assert!(account_dir.join("balances.csv").exists());
    assert!(out.join("Savings").join("transactions.csv").exists());

    let txns = std::fs::read_to_string(out.join("transactions_mapped.csv")).unwrap();
    assert!(txns.starts_with(
        "Date,Description,Original Description,Amount,Transaction Type,\
         Category,Account Name,Labels,Notes,Split Group ID"
    ));

    // the two Costco rows share one split id; nothing else gets one
    let split_ids: Vec<&str> = txns
        .lines()
        .filter(|l| l.contains("Costco"))
        .map(|l| l.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(split_ids.len(), 2);
    assert!(split_ids[0].starts_with("SPLIT-20250102-"));
    assert_eq!(split_ids[0], split_ids[1]);
    let other_ids = txns
        .lines()
        .skip(1)
        .filter(|l| !l.contains("Costco"))
        .filter(|l| !l.rsplit(',').next().unwrap().is_empty())
        .count();
    assert_eq!(other_ids, 0);

    // memo rule resolved the coffee row and overrode the memo
    let coffee = txns.lines().find(|l| l.contains("Corner Coffee")).unwrap();
    assert!(coffee.contains(",Coffee,"));
    assert!(coffee.contains(",latte,"));

    // transfers bypass mapping
    let transfer = txns.lines().find(|l| l.contains("Transfer: Savings")).unwrap();
    assert!(transfer.contains(",Transfer,"));

    let unmapped = std::fs::read_to_string(out.join("unmapped_categories.csv")).unwrap();
    assert!(unmapped.contains("Weird Group,Weird Category,1"));
}

#[test]
fn convert_reconstructs_balances_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let (register, mapping) = write_fixtures(dir.path());
    let out = dir.path().join("out");

    convert(&register, &mapping, out.to_str().unwrap())
        .assert()
        .success();

    let balances = std::fs::read_to_string(out.join("balances_mapped.csv")).unwrap();
    let lines: Vec<&str> = balances.lines().collect();
    assert_eq!(lines[0], "Date,Account,Balance");
    assert_eq!(lines[1], "2025-01-01,Joint_Checking__Bob_&_Amy,1000.00");
    assert_eq!(lines[2], "2025-01-02,Joint_Checking__Bob_&_Amy,895.50");
    assert_eq!(lines[3], "2025-01-03,Joint_Checking__Bob_&_Amy,785.50");
    assert_eq!(lines[4], "2025-01-03,Savings,100.00");
    assert_eq!(lines.len(), 5);

    let savings = std::fs::read_to_string(out.join("Savings").join("balances.csv")).unwrap();
    assert_eq!(savings, "Date,Balance\n2025-01-03,100.00\n");
}

#[test]
fn convert_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (register, mapping) = write_fixtures(dir.path());
    let out1 = dir.path().join("out1");
    let out2 = dir.path().join("out2");

    convert(&register, &mapping, out1.to_str().unwrap()).assert().success();
    convert(&register, &mapping, out2.to_str().unwrap()).assert().success();

    for name in [
        "transactions_mapped.csv",
        "balances_mapped.csv",
        "unmapped_categories.csv",
    ] {
        let a = std::fs::read(out1.join(name)).unwrap();
        let b = std::fs::read(out2.join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn dry_run_writes_nothing_and_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (register, mapping) = write_fixtures(dir.path());
    let out = dir.path().join("out");

    let dry = convert(&register, &mapping, out.to_str().unwrap())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("Transactions processed"));
    assert!(!out.exists(), "dry run must not create the output directory");

    // the dry-run summary matches the counts of a real run on the same input
    let real = convert(&register, &mapping, out.to_str().unwrap())
        .assert()
        .success();
    let dry_stdout = String::from_utf8(dry.get_output().stdout.clone()).unwrap();
    let real_stdout = String::from_utf8(real.get_output().stdout.clone()).unwrap();
    let dry_summary = dry_stdout.split_once('\n').unwrap().1.trim_end().to_string();
    let real_summary = real_stdout
        .rsplit_once("Consolidated and per-account")
        .unwrap()
        .0
        .trim_end()
        .to_string();
    assert_eq!(dry_summary, real_summary);
}

#[test]
fn malformed_date_aborts_with_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mapping) = write_fixtures(dir.path());
    let register = dir.path().join("bad.csv");
    std::fs::write(
        &register,
        "Date,Account,Payee,Memo,Category Group,Category,Outflow,Inflow\n\
         someday,Checking,Grocer,,Everyday,Groceries,$5.00,$0.00\n",
    )
    .unwrap();
    let out = dir.path().join("out");

    convert(register.to_str().unwrap(), &mapping, out.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed row at line 2"));
    assert!(!out.exists(), "no output may exist after an aborted run");
}

#[test]
fn missing_register_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mapping) = write_fixtures(dir.path());

    convert("/nonexistent/register.csv", &mapping, "out")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn invalid_mapping_json_fails_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let (register, _) = write_fixtures(dir.path());
    let mapping = dir.path().join("broken.json");
    std::fs::write(&mapping, "{ not json").unwrap();
    let out = dir.path().join("out");

    convert(&register, mapping.to_str().unwrap(), out.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("category mapping"));
    assert!(!out.exists());
}

#[test]
fn split_chunks_a_csv_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("big.csv");
    let mut content = String::from("Date,Amount\n");
    for i in 0..5 {
        content.push_str(&format!("2025-01-0{},-{}.00\n", i + 1, i + 1));
    }
    std::fs::write(&input, &content).unwrap();

    Command::cargo_bin("ynab2monarch")
        .unwrap()
        .args(["split", "--input", input.to_str().unwrap(), "--max-rows", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 rows"));

    let split_dir = dir.path().join("big_split");
    let part2 = std::fs::read_to_string(split_dir.join("big_part2.csv")).unwrap();
    assert!(part2.starts_with("Date,Amount\n"));
    assert!(split_dir.join("big_part3.csv").exists());
}
