use std::io::BufReader;
use std::path::Path;

use crate::error::{MigrateError, Result};

/// Split a CSV into chunks of at most `max_rows` data rows, repeating the
/// header in every chunk. Chunks land in `<stem>_split/<stem>_partN.csv`
/// next to the input. Rows are counted strictly; split groups are not kept
/// together.
pub fn run(input: &str, max_rows: usize) -> Result<()> {
    if max_rows == 0 {
        return Err(MigrateError::Other(
            "--max-rows must be at least 1".to_string(),
        ));
    }

    let input_path = Path::new(input);
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("split");

    let file = std::fs::File::open(input_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let mut records = rdr.records();

    let Some(header) = records.next().transpose()? else {
        println!("Empty CSV file, nothing to split.");
        return Ok(());
    };
    let rows: Vec<csv::StringRecord> = records.collect::<std::result::Result<_, _>>()?;

    if rows.is_empty() {
        println!("No data rows in {}", input_path.display());
        return Ok(());
    }

    let out_dir = input_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_split"));
    std::fs::create_dir_all(&out_dir)?;

    for (i, chunk) in rows.chunks(max_rows).enumerate() {
        let path = out_dir.join(format!("{stem}_part{}.csv", i + 1));
        let mut w = csv::Writer::from_path(&path)?;
        w.write_record(&header)?;
        for record in chunk {
            w.write_record(record)?;
        }
        w.flush()?;
        println!("Wrote {} rows to {}", chunk.len(), path.display());
    }
    Ok(())
}
