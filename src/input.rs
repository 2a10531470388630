use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::models::WorkId;
use crate::Result;

/// Reads work ids from the first column of a CSV file.
pub fn read_work_ids(path: &Path) -> Result<Vec<WorkId>> {
    let file = std::fs::File::open(path)?;
    read_work_ids_from(file)
}

/// A leading value starting with "work" (any case) is treated as a header.
/// Blank values are skipped.
pub fn read_work_ids_from<R: Read>(reader: R) -> Result<Vec<WorkId>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let Some(value) = record.get(0).map(str::trim) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if row == 0 && value.to_lowercase().starts_with("work") {
            continue;
        }
        ids.push(WorkId::new(value));
    }
    Ok(ids)
}
