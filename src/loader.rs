use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::models::RawTable;

pub fn load_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| AnalysisError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

pub fn read_csv<R: std::io::Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    let columns = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    tracing::debug!(
        columns = columns.len(),
        rows = records.len(),
        "read raw offers table"
    );

    Ok(RawTable { columns, records })
}
