use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::{AnalysisError, Result};
use crate::table::{Cell, Sheet, Table};

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, Serialize)]
pub struct WrittenWorkbook {
    pub xlsx: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub sheets: Vec<String>,
}

pub fn mirror_dir(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(stem)
}

pub fn resolve_sheet_names(sheets: &[Sheet], format: &OutputFormat) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let name = format.sheet_name(&sheet.name);
        if !seen.insert(name.to_lowercase()) {
            return Err(AnalysisError::SheetNameCollision(name));
        }
        names.push(name);
    }
    Ok(names)
}

pub fn write_sheets(
    output_dir: &Path,
    stem: &str,
    sheets: &[Sheet],
    format: &OutputFormat,
) -> Result<WrittenWorkbook> {
    let names = resolve_sheet_names(sheets, format)?;
    std::fs::create_dir_all(output_dir)?;

    let mut written = WrittenWorkbook {
        xlsx: None,
        csv_dir: None,
        sheets: names.clone(),
    };

    if format.write_xlsx {
        if sheets.is_empty() {
            tracing::warn!(workbook = stem, "no sheets to write, skipping xlsx");
        } else {
            let path = output_dir.join(format!("{stem}.xlsx"));
            write_xlsx(&path, sheets, &names)?;
            tracing::info!(path = %path.display(), sheets = names.len(), "wrote workbook");
            written.xlsx = Some(path);
        }
    }

    if format.write_csv {
        let dir = mirror_dir(output_dir, stem);
        write_csv_mirror(&dir, sheets, &names)?;
        tracing::info!(path = %dir.display(), sheets = names.len(), "wrote csv mirror");
        written.csv_dir = Some(dir);
    }

    Ok(written)
}

pub fn write_xlsx(path: &Path, sheets: &[Sheet], names: &[String]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    for (sheet, name) in sheets.iter().zip(names) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;

        for (col, column) in sheet.table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, column, &header)?;
        }

        for (index, row) in sheet.table.rows.iter().enumerate() {
            let row_number = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(value) => {
                        worksheet.write_string(row_number, col, value)?;
                    }
                    Cell::Int(value) => {
                        worksheet.write_number(row_number, col, *value as f64)?;
                    }
                    Cell::Float(value) => {
                        worksheet.write_number(row_number, col, *value)?;
                    }
                    Cell::Timestamp(value) => {
                        worksheet.write_datetime_with_format(row_number, col, value, &datetime)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes `<dir>/<sheet>.csv` per sheet, replacing any previous mirror contents.
pub fn write_csv_mirror(dir: &Path, sheets: &[Sheet], names: &[String]) -> Result<()> {
    if dir.exists() {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                std::fs::remove_file(&path)?;
            }
        }
    }
    std::fs::create_dir_all(dir)?;

    for (sheet, name) in sheets.iter().zip(names) {
        let mut writer = csv::Writer::from_path(dir.join(format!("{name}.csv")))?;
        writer.write_record(&sheet.table.columns)?;
        for row in &sheet.table.rows {
            writer.write_record(row.iter().map(Cell::display))?;
        }
        writer.flush()?;
    }
    Ok(())
}

pub fn read_csv_sheet(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut table = Table {
        columns,
        rows: Vec::new(),
    };
    for result in reader.records() {
        let record = result?;
        table.rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(table)
}

pub fn list_mirror_sheets(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
