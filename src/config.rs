use clap::ValueEnum;
use serde::Serialize;

use crate::error::{AnalysisError, Result};

pub const DEFAULT_MIN_OFFERS: usize = 50;
pub const DEFAULT_TOP_FRACTION: f64 = 0.10;
pub const DEFAULT_SAMPLE_ROWS: usize = 100;
/// Longest worksheet name the XLSX format accepts.
pub const XLSX_SHEET_NAME_LIMIT: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    ClaimView,
    ClaimRate,
    Profitability,
    Segmentation,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 4] = [
        AnalyzerKind::ClaimView,
        AnalyzerKind::ClaimRate,
        AnalyzerKind::Profitability,
        AnalyzerKind::Segmentation,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentBy {
    #[default]
    Slot,
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Artifacts {
    Xlsx,
    Csv,
    #[default]
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub min_offers: usize,
    pub top_fraction: f64,
    pub sample_rows: usize,
    pub segment_by: SegmentBy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_offers: DEFAULT_MIN_OFFERS,
            top_fraction: DEFAULT_TOP_FRACTION,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            segment_by: SegmentBy::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.top_fraction > 0.0 && self.top_fraction <= 1.0) {
            return Err(AnalysisError::Config(format!(
                "top fraction must be in (0, 1], got {}",
                self.top_fraction
            )));
        }
        if self.sample_rows == 0 {
            return Err(AnalysisError::Config(
                "sample rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFormat {
    pub sheet_name_limit: usize,
    pub write_xlsx: bool,
    pub write_csv: bool,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::from_artifacts(Artifacts::default(), XLSX_SHEET_NAME_LIMIT)
    }
}

impl OutputFormat {
    pub fn from_artifacts(artifacts: Artifacts, sheet_name_limit: usize) -> Self {
        Self {
            sheet_name_limit,
            write_xlsx: matches!(artifacts, Artifacts::Xlsx | Artifacts::Both),
            write_csv: matches!(artifacts, Artifacts::Csv | Artifacts::Both),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet_name_limit == 0 {
            return Err(AnalysisError::Config(
                "sheet name limit must be at least 1".to_string(),
            ));
        }
        if self.write_xlsx && self.sheet_name_limit > XLSX_SHEET_NAME_LIMIT {
            return Err(AnalysisError::Config(format!(
                "xlsx sheet names cannot exceed {XLSX_SHEET_NAME_LIMIT} characters"
            )));
        }
        Ok(())
    }

    pub fn sheet_name(&self, label: &str) -> String {
        label
            .chars()
            .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
            .take(self.sheet_name_limit)
            .collect()
    }
}
