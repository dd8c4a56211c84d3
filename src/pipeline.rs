use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{AnalysisConfig, AnalyzerKind, OutputFormat};
use crate::error::Result;
use crate::models::ShiftOffer;
use crate::table::Sheet;
use crate::workbook::{self, WrittenWorkbook};
use crate::{claim_rate, claim_view, profitability, report, segmentation};

pub const CLAIM_VIEW_WORKBOOK: &str = "claim_view_analysis";
pub const CLAIM_VIEW_SUMMARY: &str = "claim_view_summary.txt";
pub const CLAIM_RATE_WORKBOOK: &str = "claim_percentage";
pub const PROFITABILITY_WORKBOOK: &str = "shift_profitability_analysis";
pub const PROFITABILITY_SUMMARY: &str = "shift_profitability_summary.txt";
pub const SEGMENTATION_WORKBOOK: &str = "worker_grouping_analysis";
pub const SEGMENTATION_SUMMARY: &str = "worker_grouping_summary.txt";

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerOutput {
    pub analyzer: AnalyzerKind,
    pub workbook: WrittenWorkbook,
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub rows: usize,
    pub claimed_rows: usize,
    pub outputs: Vec<AnalyzerOutput>,
}

/// Selected analyzers in their canonical run order, without duplicates.
pub fn run_order(selected: &[AnalyzerKind]) -> Vec<AnalyzerKind> {
    AnalyzerKind::ALL
        .into_iter()
        .filter(|kind| selected.contains(kind))
        .collect()
}

pub fn run(
    offers: &[ShiftOffer],
    analyzers: &[AnalyzerKind],
    config: &AnalysisConfig,
    format: &OutputFormat,
    output_dir: &Path,
) -> Result<RunReport> {
    config.validate()?;
    format.validate()?;
    std::fs::create_dir_all(output_dir)?;

    let mut outputs = Vec::new();
    for kind in run_order(analyzers) {
        tracing::info!(analyzer = ?kind, "running analyzer");
        let (stem, sheets, summary) = match kind {
            AnalyzerKind::ClaimView => {
                let result = claim_view::analyze(offers);
                (
                    CLAIM_VIEW_WORKBOOK,
                    result.sheets(config.sample_rows),
                    Some((CLAIM_VIEW_SUMMARY, report::claim_view_summary(&result))),
                )
            }
            AnalyzerKind::ClaimRate => {
                let result = claim_rate::analyze(offers, config.min_offers, config.top_fraction);
                (CLAIM_RATE_WORKBOOK, result.sheets(), None)
            }
            AnalyzerKind::Profitability => {
                let result = profitability::analyze(offers);
                (
                    PROFITABILITY_WORKBOOK,
                    result.sheets(),
                    Some((PROFITABILITY_SUMMARY, report::profitability_summary(&result))),
                )
            }
            AnalyzerKind::Segmentation => {
                let result = segmentation::analyze(offers, config.segment_by);
                (
                    SEGMENTATION_WORKBOOK,
                    result.sheets(),
                    Some((SEGMENTATION_SUMMARY, report::segmentation_summary(&result))),
                )
            }
        };

        outputs.push(write_outputs(kind, output_dir, stem, &sheets, summary, format)?);
    }

    Ok(RunReport {
        rows: offers.len(),
        claimed_rows: offers.iter().filter(|offer| offer.is_claimed()).count(),
        outputs,
    })
}

fn write_outputs(
    analyzer: AnalyzerKind,
    output_dir: &Path,
    stem: &str,
    sheets: &[Sheet],
    summary: Option<(&str, String)>,
    format: &OutputFormat,
) -> Result<AnalyzerOutput> {
    let workbook = workbook::write_sheets(output_dir, stem, sheets, format)?;

    let summary = match summary {
        Some((file_name, text)) => {
            let path = output_dir.join(file_name);
            std::fs::write(&path, text)?;
            tracing::info!(path = %path.display(), "wrote summary");
            Some(path)
        }
        None => None,
    };

    Ok(AnalyzerOutput {
        analyzer,
        workbook,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Artifacts;
    use crate::error::AnalysisError;
    use crate::normalize::classify_period;
    use chrono::NaiveDate;

    fn offer(worker: &str, shift: &str, slot: &str, pay: f64, claimed: bool) -> ShiftOffer {
        ShiftOffer {
            worker_id: worker.to_string(),
            shift_id: shift.to_string(),
            slot: Some(slot.to_string()),
            shift_period: classify_period(Some(slot)),
            pay_rate: pay,
            charge_rate: Some(pay + 8.0),
            duration: Some(8.0),
            shift_start_at: None,
            shift_created_at: None,
            offer_viewed_at: None,
            claimed_at: claimed.then(|| {
                NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            }),
            canceled_at: None,
            deleted_at: None,
        }
    }

    fn sample_offers() -> Vec<ShiftOffer> {
        vec![
            offer("W1", "S1", "NOC", 30.0, false),
            offer("W2", "S1", "NOC", 30.0, false),
            offer("W1", "S1", "NOC", 30.0, true),
            offer("W2", "S2", "AM", 22.0, true),
            offer("W3", "S3", "PM", 25.0, false),
        ]
    }

    #[test]
    fn run_order_is_canonical_and_deduplicated() {
        let order = run_order(&[
            AnalyzerKind::Segmentation,
            AnalyzerKind::ClaimView,
            AnalyzerKind::Segmentation,
        ]);
        assert_eq!(order, vec![AnalyzerKind::ClaimView, AnalyzerKind::Segmentation]);
    }

    #[test]
    fn writes_every_workbook_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(
            &sample_offers(),
            &AnalyzerKind::ALL,
            &AnalysisConfig::default(),
            &OutputFormat::default(),
            dir.path(),
        )
        .unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.claimed_rows, 2);
        assert_eq!(report.outputs.len(), 4);

        for stem in [
            CLAIM_VIEW_WORKBOOK,
            CLAIM_RATE_WORKBOOK,
            PROFITABILITY_WORKBOOK,
            SEGMENTATION_WORKBOOK,
        ] {
            assert!(dir.path().join(format!("{stem}.xlsx")).exists(), "{stem}");
        }

        let summary = std::fs::read_to_string(dir.path().join(CLAIM_VIEW_SUMMARY)).unwrap();
        assert!(summary.starts_with("=== OVERALL ===\n"));
        let overnight = summary.find("=== OVERNIGHT ===").unwrap();
        assert!(summary.find("=== AM ===").unwrap() < overnight);

        let profit = std::fs::read_to_string(dir.path().join(PROFITABILITY_SUMMARY)).unwrap();
        assert!(profit.contains("Most profitable shift type: AM ($64.00 total profit)"));

        let groups = std::fs::read_to_string(dir.path().join(SEGMENTATION_SUMMARY)).unwrap();
        assert!(groups.contains("AM: 1 workers"));
        assert!(groups.contains("NOC: 1 workers"));
    }

    #[test]
    fn selected_subset_only_writes_its_files() {
        let dir = tempfile::tempdir().unwrap();
        let format = OutputFormat::from_artifacts(Artifacts::Csv, 31);
        let report = run(
            &sample_offers(),
            &[AnalyzerKind::ClaimRate],
            &AnalysisConfig::default(),
            &format,
            dir.path(),
        )
        .unwrap();

        assert_eq!(report.outputs.len(), 1);
        assert!(report.outputs[0].summary.is_none());
        assert!(dir.path().join(CLAIM_RATE_WORKBOOK).join("Top_10_Percent.csv").exists());
        assert!(!dir.path().join(CLAIM_VIEW_SUMMARY).exists());
    }

    #[test]
    fn invalid_config_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            sample_rows: 0,
            ..AnalysisConfig::default()
        };
        let err = run(
            &sample_offers(),
            &AnalyzerKind::ALL,
            &config,
            &OutputFormat::default(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
        assert!(!dir.path().join(CLAIM_VIEW_SUMMARY).exists());
    }
}
