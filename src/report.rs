use std::fmt::Write;

use crate::claim_view::ClaimViewReport;
use crate::profitability::ProfitabilityReport;
use crate::segmentation::SegmentationReport;
use crate::table::Table;

/// The sign follows the dollar sign: `$-12.00`.
pub fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

fn format_mean(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "nan".to_string(),
    }
}

pub fn claim_view_summary(report: &ClaimViewReport) -> String {
    let mut output = String::new();

    for subset in &report.subsets {
        let label = subset.label.to_uppercase();
        let _ = writeln!(output, "=== {label} ===");
        let _ = writeln!(
            output,
            "Average claim-to-view ratio: {}",
            format_mean(subset.average_ratio, 4)
        );
        let _ = writeln!(
            output,
            "Average views before a claim: {:.2}",
            subset.average_views_before_claim
        );
        let _ = writeln!(output);

        let _ = writeln!(output, "=== {label} SHIFT VIEW STATS ===");
        let _ = writeln!(
            output,
            "Average number of views before a shift is claimed: {}",
            format_mean(subset.average_shift_views, 2)
        );
        let _ = writeln!(output);
    }

    output
}

pub fn profitability_summary(report: &ProfitabilityReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Profitability Summary");

    match report.most_profitable_slot() {
        Some(slot) => {
            let _ = writeln!(
                output,
                "Most profitable shift type: {} ({} total profit)",
                slot.slot,
                format_currency(slot.total_profit)
            );
        }
        None => {
            let _ = writeln!(output, "Most profitable shift type: n/a");
        }
    }

    match report.most_profitable_rate() {
        Some(rate) => {
            let _ = writeln!(
                output,
                "Most profitable pay rate: ${} ({} total profit)",
                rate.rounded_rate,
                format_currency(rate.total_profit)
            );
        }
        None => {
            let _ = writeln!(output, "Most profitable pay rate: n/a");
        }
    }

    output
}

pub fn segmentation_summary(report: &SegmentationReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Worker Group Counts (Claimed Shifts Only):");
    for count in &report.counts {
        let _ = writeln!(output, "{}: {} workers", count.label, count.workers);
    }
    output
}

pub fn markdown_table(table: &Table, max_rows: usize) -> String {
    let mut output = String::new();
    if table.columns.is_empty() {
        return output;
    }

    let _ = writeln!(output, "| {} |", table.columns.join(" | "));
    let _ = writeln!(
        output,
        "|{}|",
        table.columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    );
    for row in table.rows.iter().take(max_rows) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.display().replace('|', "\\|"))
            .collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
    if table.rows.len() > max_rows {
        let _ = writeln!(output, "_{} more rows_", table.rows.len() - max_rows);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim_view::SubsetMetrics;
    use crate::config::SegmentBy;
    use crate::models::{GroupCount, RateProfit, SlotProfit};

    fn subset(label: &str, ratio: Option<f64>, views: f64, shift_views: Option<f64>) -> SubsetMetrics {
        SubsetMetrics {
            label: label.to_string(),
            worker_stats: Vec::new(),
            average_ratio: ratio,
            average_views_before_claim: views,
            shift_views: Vec::new(),
            average_shift_views: shift_views,
        }
    }

    #[test]
    fn claim_view_blocks_keep_processing_order() {
        let report = ClaimViewReport {
            subsets: vec![
                subset("Overall", Some(1.0 / 3.0), 3.0, Some(3.0)),
                subset("Overnight", Some(0.0), f64::INFINITY, None),
            ],
        };
        let text = claim_view_summary(&report);
        let expected = "\
=== OVERALL ===
Average claim-to-view ratio: 0.3333
Average views before a claim: 3.00

=== OVERALL SHIFT VIEW STATS ===
Average number of views before a shift is claimed: 3.00

=== OVERNIGHT ===
Average claim-to-view ratio: 0.0000
Average views before a claim: inf

=== OVERNIGHT SHIFT VIEW STATS ===
Average number of views before a shift is claimed: nan

";
        assert_eq!(text, expected);
    }

    #[test]
    fn profitability_names_winners_as_currency() {
        let report = ProfitabilityReport {
            claimed: Vec::new(),
            by_slot: vec![SlotProfit {
                slot: "NOC".to_string(),
                total_profit: 1234.5,
                average_profit_per_shift: Some(411.5),
                number_of_claims: 3,
            }],
            by_rate: vec![RateProfit {
                rounded_rate: 25,
                total_profit: -12.0,
                number_of_claims: 1,
                average_profit_per_shift: Some(-12.0),
            }],
        };
        let text = profitability_summary(&report);
        assert_eq!(
            text,
            "Profitability Summary\n\
             Most profitable shift type: NOC ($1234.50 total profit)\n\
             Most profitable pay rate: $25 ($-12.00 total profit)\n"
        );
    }

    #[test]
    fn negative_profit_keeps_sign_after_dollar() {
        assert_eq!(format_currency(-12.0), "$-12.00");
        assert_eq!(format_currency(0.0), "$0.00");

        let report = ProfitabilityReport {
            claimed: Vec::new(),
            by_slot: vec![SlotProfit {
                slot: "AM".to_string(),
                total_profit: -12.0,
                average_profit_per_shift: Some(-12.0),
                number_of_claims: 1,
            }],
            by_rate: Vec::new(),
        };
        assert!(profitability_summary(&report)
            .contains("Most profitable shift type: AM ($-12.00 total profit)"));
    }

    #[test]
    fn empty_profitability_reports_na() {
        let report = ProfitabilityReport {
            claimed: Vec::new(),
            by_slot: Vec::new(),
            by_rate: Vec::new(),
        };
        assert!(profitability_summary(&report).contains("Most profitable shift type: n/a"));
    }

    #[test]
    fn segmentation_lists_worker_counts() {
        let report = SegmentationReport {
            segment_by: SegmentBy::Slot,
            groups: Vec::new(),
            counts: vec![
                GroupCount {
                    label: "AM".to_string(),
                    workers: 12,
                },
                GroupCount {
                    label: "NOC".to_string(),
                    workers: 4,
                },
            ],
        };
        assert_eq!(
            segmentation_summary(&report),
            "Worker Group Counts (Claimed Shifts Only):\nAM: 12 workers\nNOC: 4 workers\n"
        );
    }

    #[test]
    fn markdown_tables_are_truncated() {
        let mut table = Table::new(&["slot", "total_profit"]);
        table.push(vec!["AM".into(), 10.0.into()]);
        table.push(vec!["PM".into(), 5.5.into()]);

        let text = markdown_table(&table, 1);
        assert_eq!(
            text,
            "| slot | total_profit |\n|---|---|\n| AM | 10 |\n_1 more rows_\n"
        );
    }
}
