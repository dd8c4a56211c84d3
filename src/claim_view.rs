use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ShiftOffer, ShiftPeriod, ShiftViewCount, WorkerStats};
use crate::table::{Sheet, Table};

pub const OVERALL_LABEL: &str = "Overall";

#[derive(Debug, Clone)]
pub struct SubsetMetrics {
    pub label: String,
    pub worker_stats: Vec<WorkerStats>,
    /// Mean claim-to-view ratio across workers; `None` for an empty subset.
    pub average_ratio: Option<f64>,
    pub average_views_before_claim: f64,
    pub shift_views: Vec<ShiftViewCount>,
    pub average_shift_views: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ClaimViewReport {
    pub subsets: Vec<SubsetMetrics>,
}

pub fn worker_claim_ratios(offers: &[&ShiftOffer]) -> Vec<WorkerStats> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for offer in offers {
        let entry = counts.entry(offer.worker_id.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if offer.is_claimed() {
            entry.1 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(worker_id, (views, claims))| WorkerStats {
            worker_id: worker_id.to_string(),
            views,
            claims,
            claim_to_view_ratio: if claims == 0 {
                0.0
            } else {
                claims as f64 / views as f64
            },
        })
        .collect()
}

pub fn average_ratio(stats: &[WorkerStats]) -> Option<f64> {
    let ratios: Vec<f64> = stats
        .iter()
        .filter(|s| s.views > 0)
        .map(|s| s.claim_to_view_ratio)
        .collect();
    mean(&ratios)
}

/// Reciprocal of the mean ratio; infinite when no claim was ever made.
pub fn views_before_claim(average_ratio: Option<f64>) -> f64 {
    match average_ratio {
        Some(ratio) if ratio > 0.0 => 1.0 / ratio,
        _ => f64::INFINITY,
    }
}

pub fn shift_view_counts(offers: &[&ShiftOffer]) -> Vec<ShiftViewCount> {
    let claimed: BTreeSet<&str> = offers
        .iter()
        .filter(|offer| offer.is_claimed())
        .map(|offer| offer.shift_id.as_str())
        .collect();

    let mut views: BTreeMap<&str, usize> = BTreeMap::new();
    for offer in offers {
        *views.entry(offer.shift_id.as_str()).or_insert(0) += 1;
    }

    views
        .into_iter()
        .filter(|(shift_id, _)| claimed.contains(shift_id))
        .map(|(shift_id, views_before_claim)| ShiftViewCount {
            shift_id: shift_id.to_string(),
            views_before_claim,
        })
        .collect()
}

pub fn analyze_subset(label: &str, offers: &[&ShiftOffer]) -> SubsetMetrics {
    let worker_stats = worker_claim_ratios(offers);
    let average_ratio = average_ratio(&worker_stats);
    let shift_views = shift_view_counts(offers);
    let counts: Vec<f64> = shift_views
        .iter()
        .map(|s| s.views_before_claim as f64)
        .collect();

    SubsetMetrics {
        label: label.to_string(),
        average_views_before_claim: views_before_claim(average_ratio),
        average_ratio,
        average_shift_views: mean(&counts),
        worker_stats,
        shift_views,
    }
}

pub fn analyze(offers: &[ShiftOffer]) -> ClaimViewReport {
    let all: Vec<&ShiftOffer> = offers.iter().collect();
    let mut subsets = vec![analyze_subset(OVERALL_LABEL, &all)];

    for period in ShiftPeriod::ANALYZED {
        let subset: Vec<&ShiftOffer> = offers
            .iter()
            .filter(|offer| offer.shift_period == period)
            .collect();
        tracing::debug!(period = period.label(), rows = subset.len(), "claim/view subset");
        subsets.push(analyze_subset(period.label(), &subset));
    }

    ClaimViewReport { subsets }
}

impl ClaimViewReport {
    pub fn sheets(&self, sample_rows: usize) -> Vec<Sheet> {
        let mut sheets = Vec::with_capacity(self.subsets.len() * 2);
        for subset in &self.subsets {
            let mut workers = Table::new(&["worker_id", "views", "claims", "claim_to_view_ratio"]);
            for stats in subset.worker_stats.iter().take(sample_rows) {
                workers.push(vec![
                    stats.worker_id.clone().into(),
                    stats.views.into(),
                    stats.claims.into(),
                    stats.claim_to_view_ratio.into(),
                ]);
            }
            sheets.push(Sheet::new(format!("{}_Worker_Stats", subset.label), workers));

            let mut shifts = Table::new(&["shift_id", "views_before_claim"]);
            for count in subset.shift_views.iter().take(sample_rows) {
                shifts.push(vec![
                    count.shift_id.clone().into(),
                    count.views_before_claim.into(),
                ]);
            }
            sheets.push(Sheet::new(format!("{}_Shift_Stats", subset.label), shifts));
        }
        sheets
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
