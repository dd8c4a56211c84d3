use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::SegmentBy;
use crate::models::{GroupCount, ShiftOffer, WorkerGroup};
use crate::table::{Sheet, Table};

const SHEET_COLUMNS: [&str; 14] = [
    "worker_id",
    "shift_id",
    "slot",
    "pay_rate",
    "charge_rate",
    "duration",
    "shift_start_at",
    "shift_created_at",
    "offer_viewed_at",
    "claimed_at",
    "canceled_at",
    "deleted_at",
    "shift_period",
    "worker_group",
];

#[derive(Debug, Clone)]
pub struct SegmentationReport {
    pub segment_by: SegmentBy,
    /// Claimed offers per worker group, in order of first appearance.
    pub groups: Vec<WorkerGroup>,
    /// Distinct workers per group, ascending by label.
    pub counts: Vec<GroupCount>,
}

pub fn segment_key(offer: &ShiftOffer, segment_by: SegmentBy) -> Option<&str> {
    match segment_by {
        SegmentBy::Slot => offer.slot.as_deref(),
        SegmentBy::Period => Some(offer.shift_period.label()),
    }
}

/// Maps each worker with claims to the period they claim most often.
///
/// Ties go to the lexicographically smallest label.
pub fn dominant_periods(offers: &[ShiftOffer], segment_by: SegmentBy) -> HashMap<&str, &str> {
    let mut counts: HashMap<&str, BTreeMap<&str, usize>> = HashMap::new();
    for offer in offers.iter().filter(|offer| offer.is_claimed()) {
        if let Some(key) = segment_key(offer, segment_by) {
            *counts
                .entry(offer.worker_id.as_str())
                .or_default()
                .entry(key)
                .or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter_map(|(worker_id, by_period)| {
            let mut best: Option<(&str, usize)> = None;
            for (period, count) in by_period {
                if best.map_or(true, |(_, top)| count > top) {
                    best = Some((period, count));
                }
            }
            best.map(|(period, _)| (worker_id, period))
        })
        .collect()
}

pub fn analyze(offers: &[ShiftOffer], segment_by: SegmentBy) -> SegmentationReport {
    let dominant = dominant_periods(offers, segment_by);

    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<ShiftOffer>> = HashMap::new();
    let mut workers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for offer in offers.iter().filter(|offer| offer.is_claimed()) {
        let Some(&group) = dominant.get(offer.worker_id.as_str()) else {
            continue;
        };
        grouped
            .entry(group)
            .or_insert_with(|| {
                order.push(group);
                Vec::new()
            })
            .push(offer.clone());
        workers
            .entry(group)
            .or_default()
            .insert(offer.worker_id.as_str());
    }

    let groups = order
        .into_iter()
        .map(|label| WorkerGroup {
            label: label.to_string(),
            offers: grouped.remove(label).unwrap_or_default(),
        })
        .collect();

    let counts = workers
        .into_iter()
        .map(|(label, ids)| GroupCount {
            label: label.to_string(),
            workers: ids.len(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        workers = dominant.len(),
        groups = counts.len(),
        "segmented workers by dominant period"
    );

    SegmentationReport {
        segment_by,
        groups,
        counts,
    }
}

impl SegmentationReport {
    pub fn sheets(&self) -> Vec<Sheet> {
        self.groups
            .iter()
            .map(|group| {
                let mut table = Table::new(&SHEET_COLUMNS);
                for offer in &group.offers {
                    table.push(vec![
                        offer.worker_id.clone().into(),
                        offer.shift_id.clone().into(),
                        offer.slot.clone().into(),
                        offer.pay_rate.into(),
                        offer.charge_rate.into(),
                        offer.duration.into(),
                        offer.shift_start_at.into(),
                        offer.shift_created_at.into(),
                        offer.offer_viewed_at.into(),
                        offer.claimed_at.into(),
                        offer.canceled_at.into(),
                        offer.deleted_at.into(),
                        segment_key(offer, self.segment_by).into(),
                        group.label.clone().into(),
                    ]);
                }
                Sheet::new(group.label.clone(), table)
            })
            .collect()
    }
}
