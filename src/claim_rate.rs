use std::collections::{BTreeMap, BTreeSet};

use crate::models::{RateClaims, RateSlotClaims, ShiftOffer};
use crate::table::{Cell, Sheet, Table};

const SELECTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct ClaimRateReport {
    pub combos: Vec<RateSlotClaims>,
    /// Highest claim percentages among groups meeting the sample threshold.
    pub top: Vec<RateSlotClaims>,
    pub by_rate: Vec<RateClaims>,
}

pub fn claim_percentage(claims: usize, offers: usize) -> f64 {
    if offers == 0 {
        0.0
    } else {
        100.0 * claims as f64 / offers as f64
    }
}

pub fn claims_by_rate_and_slot(offers: &[ShiftOffer]) -> Vec<RateSlotClaims> {
    let mut groups: BTreeMap<(i64, &str), (usize, usize)> = BTreeMap::new();
    for offer in offers {
        let Some(slot) = offer.slot.as_deref() else {
            continue;
        };
        let entry = groups.entry((offer.rounded_rate(), slot)).or_insert((0, 0));
        entry.0 += 1;
        if offer.is_claimed() {
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((rounded_rate, slot), (total_offers, total_claims))| RateSlotClaims {
            rounded_rate,
            slot: slot.to_string(),
            total_offers,
            total_claims,
            claim_percentage: claim_percentage(total_claims, total_offers),
        })
        .collect()
}

pub fn claims_by_rate(offers: &[ShiftOffer]) -> Vec<RateClaims> {
    let mut groups: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for offer in offers {
        let entry = groups.entry(offer.rounded_rate()).or_insert((0, 0));
        entry.0 += 1;
        if offer.is_claimed() {
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(rounded_rate, (total_offers, total_claims))| RateClaims {
            rounded_rate,
            total_offers,
            total_claims,
            claim_percentage: claim_percentage(total_claims, total_offers),
        })
        .collect()
}

pub fn top_count(eligible: usize, fraction: f64) -> usize {
    if eligible == 0 {
        return 0;
    }
    let wanted = (eligible as f64 * fraction - SELECTION_TOLERANCE).ceil();
    (wanted.max(1.0) as usize).min(eligible)
}

/// Picks the top `fraction` of groups with at least `min_offers` offers.
///
/// Ties in claim percentage keep key order. Result rows come back in key order.
pub fn select_top(combos: &[RateSlotClaims], min_offers: usize, fraction: f64) -> Vec<RateSlotClaims> {
    let mut eligible: Vec<&RateSlotClaims> = combos
        .iter()
        .filter(|combo| combo.total_offers >= min_offers)
        .collect();
    eligible.sort_by(|a, b| {
        b.claim_percentage
            .partial_cmp(&a.claim_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let keys: BTreeSet<(i64, &str)> = eligible
        .iter()
        .take(top_count(eligible.len(), fraction))
        .map(|combo| (combo.rounded_rate, combo.slot.as_str()))
        .collect();

    combos
        .iter()
        .filter(|combo| keys.contains(&(combo.rounded_rate, combo.slot.as_str())))
        .cloned()
        .collect()
}

pub fn analyze(offers: &[ShiftOffer], min_offers: usize, fraction: f64) -> ClaimRateReport {
    let combos = claims_by_rate_and_slot(offers);
    let top = select_top(&combos, min_offers, fraction);
    tracing::debug!(
        groups = combos.len(),
        top = top.len(),
        min_offers,
        "rate/slot claim groups"
    );

    ClaimRateReport {
        by_rate: claims_by_rate(offers),
        combos,
        top,
    }
}

impl ClaimRateReport {
    pub fn pivot(&self) -> Table {
        let slots: BTreeSet<&str> = self.combos.iter().map(|c| c.slot.as_str()).collect();
        let mut values: BTreeMap<i64, BTreeMap<&str, f64>> = BTreeMap::new();
        for combo in &self.combos {
            values
                .entry(combo.rounded_rate)
                .or_default()
                .insert(combo.slot.as_str(), combo.claim_percentage);
        }

        let mut columns = vec!["rounded_rate"];
        columns.extend(slots.iter().copied());
        let mut table = Table::new(columns.as_slice());

        for (rate, by_slot) in values {
            let mut row: Vec<Cell> = vec![rate.into()];
            for slot in &slots {
                let value = by_slot.get(slot).copied().unwrap_or(0.0);
                row.push(round2(value).into());
            }
            table.push(row);
        }
        table
    }

    pub fn sheets(&self) -> Vec<Sheet> {
        vec![
            Sheet::new("All_Rate_Slot_Combos", combo_table(&self.combos)),
            Sheet::new("Top_10_Percent", combo_table(&self.top)),
            Sheet::new("Pivot_Rate_vs_Slot", self.pivot()),
            Sheet::new("Overall_By_Rate", rate_table(&self.by_rate)),
        ]
    }
}

fn combo_table(combos: &[RateSlotClaims]) -> Table {
    let mut table = Table::new(&[
        "rounded_rate",
        "slot",
        "total_offers",
        "total_claims",
        "claim_percentage",
    ]);
    for combo in combos {
        table.push(vec![
            combo.rounded_rate.into(),
            combo.slot.clone().into(),
            combo.total_offers.into(),
            combo.total_claims.into(),
            combo.claim_percentage.into(),
        ]);
    }
    table
}

fn rate_table(rates: &[RateClaims]) -> Table {
    let mut table = Table::new(&["rounded_rate", "total_offers", "total_claims", "claim_percentage"]);
    for rate in rates {
        table.push(vec![
            rate.rounded_rate.into(),
            rate.total_offers.into(),
            rate.total_claims.into(),
            rate.claim_percentage.into(),
        ]);
    }
    table
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
