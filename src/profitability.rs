use std::collections::BTreeMap;

use crate::models::{ClaimedProfit, RateProfit, ShiftOffer, SlotProfit};
use crate::table::{Sheet, Table};

#[derive(Debug, Clone)]
pub struct ProfitabilityReport {
    pub claimed: Vec<ClaimedProfit>,
    pub by_slot: Vec<SlotProfit>,
    /// Sorted by total profit, highest first.
    pub by_rate: Vec<RateProfit>,
}

/// Every claim counts; only claims with a defined profit feed the sum and mean.
#[derive(Debug, Default)]
struct ProfitTotals {
    total: f64,
    count: usize,
    priced: usize,
}

impl ProfitTotals {
    fn add(&mut self, profit: Option<f64>) {
        self.count += 1;
        if let Some(profit) = profit {
            self.total += profit;
            self.priced += 1;
        }
    }

    fn average(&self) -> Option<f64> {
        (self.priced > 0).then(|| self.total / self.priced as f64)
    }
}

pub fn claimed_profits(offers: &[ShiftOffer]) -> Vec<ClaimedProfit> {
    offers
        .iter()
        .filter(|offer| offer.is_claimed())
        .map(|offer| ClaimedProfit {
            shift_id: offer.shift_id.clone(),
            slot: offer.slot.clone(),
            pay_rate: offer.pay_rate,
            charge_rate: offer.charge_rate,
            duration: offer.duration,
            profit: offer.profit(),
            rounded_rate: offer.rounded_rate(),
        })
        .collect()
}

pub fn profit_by_slot(claimed: &[ClaimedProfit]) -> Vec<SlotProfit> {
    let mut totals: BTreeMap<&str, ProfitTotals> = BTreeMap::new();
    for row in claimed {
        if let Some(slot) = row.slot.as_deref() {
            totals.entry(slot).or_default().add(row.profit);
        }
    }

    totals
        .into_iter()
        .map(|(slot, totals)| SlotProfit {
            slot: slot.to_string(),
            total_profit: totals.total,
            average_profit_per_shift: totals.average(),
            number_of_claims: totals.count,
        })
        .collect()
}

pub fn profit_by_rate(claimed: &[ClaimedProfit]) -> Vec<RateProfit> {
    let mut totals: BTreeMap<i64, ProfitTotals> = BTreeMap::new();
    for row in claimed {
        totals.entry(row.rounded_rate).or_default().add(row.profit);
    }

    let mut rates: Vec<RateProfit> = totals
        .into_iter()
        .map(|(rounded_rate, totals)| RateProfit {
            rounded_rate,
            total_profit: totals.total,
            number_of_claims: totals.count,
            average_profit_per_shift: totals.average(),
        })
        .collect();
    rates.sort_by(|a, b| {
        b.total_profit
            .partial_cmp(&a.total_profit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rates
}

pub fn analyze(offers: &[ShiftOffer]) -> ProfitabilityReport {
    let claimed = claimed_profits(offers);
    tracing::debug!(claimed = claimed.len(), "profitability input");

    ProfitabilityReport {
        by_slot: profit_by_slot(&claimed),
        by_rate: profit_by_rate(&claimed),
        claimed,
    }
}

impl ProfitabilityReport {
    /// Slot with the highest total profit; the first slot in key order wins ties.
    pub fn most_profitable_slot(&self) -> Option<&SlotProfit> {
        let mut best: Option<&SlotProfit> = None;
        for slot in &self.by_slot {
            if best.map_or(true, |b| slot.total_profit > b.total_profit) {
                best = Some(slot);
            }
        }
        best
    }

    pub fn most_profitable_rate(&self) -> Option<&RateProfit> {
        self.by_rate.first()
    }

    pub fn sheets(&self) -> Vec<Sheet> {
        let mut claimed = Table::new(&[
            "shift_id",
            "slot",
            "pay_rate",
            "charge_rate",
            "duration",
            "profit",
            "rounded_rate",
        ]);
        for row in &self.claimed {
            claimed.push(vec![
                row.shift_id.clone().into(),
                row.slot.clone().into(),
                row.pay_rate.into(),
                row.charge_rate.into(),
                row.duration.into(),
                row.profit.into(),
                row.rounded_rate.into(),
            ]);
        }

        let mut by_slot = Table::new(&[
            "slot",
            "total_profit",
            "average_profit_per_shift",
            "number_of_claims",
        ]);
        for slot in &self.by_slot {
            by_slot.push(vec![
                slot.slot.clone().into(),
                slot.total_profit.into(),
                slot.average_profit_per_shift.into(),
                slot.number_of_claims.into(),
            ]);
        }

        let mut by_rate = Table::new(&[
            "rounded_rate",
            "total_profit",
            "number_of_claims",
            "average_profit_per_shift",
        ]);
        for rate in &self.by_rate {
            by_rate.push(vec![
                rate.rounded_rate.into(),
                rate.total_profit.into(),
                rate.number_of_claims.into(),
                rate.average_profit_per_shift.into(),
            ]);
        }

        vec![
            Sheet::new("Claimed_Offers_Profit", claimed),
            Sheet::new("Profit_By_Shift_Type", by_slot),
            Sheet::new("Profit_By_PayRate", by_rate),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn offer(slot: &str, pay: f64, charge: f64, hours: f64, claimed: bool) -> ShiftOffer {
        priced_offer(slot, pay, Some(charge), Some(hours), claimed)
    }

    fn priced_offer(
        slot: &str,
        pay: f64,
        charge: Option<f64>,
        hours: Option<f64>,
        claimed: bool,
    ) -> ShiftOffer {
        ShiftOffer {
            worker_id: "W1".to_string(),
            shift_id: format!("S-{slot}-{pay}"),
            slot: Some(slot.to_string()),
            shift_period: crate::normalize::classify_period(Some(slot)),
            pay_rate: pay,
            charge_rate: charge,
            duration: hours,
            shift_start_at: None,
            shift_created_at: None,
            offer_viewed_at: None,
            claimed_at: claimed.then(|| {
                NaiveDate::from_ymd_opt(2024, 3, 3)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            }),
            canceled_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn profit_is_margin_times_hours() {
        let offers = vec![
            offer("AM", 20.0, 30.0, 8.0, true),
            offer("PM", 40.0, 35.0, 2.0, true),
        ];
        let claimed = claimed_profits(&offers);
        assert!((claimed[0].profit.unwrap() - 80.0).abs() < 1e-9);
        assert!((claimed[1].profit.unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn unclaimed_rows_contribute_nothing() {
        let offers = vec![
            offer("AM", 20.0, 30.0, 8.0, true),
            offer("AM", 20.0, 90.0, 8.0, false),
        ];
        let report = analyze(&offers);
        assert_eq!(report.claimed.len(), 1);
        assert!((report.by_slot[0].total_profit - 80.0).abs() < 1e-9);
    }

    #[test]
    fn claim_counts_sum_to_claimed_rows() {
        let offers = vec![
            offer("AM", 20.0, 30.0, 8.0, true),
            offer("AM", 22.0, 30.0, 8.0, true),
            offer("NOC", 25.0, 40.0, 12.0, true),
            offer("PM", 25.0, 40.0, 12.0, false),
        ];
        let report = analyze(&offers);
        let total: usize = report.by_slot.iter().map(|s| s.number_of_claims).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn identifies_most_profitable_slot_and_rate() {
        let offers = vec![
            offer("AM", 20.0, 30.0, 8.0, true),
            offer("AM", 20.2, 30.0, 4.0, true),
            offer("NOC", 25.0, 40.0, 12.0, true),
        ];
        let report = analyze(&offers);

        let slot = report.most_profitable_slot().unwrap();
        assert_eq!(slot.slot, "NOC");
        assert!((slot.total_profit - 180.0).abs() < 1e-9);
        assert_eq!(slot.number_of_claims, 1);

        let rate = report.most_profitable_rate().unwrap();
        assert_eq!(rate.rounded_rate, 25);
        assert_eq!(report.by_rate[1].rounded_rate, 20);
        assert_eq!(report.by_rate[1].number_of_claims, 2);
    }

    #[test]
    fn ties_keep_first_slot() {
        let offers = vec![
            offer("PM", 20.0, 30.0, 1.0, true),
            offer("AM", 20.0, 30.0, 1.0, true),
        ];
        let report = analyze(&offers);
        assert_eq!(report.most_profitable_slot().unwrap().slot, "AM");
    }

    #[test]
    fn no_claims_means_no_winner() {
        let report = analyze(&[offer("AM", 20.0, 30.0, 8.0, false)]);
        assert!(report.most_profitable_slot().is_none());
        assert!(report.most_profitable_rate().is_none());
        assert_eq!(report.sheets().len(), 3);
    }

    #[test]
    fn blank_charge_rate_is_skipped_in_totals() {
        let offers = vec![
            offer("AM", 20.0, 30.0, 8.0, true),
            priced_offer("AM", 20.0, None, Some(8.0), true),
            priced_offer("AM", 20.0, None, Some(8.0), false),
        ];
        let report = analyze(&offers);

        assert_eq!(report.claimed.len(), 2);
        assert_eq!(report.claimed[1].profit, None);

        let slot = &report.by_slot[0];
        assert_eq!(slot.number_of_claims, 2);
        assert!((slot.total_profit - 80.0).abs() < 1e-9);
        assert_eq!(slot.average_profit_per_shift, Some(80.0));

        let rate = &report.by_rate[0];
        assert_eq!(rate.number_of_claims, 2);
        assert_eq!(rate.average_profit_per_shift, Some(80.0));
    }

    #[test]
    fn group_without_any_profit_has_no_mean() {
        let offers = vec![
            priced_offer("NOC", 25.0, Some(40.0), None, true),
            offer("AM", 20.0, 30.0, 1.0, true),
        ];
        let report = analyze(&offers);

        let noc = report.by_slot.iter().find(|s| s.slot == "NOC").unwrap();
        assert_eq!(noc.total_profit, 0.0);
        assert_eq!(noc.average_profit_per_shift, None);
        assert_eq!(report.most_profitable_slot().unwrap().slot, "AM");
    }
}
