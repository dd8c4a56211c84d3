use std::fmt;

use chrono::NaiveDateTime;

/// Input columns every table must carry, after trimming and lower-casing.
pub const REQUIRED_COLUMNS: [&str; 12] = [
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
];

pub const TIMESTAMP_COLUMNS: [&str; 6] = [
    "shift_start_at",
    "shift_created_at",
    "offer_viewed_at",
    "claimed_at",
    "canceled_at",
    "deleted_at",
];

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShiftPeriod {
    Am,
    Pm,
    Overnight,
    Unknown,
}

impl ShiftPeriod {
    pub const ANALYZED: [ShiftPeriod; 3] = [ShiftPeriod::Am, ShiftPeriod::Pm, ShiftPeriod::Overnight];

    pub fn label(self) -> &'static str {
        match self {
            ShiftPeriod::Am => "AM",
            ShiftPeriod::Pm => "PM",
            ShiftPeriod::Overnight => "Overnight",
            ShiftPeriod::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ShiftPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftOffer {
    pub worker_id: String,
    pub shift_id: String,
    /// Trimmed, upper-cased slot code; `None` when the source cell was blank.
    pub slot: Option<String>,
    pub shift_period: ShiftPeriod,
    pub pay_rate: f64,
    /// `None` when the source cell was blank.
    pub charge_rate: Option<f64>,
    pub duration: Option<f64>,
    pub shift_start_at: Option<NaiveDateTime>,
    pub shift_created_at: Option<NaiveDateTime>,
    pub offer_viewed_at: Option<NaiveDateTime>,
    pub claimed_at: Option<NaiveDateTime>,
    pub canceled_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
}

impl ShiftOffer {
    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }

    pub fn rounded_rate(&self) -> i64 {
        round_rate(self.pay_rate)
    }

    /// `(charge_rate - pay_rate) * duration`, unclamped; `None` if either input is blank.
    pub fn profit(&self) -> Option<f64> {
        Some((self.charge_rate? - self.pay_rate) * self.duration?)
    }
}

/// Nearest whole currency unit, ties to even.
pub fn round_rate(rate: f64) -> i64 {
    rate.round_ties_even() as i64
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub worker_id: String,
    pub views: usize,
    pub claims: usize,
    pub claim_to_view_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftViewCount {
    pub shift_id: String,
    pub views_before_claim: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateSlotClaims {
    pub rounded_rate: i64,
    pub slot: String,
    pub total_offers: usize,
    pub total_claims: usize,
    pub claim_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateClaims {
    pub rounded_rate: i64,
    pub total_offers: usize,
    pub total_claims: usize,
    pub claim_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedProfit {
    pub shift_id: String,
    pub slot: Option<String>,
    pub pay_rate: f64,
    pub charge_rate: Option<f64>,
    pub duration: Option<f64>,
    pub profit: Option<f64>,
    pub rounded_rate: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotProfit {
    pub slot: String,
    pub total_profit: f64,
    pub average_profit_per_shift: Option<f64>,
    pub number_of_claims: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateProfit {
    pub rounded_rate: i64,
    pub total_profit: f64,
    pub number_of_claims: usize,
    pub average_profit_per_shift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerGroup {
    pub label: String,
    pub offers: Vec<ShiftOffer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    pub label: String,
    pub workers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_round_half_to_even() {
        assert_eq!(round_rate(20.4), 20);
        assert_eq!(round_rate(20.5), 20);
        assert_eq!(round_rate(21.5), 22);
        assert_eq!(round_rate(21.51), 22);
    }

    #[test]
    fn period_labels_match_output_names() {
        let labels: Vec<&str> = ShiftPeriod::ANALYZED.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["AM", "PM", "Overnight"]);
        assert_eq!(ShiftPeriod::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn blank_inputs_leave_profit_undefined() {
        let mut offer = ShiftOffer {
            worker_id: "W1".to_string(),
            shift_id: "S1".to_string(),
            slot: Some("AM".to_string()),
            shift_period: ShiftPeriod::Am,
            pay_rate: 20.0,
            charge_rate: Some(30.0),
            duration: Some(8.0),
            shift_start_at: None,
            shift_created_at: None,
            offer_viewed_at: None,
            claimed_at: None,
            canceled_at: None,
            deleted_at: None,
        };
        assert_eq!(offer.profit(), Some(80.0));

        offer.charge_rate = None;
        assert_eq!(offer.profit(), None);

        offer.charge_rate = Some(30.0);
        offer.duration = None;
        assert_eq!(offer.profit(), None);
    }
}
