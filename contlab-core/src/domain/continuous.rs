//! Output records: continuous bars, roll events and the adjustment table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::ContractId;
use crate::config::AdjustMethod;

/// One record of the continuous series.
///
/// Prices are adjusted; `volume` and `open_interest` are always the raw values
/// of the contract the bar came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub source_contract_id: ContractId,
    pub is_roll_date: bool,
}

/// Why the effective contract changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollReason {
    /// A challenger held the top liquidity score for the hysteresis window.
    Dominance,
    /// The time/fixed calendar threshold of the held contract was reached.
    Calendar,
    /// The held contract expired.
    Expiry,
}

impl RollReason {
    /// The serialized name, as written to JSON and CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            RollReason::Dominance => "dominance",
            RollReason::Calendar => "calendar",
            RollReason::Expiry => "expiry",
        }
    }
}

/// One dominance transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollEvent {
    pub date: NaiveDate,
    pub from_contract: ContractId,
    pub to_contract: ContractId,
    /// Close of `from_contract` on `date` (or its latest close before it).
    pub price_from: f64,
    /// Close of `to_contract` on `date`.
    pub price_to: f64,
    pub reason: RollReason,
}

impl RollEvent {
    /// Multiplicative step `price_to / price_from`.
    pub fn ratio(&self) -> f64 {
        self.price_to / self.price_from
    }

    /// Additive step `price_to - price_from`.
    pub fn difference(&self) -> f64 {
        self.price_to - self.price_from
    }
}

/// Which point in time keeps its original prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentAnchor {
    /// Most recent segment is unadjusted (backward, difference).
    Latest,
    /// Oldest segment is unadjusted (forward, ratio).
    Earliest,
    /// Nothing is adjusted (none).
    Unadjusted,
}

/// Transform for one segment between consecutive rolls.
///
/// `adjusted = raw * factor + offset`; multiplicative methods leave `offset`
/// at 0.0 and the difference method leaves `factor` at 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub contract: ContractId,
    /// First date of the segment (inclusive).
    pub start: NaiveDate,
    /// Last date of the segment (inclusive).
    pub end: NaiveDate,
    pub factor: f64,
    pub offset: f64,
}

impl AdjustmentEntry {
    pub fn apply(&self, price: f64) -> f64 {
        price * self.factor + self.offset
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_neutral(&self) -> bool {
        self.factor == 1.0 && self.offset == 0.0
    }
}

/// Ordered per-segment transforms for one continuous-series build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentTable {
    pub method: AdjustMethod,
    pub anchor: AdjustmentAnchor,
    pub entries: Vec<AdjustmentEntry>,
}

impl AdjustmentTable {
    /// Entry whose date range covers `date`.
    pub fn entry_for(&self, date: NaiveDate) -> Option<&AdjustmentEntry> {
        let idx = self.entries.partition_point(|e| e.start <= date);
        idx.checked_sub(1).map(|i| &self.entries[i]).filter(|e| e.contains(date))
    }
}
