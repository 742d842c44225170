//! Contract metadata and the per-contract bar series.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::bar::{Bar, BarKind};
use super::ids::ContractId;
use crate::error::CoreError;

/// Delivery year and month of a dated contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeliveryMonth {
    pub year: i32,
    pub month: u32,
}

impl DeliveryMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && NaiveDate::from_ymd_opt(year, month, 1).is_some() {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Last calendar day of the delivery month.
    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 { (self.year + 1, 1) } else { (self.year, self.month + 1) };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Static description of one contract: identity, delivery month and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub id: ContractId,
    pub delivery: Option<DeliveryMonth>,
    /// Last date on which the contract is listed.
    pub expiry: NaiveDate,
}

impl ContractSpec {
    pub fn new(id: ContractId, expiry: NaiveDate) -> Self {
        Self { id, delivery: None, expiry }
    }

    pub fn with_delivery(mut self, delivery: DeliveryMonth) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Delivery month number (1..=12), falling back to the expiry month.
    pub fn month(&self) -> u32 {
        self.delivery.map(|d| d.month).unwrap_or_else(|| self.expiry.month())
    }

    /// Last day of the delivery month, falling back to the expiry's month.
    pub fn delivery_month_end(&self) -> NaiveDate {
        self.delivery
            .or_else(|| DeliveryMonth::new(self.expiry.year(), self.expiry.month()))
            .map(|d| d.last_day())
            .unwrap_or(self.expiry)
    }
}

/// Ordered bars of one contract: strictly increasing dates, no duplicates.
///
/// Constructed only through [`ContractSeries::new`], which enforces the
/// ordering and per-bar invariants, so lookups can binary-search by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSeries {
    spec: ContractSpec,
    kind: BarKind,
    bars: Vec<Bar>,
}

impl ContractSeries {
    pub fn new(spec: ContractSpec, kind: BarKind, bars: Vec<Bar>) -> Result<Self, CoreError> {
        let id = spec.id.as_str();
        if bars.is_empty() {
            return Err(CoreError::invalid_series(id, "series has no bars"));
        }
        for bar in &bars {
            bar.validate().map_err(|e| CoreError::invalid_series(id, e.to_string()))?;
        }
        if let Some(w) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(CoreError::invalid_series(
                id,
                format!("dates not strictly increasing at {} -> {}", w[0].date, w[1].date),
            ));
        }
        let last = bars[bars.len() - 1].date;
        if last > spec.expiry {
            return Err(CoreError::invalid_series(
                id,
                format!("bar on {last} after expiry {}", spec.expiry),
            ));
        }
        Ok(Self { spec, kind, bars })
    }

    pub fn id(&self) -> &ContractId {
        &self.spec.id
    }

    pub fn spec(&self) -> &ContractSpec {
        &self.spec
    }

    pub fn kind(&self) -> BarKind {
        self.kind
    }

    pub fn expiry(&self) -> NaiveDate {
        self.spec.expiry
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Listed on `date`: first bar on or before it and not yet expired.
    pub fn is_listed(&self, date: NaiveDate) -> bool {
        self.first_date() <= date && date <= self.spec.expiry
    }

    /// Bar exactly on `date` (O(log n)).
    pub fn bar_on(&self, date: NaiveDate) -> Option<&Bar> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok().map(|i| &self.bars[i])
    }

    /// Latest bar on or before `date` (O(log n)).
    pub fn bar_on_or_before(&self, date: NaiveDate) -> Option<&Bar> {
        let idx = self.bars.partition_point(|b| b.date <= date);
        idx.checked_sub(1).map(|i| &self.bars[i])
    }

    /// Bars with `start <= date <= end`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[Bar] {
        let lo = self.bars.partition_point(|b| b.date < start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        if lo >= hi {
            &[]
        } else {
            &self.bars[lo..hi]
        }
    }
}
