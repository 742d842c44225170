//! Bar — the fundamental market data unit.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fixed-interval observation for one contract.
///
/// Identified by `(contract_id, date)`; the contract lives on the owning
/// [`ContractSeries`](super::ContractSeries). Bars are immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl Bar {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
            && self.open_interest.is_finite())
    }

    /// Check `low <= {open, close} <= high` and non-negative volume / open interest.
    ///
    /// Prices themselves may be zero or negative (some energy contracts have
    /// settled below zero); only the ordering is enforced.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::NonFinite { date: self.date });
        }
        if self.high < self.low {
            return Err(BarError::InvertedRange { date: self.date, high: self.high, low: self.low });
        }
        if self.open < self.low || self.open > self.high {
            return Err(BarError::OpenOutsideRange { date: self.date, open: self.open });
        }
        if self.close < self.low || self.close > self.high {
            return Err(BarError::CloseOutsideRange { date: self.date, close: self.close });
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume { date: self.date });
        }
        if self.open_interest < 0.0 {
            return Err(BarError::NegativeOpenInterest { date: self.date });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{date}: non-finite field")]
    NonFinite { date: NaiveDate },

    #[error("{date}: high {high} below low {low}")]
    InvertedRange { date: NaiveDate, high: f64, low: f64 },

    #[error("{date}: open {open} outside [low, high]")]
    OpenOutsideRange { date: NaiveDate, open: f64 },

    #[error("{date}: close {close} outside [low, high]")]
    CloseOutsideRange { date: NaiveDate, close: f64 },

    #[error("{date}: negative volume")]
    NegativeVolume { date: NaiveDate },

    #[error("{date}: negative open interest")]
    NegativeOpenInterest { date: NaiveDate },
}

/// Fixed time interval of a time-aggregated bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Minute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// How a bar was aggregated.
///
/// Series of different kinds are never mixed within one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BarKind {
    /// One bar per fixed time interval.
    Time { interval: Interval },
    /// One bar each time traded volume reaches `threshold`.
    Volume { threshold: f64 },
    /// One bar every `ticks` trades.
    TickCount { ticks: u32 },
}

impl Default for BarKind {
    fn default() -> Self {
        BarKind::Time { interval: Interval::Day }
    }
}

/// Decode an integer-encoded `YYYYMMDD` date.
pub fn date_from_yyyymmdd(value: u32) -> Option<NaiveDate> {
    let year = (value / 10_000) as i32;
    let month = (value / 100) % 100;
    let day = value % 100;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Encode a date as `YYYYMMDD`.
pub fn date_to_yyyymmdd(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            open: 4900.0,
            high: 4950.0,
            low: 4880.0,
            close: 4930.0,
            volume: 120_000.0,
            open_interest: 150_000.0,
        }
    }

    #[test]
    fn sane_bar_validates() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(matches!(bar.validate(), Err(BarError::NonFinite { .. })));
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 4870.0; // below low
        assert!(matches!(bar.validate(), Err(BarError::InvertedRange { .. })));
    }

    #[test]
    fn close_above_high_is_rejected() {
        let mut bar = sample_bar();
        bar.close = 4960.0;
        assert!(matches!(bar.validate(), Err(BarError::CloseOutsideRange { .. })));
    }

    #[test]
    fn negative_volume_and_oi_are_rejected() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(matches!(bar.validate(), Err(BarError::NegativeVolume { .. })));

        let mut bar = sample_bar();
        bar.open_interest = -1.0;
        assert!(matches!(bar.validate(), Err(BarError::NegativeOpenInterest { .. })));
    }

    #[test]
    fn negative_prices_are_allowed_when_ordered() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2020, 4, 20).unwrap(),
            open: 17.73,
            high: 17.85,
            low: -40.32,
            close: -37.63,
            volume: 247_947.0,
            open_interest: 13_380.0,
        };
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn yyyymmdd_encoding() {
        let date = date_from_yyyymmdd(20210917).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 9, 17).unwrap());
        assert_eq!(date_to_yyyymmdd(date), 20210917);
        assert!(date_from_yyyymmdd(20210230).is_none());
    }

    #[test]
    fn bar_kind_is_tagged() {
        let json = serde_json::to_string(&BarKind::default()).unwrap();
        assert_eq!(json, r#"{"kind":"time","interval":"day"}"#);
        let parsed: BarKind = serde_json::from_str(r#"{"kind":"tick_count","ticks":500}"#).unwrap();
        assert_eq!(parsed, BarKind::TickCount { ticks: 500 });
    }
}
