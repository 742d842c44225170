//! Product Index Aggregator — a synthetic weighted bar across all live
//! contracts of a product.
//!
//! For each price field:
//! `field = Wv · Σ(volume_i / Σvolume · field_i) + Woi · Σ(oi_i / Σoi · field_i)`.
//! Volume and open interest are plain sums. A zero total makes its weighted
//! term 0 rather than dividing by zero; the breakdown reports that term as
//! absent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{DateRange, MiWeights};
use crate::data::{trading_calendar, BarStore};
use crate::domain::{Bar, ProductId};
use crate::error::CoreError;

/// Four price fields of a weighted average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    const ZERO: Ohlc = Ohlc { open: 0.0, high: 0.0, low: 0.0, close: 0.0 };

    /// Average of `bars` weighted by `share_of(bar) / total`; `None` if `total == 0`.
    fn weighted(bars: &[&Bar], share_of: impl Fn(&Bar) -> f64) -> Option<Ohlc> {
        let total: f64 = bars.iter().map(|b| share_of(*b)).sum();
        if total == 0.0 {
            return None;
        }
        let mut acc = Ohlc::ZERO;
        for bar in bars {
            let w = share_of(*bar) / total;
            acc.open += w * bar.open;
            acc.high += w * bar.high;
            acc.low += w * bar.low;
            acc.close += w * bar.close;
        }
        Some(acc)
    }

    fn scaled(self, k: f64) -> Ohlc {
        Ohlc { open: self.open * k, high: self.high * k, low: self.low * k, close: self.close * k }
    }

    fn plus(self, other: Ohlc) -> Ohlc {
        Ohlc {
            open: self.open + other.open,
            high: self.high + other.high,
            low: self.low + other.low,
            close: self.close + other.close,
        }
    }
}

/// Index bar for one product on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBar {
    pub product: ProductId,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Σ volume over live contracts.
    pub volume: f64,
    /// Σ open interest over live contracts.
    pub open_interest: f64,
    pub live_contracts: usize,
    /// Volume-weighted prices, absent when total volume is 0.
    pub volume_weighted: Option<Ohlc>,
    /// OI-weighted prices, absent when total open interest is 0.
    pub oi_weighted: Option<Ohlc>,
}

/// Each bar's blended index weight `Wv·v_i/Σv + Woi·oi_i/Σoi`.
///
/// The blended index price is exactly `Σ share_i · price_i`, which is why the
/// same shares double as a scale-free dominance score.
pub fn index_shares(bars: &[&Bar], weights: &MiWeights) -> Vec<f64> {
    let volume_total: f64 = bars.iter().map(|b| b.volume).sum();
    let oi_total: f64 = bars.iter().map(|b| b.open_interest).sum();
    bars.iter()
        .map(|b| {
            let v = if volume_total == 0.0 { 0.0 } else { b.volume / volume_total };
            let oi = if oi_total == 0.0 { 0.0 } else { b.open_interest / oi_total };
            weights.volume * v + weights.open_interest * oi
        })
        .collect()
}

/// Aggregate already-selected live bars.
pub fn aggregate(
    product: &ProductId,
    date: NaiveDate,
    bars: &[&Bar],
    weights: &MiWeights,
) -> Result<IndexBar, CoreError> {
    if bars.is_empty() {
        return Err(CoreError::NoLiveContracts { product: product.to_string(), date });
    }
    let volume_weighted = Ohlc::weighted(bars, |b| b.volume);
    let oi_weighted = Ohlc::weighted(bars, |b| b.open_interest);
    let blended = volume_weighted
        .unwrap_or(Ohlc::ZERO)
        .scaled(weights.volume)
        .plus(oi_weighted.unwrap_or(Ohlc::ZERO).scaled(weights.open_interest));

    Ok(IndexBar {
        product: product.clone(),
        date,
        open: blended.open,
        high: blended.high,
        low: blended.low,
        close: blended.close,
        volume: bars.iter().map(|b| b.volume).sum(),
        open_interest: bars.iter().map(|b| b.open_interest).sum(),
        live_contracts: bars.len(),
        volume_weighted,
        oi_weighted,
    })
}

/// Index computation over a store.
pub struct ProductIndex<'a, S: BarStore + ?Sized> {
    store: &'a S,
    weights: MiWeights,
}

impl<'a, S: BarStore + ?Sized> ProductIndex<'a, S> {
    pub fn new(store: &'a S, weights: MiWeights) -> Result<Self, CoreError> {
        weights.validate()?;
        Ok(Self { store, weights })
    }

    /// Index bar over the contracts listed on `date` that have a bar on it.
    pub fn compute(&self, product: &ProductId, date: NaiveDate) -> Result<IndexBar, CoreError> {
        let live = self.store.live_series(product, date)?;
        let bars: Vec<&Bar> = live.iter().filter_map(|s| s.bar_on(date)).collect();
        aggregate(product, date, &bars, &self.weights)
    }

    /// One index bar per trading date of the product within `range`.
    pub fn series(&self, product: &ProductId, range: &DateRange) -> Result<Vec<IndexBar>, CoreError> {
        let contracts = self.store.contracts(product)?;
        let calendar = trading_calendar(contracts.iter().copied(), range);
        if calendar.is_empty() {
            return Err(CoreError::DateRangeEmpty {
                product: product.to_string(),
                start: range.start,
                end: range.end,
            });
        }
        calendar.into_iter().map(|date| self.compute(product, date)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, day).unwrap()
    }

    fn bar(close: f64, volume: f64, oi: f64) -> Bar {
        Bar {
            date: d(1),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
            open_interest: oi,
        }
    }

    fn product() -> ProductId {
        ProductId::new("IF").unwrap()
    }

    #[test]
    fn agreeing_weights_blend_to_the_same_price() {
        let a = bar(10.0, 100.0, 50.0);
        let b = bar(20.0, 300.0, 150.0);
        let idx = aggregate(&product(), d(1), &[&a, &b], &MiWeights::default()).unwrap();

        assert_eq!(idx.volume, 400.0);
        assert_eq!(idx.open_interest, 200.0);
        assert!((idx.volume_weighted.unwrap().close - 17.5).abs() < 1e-12);
        assert!((idx.oi_weighted.unwrap().close - 17.5).abs() < 1e-12);
        assert!((idx.close - 17.5).abs() < 1e-12);
        assert_eq!(idx.live_contracts, 2);
    }

    #[test]
    fn divergent_weights_blend_both_terms() {
        // volume shares 0.25/0.75, OI shares 0.75/0.25
        let a = bar(10.0, 100.0, 150.0);
        let b = bar(20.0, 300.0, 50.0);
        let idx = aggregate(&product(), d(1), &[&a, &b], &MiWeights::default()).unwrap();

        assert!((idx.volume_weighted.unwrap().close - 17.5).abs() < 1e-12);
        assert!((idx.oi_weighted.unwrap().close - 12.5).abs() < 1e-12);
        assert!((idx.close - 15.0).abs() < 1e-12);

        let skewed = MiWeights::new(0.8, 0.2).unwrap();
        let idx = aggregate(&product(), d(1), &[&a, &b], &skewed).unwrap();
        assert!((idx.close - (0.8 * 17.5 + 0.2 * 12.5)).abs() < 1e-12);
        assert!((idx.high - (0.8 * 18.5 + 0.2 * 13.5)).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_total_drops_the_volume_term() {
        let a = bar(10.0, 0.0, 50.0);
        let b = bar(20.0, 0.0, 150.0);
        let idx = aggregate(&product(), d(1), &[&a, &b], &MiWeights::default()).unwrap();

        assert!(idx.volume_weighted.is_none());
        assert!((idx.oi_weighted.unwrap().close - 17.5).abs() < 1e-12);
        assert!((idx.close - 0.5 * 17.5).abs() < 1e-12);
        assert!(idx.close.is_finite());
    }

    #[test]
    fn empty_live_set_fails() {
        let err = aggregate(&product(), d(1), &[], &MiWeights::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoLiveContracts { .. }));
    }

    #[test]
    fn shares_sum_to_one_and_reproduce_the_blend() {
        let a = bar(10.0, 100.0, 150.0);
        let b = bar(20.0, 300.0, 50.0);
        let shares = index_shares(&[&a, &b], &MiWeights::default());
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        let blended: f64 = shares[0] * a.close + shares[1] * b.close;
        assert!((blended - 15.0).abs() < 1e-12);
    }
}
