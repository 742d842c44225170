//! Roll Scheduler — turns day-by-day dominance decisions into roll events.
//!
//! The evaluator is replayed from the product's first trading date so that
//! hysteresis state entering the requested range is the same as it would be
//! for any longer request. Only decisions inside the range are recorded.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{ContinuousConfig, DateRange};
use crate::data::{full_calendar, BarStore};
use crate::dominance::{DominanceEvaluator, Switch};
use crate::domain::{Bar, ContractSeries, RollEvent};
use crate::error::CoreError;

/// The held contract's bar on one in-range trading date.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub date: NaiveDate,
    pub series: &'a ContractSeries,
    pub bar: &'a Bar,
    pub is_roll_date: bool,
}

/// Selected bars and the rolls between them, both in date order.
#[derive(Debug, Clone)]
pub struct RollSchedule<'a> {
    pub selections: Vec<Selection<'a>>,
    pub rolls: Vec<RollEvent>,
}

impl RollSchedule<'_> {
    /// Number of rolls on or before `date`.
    pub fn rolls_through(&self, date: NaiveDate) -> usize {
        self.rolls.partition_point(|r| r.date <= date)
    }
}

fn roll_event(
    date: NaiveDate,
    switch: &Switch<'_>,
    to: &ContractSeries,
    to_bar: &Bar,
) -> Result<RollEvent, CoreError> {
    let from = switch.from;
    let price_from = from
        .bar_on(date)
        .or_else(|| from.bar_on_or_before(date))
        .map(|b| b.close)
        .ok_or_else(|| CoreError::NotFound(format!("close of '{}' on or before {date}", from.id())))?;
    Ok(RollEvent {
        date,
        from_contract: from.id().clone(),
        to_contract: to.id().clone(),
        price_from,
        price_to: to_bar.close,
        reason: switch.reason,
    })
}

/// Schedule the rolls of `config.product` over `range`.
///
/// Fails with `NoContractAvailable` when an in-range trading date has no
/// eligible listed contract and with `DateRangeEmpty` when nothing is selected.
pub fn schedule<'a, S: BarStore + ?Sized>(
    store: &'a S,
    config: &ContinuousConfig,
    range: &DateRange,
) -> Result<RollSchedule<'a>, CoreError> {
    let empty = || CoreError::DateRangeEmpty {
        product: config.product.to_string(),
        start: range.start,
        end: range.end,
    };
    if range.is_empty() {
        return Err(empty());
    }

    let mut evaluator = DominanceEvaluator::new(store, config)?;
    let contracts = store.contracts(&config.product)?;
    let calendar = full_calendar(contracts.iter().copied());

    let mut selections = Vec::new();
    let mut rolls = Vec::new();
    for date in calendar.into_iter().take_while(|d| *d <= range.end) {
        let decision = match evaluator.step(date) {
            Ok(decision) => decision,
            Err(CoreError::NoContractAvailable { .. }) if date < range.start => continue,
            Err(e) => return Err(e),
        };
        if date < range.start {
            continue;
        }
        let (Some(held), Some(bar)) = (decision.held, decision.bar) else {
            continue;
        };

        let is_roll_date = match &decision.switch {
            Some(switch) => {
                let roll = roll_event(date, switch, held, bar)?;
                debug!(
                    %date,
                    from = %roll.from_contract,
                    to = %roll.to_contract,
                    price_from = roll.price_from,
                    price_to = roll.price_to,
                    reason = ?roll.reason,
                    "roll"
                );
                rolls.push(roll);
                true
            }
            None => false,
        };
        selections.push(Selection { date, series: held, bar, is_roll_date });
    }

    if selections.is_empty() {
        return Err(empty());
    }
    Ok(RollSchedule { selections, rolls })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdjustMethod, RollStrategy};
    use crate::data::InMemoryBarStore;
    use crate::domain::{BarKind, ContractId, ContractSpec, ProductId, RollReason};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, day).unwrap()
    }

    fn bar(day: u32, close: f64, liquidity: f64) -> Bar {
        Bar {
            date: d(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: liquidity,
            open_interest: liquidity,
        }
    }

    fn series(id: &str, expiry: u32, bars: Vec<Bar>) -> ContractSeries {
        let spec = ContractSpec::new(ContractId::new(id).unwrap(), d(expiry));
        ContractSeries::new(spec, BarKind::default(), bars).unwrap()
    }

    fn product() -> ProductId {
        ProductId::new("IF").unwrap()
    }

    fn config() -> ContinuousConfig {
        ContinuousConfig::new(product(), RollStrategy::Volume, AdjustMethod::None)
    }

    fn store(a: ContractSeries, b: ContractSeries) -> InMemoryBarStore {
        InMemoryBarStore::new()
            .with_series(product(), a)
            .unwrap()
            .with_series(product(), b)
            .unwrap()
    }

    #[test]
    fn one_roll_per_contract_change() {
        let store = store(
            series("IF2109", 17, vec![bar(1, 100.0, 50.0), bar(2, 101.0, 50.0), bar(3, 102.0, 10.0)]),
            series("IF2110", 30, vec![bar(1, 104.0, 10.0), bar(2, 105.0, 20.0), bar(3, 106.0, 90.0)]),
        );
        let sched = schedule(&store, &config(), &DateRange::new(d(1), d(3))).unwrap();

        assert_eq!(sched.selections.len(), 3);
        assert_eq!(sched.rolls.len(), 1);
        let roll = &sched.rolls[0];
        assert_eq!(roll.date, d(3));
        assert_eq!(roll.price_from, 102.0);
        assert_eq!(roll.price_to, 106.0);
        assert_eq!(roll.reason, RollReason::Dominance);
        assert!(sched.selections[2].is_roll_date);
        assert_eq!(sched.rolls_through(d(2)), 0);
        assert_eq!(sched.rolls_through(d(3)), 1);
    }

    #[test]
    fn pre_range_history_carries_into_the_range() {
        let store = store(
            series("IF2109", 17, vec![bar(1, 100.0, 50.0), bar(2, 101.0, 10.0), bar(3, 102.0, 10.0)]),
            series("IF2110", 30, vec![bar(1, 104.0, 10.0), bar(2, 105.0, 90.0), bar(3, 106.0, 90.0)]),
        );
        let cfg = config().with_hysteresis_days(2);
        let sched = schedule(&store, &cfg, &DateRange::new(d(3), d(3))).unwrap();
        // Day 2 counted toward the streak even though it is outside the range.
        assert_eq!(sched.rolls.len(), 1);
        assert_eq!(sched.selections[0].series.id().as_str(), "IF2110");
    }

    #[test]
    fn expired_contract_rolls_with_its_last_close() {
        let store = store(
            series("IF2109", 2, vec![bar(1, 100.0, 90.0), bar(2, 101.0, 90.0)]),
            series("IF2110", 30, vec![bar(1, 104.0, 10.0), bar(2, 105.0, 10.0), bar(6, 107.0, 10.0)]),
        );
        let sched = schedule(&store, &config(), &DateRange::new(d(1), d(30))).unwrap();
        let roll = &sched.rolls[0];
        assert_eq!(roll.date, d(6));
        assert_eq!(roll.reason, RollReason::Expiry);
        assert_eq!(roll.price_from, 101.0);
        assert_eq!(roll.price_to, 107.0);
    }

    #[test]
    fn held_contract_without_a_bar_leaves_a_gap() {
        let store = store(
            series("IF2109", 17, vec![bar(1, 100.0, 90.0), bar(3, 102.0, 90.0)]),
            series("IF2110", 30, vec![bar(1, 104.0, 10.0), bar(2, 105.0, 10.0), bar(3, 106.0, 10.0)]),
        );
        // Missing bar scores 0, so a one-day window would already hand over.
        let cfg = config().with_hysteresis_days(2);
        let sched = schedule(&store, &cfg, &DateRange::new(d(1), d(3))).unwrap();
        let dates: Vec<_> = sched.selections.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![d(1), d(3)]);
        assert!(sched.rolls.is_empty());
    }

    #[test]
    fn range_without_trading_dates_is_empty() {
        let store = store(
            series("IF2109", 17, vec![bar(1, 100.0, 90.0)]),
            series("IF2110", 30, vec![bar(1, 104.0, 10.0)]),
        );
        let err = schedule(&store, &config(), &DateRange::new(d(10), d(12))).unwrap_err();
        assert!(matches!(err, CoreError::DateRangeEmpty { .. }));
        let err = schedule(&store, &config(), &DateRange::new(d(3), d(1))).unwrap_err();
        assert!(matches!(err, CoreError::DateRangeEmpty { .. }));
    }
}
