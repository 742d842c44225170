//! Trading-calendar alignment across the contracts of one product.
//!
//! Per-contract series are heterogeneous: each starts and stops on its own
//! dates. The calendar is the union of their dates; a date absent from every
//! series is not a trading date and never appears. No dates are synthesised.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::config::DateRange;
use crate::domain::ContractSeries;

/// Sorted union of all bar dates across `series` within `range`.
pub fn trading_calendar<'a, I>(series: I, range: &DateRange) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a ContractSeries>,
{
    let mut all_dates = BTreeSet::new();
    for s in series {
        for bar in s.range(range.start, range.end) {
            all_dates.insert(bar.date);
        }
    }
    all_dates.into_iter().collect()
}

/// Sorted union of every bar date across `series`, unbounded.
pub fn full_calendar<'a, I>(series: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a ContractSeries>,
{
    let mut all_dates = BTreeSet::new();
    for s in series {
        all_dates.extend(s.bars().iter().map(|b| b.date));
    }
    all_dates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, BarKind, ContractId, ContractSpec};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, day).unwrap()
    }

    fn series(id: &str, days: &[u32]) -> ContractSeries {
        let bars = days
            .iter()
            .map(|&day| Bar {
                date: d(day),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1000.0,
                open_interest: 500.0,
            })
            .collect();
        let spec = ContractSpec::new(ContractId::new(id).unwrap(), d(30));
        ContractSeries::new(spec, BarKind::default(), bars).unwrap()
    }

    #[test]
    fn calendar_is_union_of_dates() {
        let a = series("IF2109", &[1, 2, 3]);
        let b = series("IF2110", &[2, 6]);

        let cal = trading_calendar([&a, &b], &DateRange::new(d(1), d(30)));
        assert_eq!(cal, vec![d(1), d(2), d(3), d(6)]);
    }

    #[test]
    fn calendar_respects_range() {
        let a = series("IF2109", &[1, 2, 3, 6, 7]);
        let cal = trading_calendar([&a], &DateRange::new(d(2), d(6)));
        assert_eq!(cal, vec![d(2), d(3), d(6)]);
    }

    #[test]
    fn full_calendar_ignores_range() {
        let a = series("IF2109", &[1, 7]);
        let b = series("IF2110", &[3]);
        assert_eq!(full_calendar([&a, &b]), vec![d(1), d(3), d(7)]);
    }
}
