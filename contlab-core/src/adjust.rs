//! Price Adjustment Engine — one transform per segment between rolls.
//!
//! A segment is a maximal run of selections from one contract; every roll
//! date opens a new one. Each segment gets exactly one `(factor, offset)`
//! pair, computed as a single accumulated product (or sum) over the rolls it
//! spans, and every bar in the segment is transformed with that pair.
//!
//! | method     | anchor   | segment k                                 |
//! |------------|----------|-------------------------------------------|
//! | backward   | latest   | factor = Π ratio_i for rolls i ≥ k         |
//! | forward    | earliest | factor = g_k, g_{i+1} = g_i·from_i/to_i    |
//! | ratio      | earliest | factor = 1 / Π ratio_i for rolls i < k     |
//! | difference | latest   | offset = Σ (to_i − from_i) for rolls i ≥ k |
//! | none       | none     | factor 1, offset 0                        |

use chrono::NaiveDate;

use crate::config::AdjustMethod;
use crate::domain::{AdjustmentEntry, AdjustmentTable, ContractId, RollEvent};
use crate::error::CoreError;
use crate::schedule::RollSchedule;

/// Consecutive selections from one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub contract: ContractId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Rolls dated on or before `start`.
    pub rolls_before: usize,
}

/// Split a schedule's selections at its roll dates.
pub fn segments(schedule: &RollSchedule<'_>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for sel in &schedule.selections {
        if let (Some(seg), false) = (out.last_mut(), sel.is_roll_date) {
            seg.end = sel.date;
            continue;
        }
        out.push(Segment {
            contract: sel.series.id().clone(),
            start: sel.date,
            end: sel.date,
            rolls_before: schedule.rolls_through(sel.date),
        });
    }
    out
}

/// `price_to / price_from` for every roll, rejecting rolls where either
/// price is not strictly positive.
fn roll_ratios(rolls: &[RollEvent]) -> Result<Vec<f64>, CoreError> {
    rolls
        .iter()
        .map(|r| {
            let valid = |p: f64| p.is_finite() && p > 0.0;
            if valid(r.price_from) && valid(r.price_to) {
                Ok(r.ratio())
            } else {
                Err(CoreError::DegenerateRollPrice {
                    date: r.date,
                    from: r.from_contract.to_string(),
                    to: r.to_contract.to_string(),
                    price_from: r.price_from,
                    price_to: r.price_to,
                })
            }
        })
        .collect()
}

/// Per-segment `(factor, offset)` indexed by `rolls_before`.
///
/// `base` is the roll count before the first segment; earliest-anchored
/// methods treat it as the origin so the oldest emitted segment stays raw.
fn transforms(method: AdjustMethod, rolls: &[RollEvent], base: usize) -> Result<Vec<(f64, f64)>, CoreError> {
    let n = rolls.len();
    let out = match method {
        AdjustMethod::Backward => {
            let ratios = roll_ratios(rolls)?;
            let mut suffix = vec![1.0; n + 1];
            for i in (0..n).rev() {
                suffix[i] = ratios[i] * suffix[i + 1];
            }
            suffix.into_iter().map(|f| (f, 0.0)).collect()
        }
        AdjustMethod::Forward => {
            roll_ratios(rolls)?;
            let mut scale = vec![1.0; n + 1];
            for i in base..n {
                scale[i + 1] = scale[i] * rolls[i].price_from / rolls[i].price_to;
            }
            scale.into_iter().map(|f| (f, 0.0)).collect()
        }
        AdjustMethod::Ratio => {
            let ratios = roll_ratios(rolls)?;
            let mut chain = vec![1.0; n + 1];
            for i in base..n {
                chain[i + 1] = chain[i] * ratios[i];
            }
            chain.into_iter().map(|c| (1.0 / c, 0.0)).collect()
        }
        AdjustMethod::Difference => {
            let mut suffix = vec![0.0; n + 1];
            for i in (0..n).rev() {
                suffix[i] = rolls[i].difference() + suffix[i + 1];
            }
            suffix.into_iter().map(|o| (1.0, o)).collect()
        }
        AdjustMethod::None => vec![(1.0, 0.0); n + 1],
    };
    Ok(out)
}

/// Adjustment table for `schedule` under `method`.
///
/// Fails with `DegenerateRollPrice` when a multiplicative method meets a
/// roll price that is not strictly positive.
pub fn build_table(method: AdjustMethod, schedule: &RollSchedule<'_>) -> Result<AdjustmentTable, CoreError> {
    let segments = segments(schedule);
    let base = segments.first().map_or(0, |s| s.rolls_before);
    let per_roll = transforms(method, &schedule.rolls, base)?;

    let entries = segments
        .into_iter()
        .map(|seg| {
            let (factor, offset) = per_roll[seg.rolls_before];
            AdjustmentEntry { contract: seg.contract, start: seg.start, end: seg.end, factor, offset }
        })
        .collect();

    Ok(AdjustmentTable { method, anchor: method.anchor(), entries })
}
