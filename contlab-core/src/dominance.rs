//! Dominance Evaluator — which contract is the effective dominant on each date.
//!
//! The evaluator walks trading dates forward and keeps one piece of state: the
//! held (effective dominant) contract. Each date it collects the listed
//! contracts that pass the month filter, keeps those with a bar that day, and
//! asks its [`DominanceRule`] whether to hold or switch.
//!
//! Rules:
//! - [`LiquidityRule`] (volume / oi strategies): ranks by the strategy's
//!   liquidity term, or a blended signal, with hysteresis. A challenger must
//!   be the strict leader for `hysteresis_days` consecutive trading dates
//!   before it takes over.
//! - [`CalendarRule`] (time / fixed strategies): rolls unconditionally once
//!   the held contract reaches its calendar threshold.
//!
//! Dominance only moves forward: a contract dated before the held one (by
//! expiry, then id) is never a challenger, so a past winner cannot take
//! dominance back when its score recovers. An expired held contract is
//! replaced on the next date with any trading candidate.

use chrono::{Days, NaiveDate};
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::config::{ContinuousConfig, DominanceSignal, MiWeights, RollStrategy};
use crate::data::{full_calendar, BarStore};
use crate::domain::{Bar, ContractId, ContractSeries, ContractSpec, ProductId, RollReason};
use crate::error::CoreError;
use crate::index::index_shares;

/// A listed contract with a bar on the evaluated date.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub series: &'a ContractSeries,
    pub bar: &'a Bar,
}

/// Outcome of one rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Hold,
    /// Switch to `candidates[i]`.
    SwitchTo(usize),
}

/// Replacement policy for the held contract.
///
/// With no held contract a rule must pick one of the candidates, if any.
/// Rules never return the held contract itself as a switch target.
pub trait DominanceRule: Send {
    fn name(&self) -> &'static str;

    /// Reason recorded on rolls this rule triggers.
    fn roll_reason(&self) -> RollReason;

    fn decide(
        &mut self,
        date: NaiveDate,
        held: Option<&ContractSeries>,
        candidates: &[Candidate<'_>],
    ) -> Verdict;

    /// Drop any partial state (e.g. a challenger streak).
    fn reset(&mut self) {}
}

/// Ranking used for the raw dominant: higher score, then nearer expiry, then
/// smaller contract id.
fn rank(a: (&Candidate<'_>, f64), b: (&Candidate<'_>, f64)) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| a.0.series.expiry().cmp(&b.0.series.expiry()))
        .then_with(|| a.0.series.id().cmp(b.0.series.id()))
}

fn best_of(
    candidates: &[Candidate<'_>],
    scores: &[f64],
    indices: impl Iterator<Item = usize>,
) -> Option<usize> {
    indices.min_by(|&i, &j| rank((&candidates[i], scores[i]), (&candidates[j], scores[j])))
}

/// Index of the raw dominant among `candidates` given parallel `scores`.
pub fn raw_dominant(candidates: &[Candidate<'_>], scores: &[f64]) -> Option<usize> {
    best_of(candidates, scores, 0..candidates.len().min(scores.len()))
}

/// Whether `series` is dated strictly before `held` in `(expiry, id)` order.
fn precedes(series: &ContractSeries, held: &ContractSeries) -> bool {
    (series.expiry(), series.id()) < (held.expiry(), held.id())
}

/// Liquidity-ranked rule with hysteresis.
#[derive(Debug, Clone)]
pub struct LiquidityRule {
    weights: MiWeights,
    signal: DominanceSignal,
    hysteresis_days: u32,
    challenger: Option<ContractId>,
    streak: u32,
}

impl LiquidityRule {
    pub fn new(weights: MiWeights, signal: DominanceSignal, hysteresis_days: u32) -> Self {
        Self { weights, signal, hysteresis_days: hysteresis_days.max(1), challenger: None, streak: 0 }
    }

    /// Per-candidate score under the configured signal.
    pub fn scores(&self, candidates: &[Candidate<'_>]) -> Vec<f64> {
        match self.signal {
            DominanceSignal::Term | DominanceSignal::Mi => {
                candidates.iter().map(|c| self.weights.score(c.bar)).collect()
            }
            DominanceSignal::IndexShare => {
                let bars: Vec<&Bar> = candidates.iter().map(|c| c.bar).collect();
                index_shares(&bars, &self.weights)
            }
        }
    }

    /// Current challenger and its consecutive-lead count.
    pub fn challenger(&self) -> Option<(&ContractId, u32)> {
        self.challenger.as_ref().map(|c| (c, self.streak))
    }
}

impl DominanceRule for LiquidityRule {
    fn name(&self) -> &'static str {
        "liquidity"
    }

    fn roll_reason(&self) -> RollReason {
        RollReason::Dominance
    }

    fn decide(
        &mut self,
        date: NaiveDate,
        held: Option<&ContractSeries>,
        candidates: &[Candidate<'_>],
    ) -> Verdict {
        let scores = self.scores(candidates);
        let Some(held) = held else {
            self.reset();
            return raw_dominant(candidates, &scores).map_or(Verdict::Hold, Verdict::SwitchTo);
        };

        // Contracts dated before the held one are never reconsidered.
        let eligible =
            || (0..candidates.len()).filter(move |&i| !precedes(candidates[i].series, held));
        let Some(winner) = best_of(candidates, &scores, eligible()) else {
            self.reset();
            return Verdict::Hold;
        };

        let winner_id = candidates[winner].series.id();
        if winner_id == held.id() {
            self.reset();
            return Verdict::Hold;
        }

        // A held contract without a bar today scores 0.
        let held_score = candidates
            .iter()
            .position(|c| c.series.id() == held.id())
            .map_or(0.0, |i| scores[i]);
        if scores[winner] <= held_score {
            // Winner only by tie-break: not a strict lead.
            self.reset();
            return Verdict::Hold;
        }
        if eligible().any(|i| i != winner && scores[i] == scores[winner]) {
            // Two challengers share the top score: nobody leads strictly.
            self.reset();
            return Verdict::Hold;
        }

        if self.challenger.as_ref() == Some(winner_id) {
            self.streak += 1;
        } else {
            self.challenger = Some(winner_id.clone());
            self.streak = 1;
        }
        debug!(
            %date,
            held = %held.id(),
            challenger = %winner_id,
            streak = self.streak,
            needed = self.hysteresis_days,
            "challenger leads"
        );

        if self.streak >= self.hysteresis_days {
            self.reset();
            Verdict::SwitchTo(winner)
        } else {
            Verdict::Hold
        }
    }

    fn reset(&mut self) {
        self.challenger = None;
        self.streak = 0;
    }
}

/// What a calendar threshold is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAnchor {
    /// Contract expiry (time strategy).
    Expiry,
    /// Last day of the delivery month (fixed strategy).
    DeliveryMonthEnd,
}

/// Roll unconditionally `days` before a calendar anchor of the held contract.
#[derive(Debug, Clone)]
pub struct CalendarRule {
    anchor: CalendarAnchor,
    days: u32,
}

impl CalendarRule {
    pub fn time(dominant_days: u32) -> Self {
        Self { anchor: CalendarAnchor::Expiry, days: dominant_days }
    }

    pub fn fixed(rollover_days: u32) -> Self {
        Self { anchor: CalendarAnchor::DeliveryMonthEnd, days: rollover_days }
    }

    /// First date on which a held contract must be rolled out of.
    pub fn threshold(&self, spec: &ContractSpec) -> NaiveDate {
        let base = match self.anchor {
            CalendarAnchor::Expiry => spec.expiry,
            CalendarAnchor::DeliveryMonthEnd => spec.delivery_month_end(),
        };
        base.checked_sub_days(Days::new(u64::from(self.days))).unwrap_or(NaiveDate::MIN)
    }
}

impl DominanceRule for CalendarRule {
    fn name(&self) -> &'static str {
        match self.anchor {
            CalendarAnchor::Expiry => "time",
            CalendarAnchor::DeliveryMonthEnd => "fixed",
        }
    }

    fn roll_reason(&self) -> RollReason {
        RollReason::Calendar
    }

    fn decide(
        &mut self,
        date: NaiveDate,
        held: Option<&ContractSeries>,
        candidates: &[Candidate<'_>],
    ) -> Verdict {
        if let Some(h) = held {
            if date < self.threshold(h.spec()) {
                return Verdict::Hold;
            }
        }

        let order_key = |c: &Candidate<'_>| (c.series.expiry(), c.series.id().clone());
        let is_later = |c: &Candidate<'_>| {
            held.map_or(true, |h| order_key(c) > (h.expiry(), h.id().clone()))
        };

        // Nearest later contract whose own threshold is still ahead.
        let pick = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| is_later(*c) && self.threshold(c.series.spec()) > date)
            .min_by_key(|(_, c)| order_key(*c))
            .map(|(i, _)| i);

        // Nothing held and every candidate is past its threshold: take the
        // furthest-dated one.
        let pick = pick.or_else(|| {
            if held.is_some() {
                return None;
            }
            candidates.iter().enumerate().max_by_key(|(_, c)| order_key(*c)).map(|(i, _)| i)
        });

        pick.map_or(Verdict::Hold, Verdict::SwitchTo)
    }
}

/// Build the rule for a configured strategy.
pub fn rule_for(config: &ContinuousConfig) -> Box<dyn DominanceRule> {
    match config.roll_strategy {
        RollStrategy::Volume | RollStrategy::OpenInterest => Box::new(LiquidityRule::new(
            config.ranking_weights(),
            config.signal,
            config.hysteresis_days,
        )),
        RollStrategy::Time => Box::new(CalendarRule::time(config.dominant_days)),
        RollStrategy::Fixed => Box::new(CalendarRule::fixed(config.rollover_days)),
    }
}

/// A change of effective dominant.
#[derive(Debug, Clone, Copy)]
pub struct Switch<'a> {
    pub from: &'a ContractSeries,
    pub reason: RollReason,
}

/// Result of evaluating one date.
#[derive(Debug, Clone)]
pub struct DayDecision<'a> {
    pub date: NaiveDate,
    /// Effective dominant after this date's decision.
    pub held: Option<&'a ContractSeries>,
    /// Held contract's bar on `date`, if it traded.
    pub bar: Option<&'a Bar>,
    /// Set when the effective dominant changed on this date (not for the
    /// first selection).
    pub switch: Option<Switch<'a>>,
}

/// Stateful forward walk over trading dates for one product.
pub struct DominanceEvaluator<'a> {
    product: ProductId,
    universe: Vec<&'a ContractSeries>,
    rule: Box<dyn DominanceRule>,
    held: Option<&'a ContractSeries>,
    expired: Option<&'a ContractSeries>,
}

impl<'a> DominanceEvaluator<'a> {
    pub fn new<S: BarStore + ?Sized>(
        store: &'a S,
        config: &ContinuousConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let universe = store
            .contracts(&config.product)?
            .into_iter()
            .filter(|s| config.admits(s.spec()))
            .collect();
        Ok(Self {
            product: config.product.clone(),
            universe,
            rule: rule_for(config),
            held: None,
            expired: None,
        })
    }

    pub fn rule_name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn held(&self) -> Option<&'a ContractSeries> {
        self.held
    }

    /// Contracts that pass the month filter.
    pub fn universe(&self) -> &[&'a ContractSeries] {
        &self.universe
    }

    /// Evaluate `date`. Dates must be fed in increasing order.
    ///
    /// Fails with `NoContractAvailable` when no eligible contract is listed.
    pub fn step(&mut self, date: NaiveDate) -> Result<DayDecision<'a>, CoreError> {
        let listed: Vec<&'a ContractSeries> =
            self.universe.iter().copied().filter(|s| s.is_listed(date)).collect();
        if listed.is_empty() {
            return Err(CoreError::NoContractAvailable { product: self.product.to_string(), date });
        }

        if let Some(h) = self.held {
            if !h.is_listed(date) {
                warn!(product = %self.product, contract = %h.id(), %date, "held contract expired");
                self.expired = Some(h);
                self.held = None;
                self.rule.reset();
            }
        }

        let candidates: Vec<Candidate<'a>> = listed
            .iter()
            .filter_map(|&s| s.bar_on(date).map(|bar| Candidate { series: s, bar }))
            .collect();

        let mut switch = None;
        if !candidates.is_empty() {
            if let Verdict::SwitchTo(i) = self.rule.decide(date, self.held, &candidates) {
                let to = candidates[i].series;
                switch = match (self.held, self.expired.take()) {
                    (Some(from), _) => Some(Switch { from, reason: self.rule.roll_reason() }),
                    (None, Some(from)) => Some(Switch { from, reason: RollReason::Expiry }),
                    (None, None) => None,
                };
                self.held = Some(to);
            }
        }

        Ok(DayDecision {
            date,
            held: self.held,
            bar: self.held.and_then(|h| h.bar_on(date)),
            switch,
        })
    }
}

/// Effective dominant on `date`, replaying the product's full history.
///
/// A pure function of the store contents and configuration: the same inputs
/// always give the same answer.
pub fn dominant_on<S: BarStore + ?Sized>(
    store: &S,
    config: &ContinuousConfig,
    date: NaiveDate,
) -> Result<Option<ContractId>, CoreError> {
    let mut evaluator = DominanceEvaluator::new(store, config)?;
    let contracts = store.contracts(&config.product)?;
    for day in full_calendar(contracts.iter().copied()).into_iter().take_while(|d| *d < date) {
        match evaluator.step(day) {
            Ok(_) | Err(CoreError::NoContractAvailable { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(evaluator.step(date)?.held.map(|s| s.id().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdjustMethod;
    use crate::data::InMemoryBarStore;
    use crate::domain::{BarKind, DeliveryMonth};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, day).unwrap()
    }

    fn bar(date: NaiveDate, volume: f64, oi: f64) -> Bar {
        Bar { date, open: 100.0, high: 101.0, low: 99.0, close: 100.0, volume, open_interest: oi }
    }

    fn series(id: &str, expiry: NaiveDate, bars: Vec<Bar>) -> ContractSeries {
        let spec = ContractSpec::new(ContractId::new(id).unwrap(), expiry);
        ContractSeries::new(spec, BarKind::default(), bars).unwrap()
    }

    #[test]
    fn raw_dominant_breaks_ties_by_expiry_then_id() {
        let near = series("B", d(9, 30), vec![bar(d(9, 1), 10.0, 10.0)]);
        let far = series("A", d(10, 31), vec![bar(d(9, 1), 10.0, 10.0)]);
        let same_expiry = series("C", d(9, 30), vec![bar(d(9, 1), 10.0, 10.0)]);
        let cands = [
            Candidate { series: &far, bar: &far.bars()[0] },
            Candidate { series: &same_expiry, bar: &same_expiry.bars()[0] },
            Candidate { series: &near, bar: &near.bars()[0] },
        ];
        assert_eq!(raw_dominant(&cands, &[5.0, 5.0, 5.0]), Some(2));
        assert_eq!(raw_dominant(&cands, &[6.0, 5.0, 5.0]), Some(0));
        assert_eq!(raw_dominant(&[], &[]), None);
    }

    #[test]
    fn liquidity_rule_requires_a_sustained_strict_lead() {
        let a = series("A", d(9, 30), vec![bar(d(9, 1), 10.0, 10.0)]);
        let b = series("B", d(10, 31), vec![bar(d(9, 1), 20.0, 20.0)]);
        let cands = [
            Candidate { series: &a, bar: &a.bars()[0] },
            Candidate { series: &b, bar: &b.bars()[0] },
        ];
        let mut rule = LiquidityRule::new(MiWeights::default(), DominanceSignal::Mi, 2);

        assert_eq!(rule.decide(d(9, 1), Some(&a), &cands), Verdict::Hold);
        assert_eq!(rule.challenger().map(|(id, n)| (id.as_str(), n)), Some(("B", 1)));
        assert_eq!(rule.decide(d(9, 2), Some(&a), &cands), Verdict::SwitchTo(1));
        assert!(rule.challenger().is_none());
    }

    #[test]
    fn tie_on_score_is_not_a_lead() {
        let a = series("B", d(10, 31), vec![bar(d(9, 1), 10.0, 10.0)]);
        let b = series("A", d(11, 30), vec![bar(d(9, 1), 10.0, 10.0)]);
        let cands = [
            Candidate { series: &b, bar: &b.bars()[0] },
            Candidate { series: &a, bar: &a.bars()[0] },
        ];
        let mut rule = LiquidityRule::new(MiWeights::default(), DominanceSignal::Mi, 1);
        // Equal scores: the nearer-dated held contract stays on top.
        assert_eq!(rule.decide(d(9, 1), Some(&a), &cands), Verdict::Hold);
        assert!(rule.challenger().is_none());
        assert_eq!(rule.decide(d(9, 1), None, &cands), Verdict::SwitchTo(1));
    }

    #[test]
    fn challengers_tied_at_the_top_do_not_lead() {
        let held = series("A", d(9, 30), vec![bar(d(9, 1), 10.0, 10.0)]);
        let b = series("B", d(10, 31), vec![bar(d(9, 1), 20.0, 20.0)]);
        let c = series("C", d(11, 30), vec![bar(d(9, 1), 20.0, 20.0)]);
        let cands = [
            Candidate { series: &held, bar: &held.bars()[0] },
            Candidate { series: &b, bar: &b.bars()[0] },
            Candidate { series: &c, bar: &c.bars()[0] },
        ];
        let mut rule = LiquidityRule::new(MiWeights::default(), DominanceSignal::Mi, 1);
        assert_eq!(rule.decide(d(9, 1), Some(&held), &cands), Verdict::Hold);
        assert!(rule.challenger().is_none());

        // Break the tie and B leads at once.
        let b_up = series("B", d(10, 31), vec![bar(d(9, 1), 21.0, 21.0)]);
        let cands = [cands[0], Candidate { series: &b_up, bar: &b_up.bars()[0] }, cands[2]];
        assert_eq!(rule.decide(d(9, 1), Some(&held), &cands), Verdict::SwitchTo(1));
    }

    #[test]
    fn volume_and_oi_strategies_rank_by_their_own_term() {
        let a = series("A", d(9, 30), vec![bar(d(9, 1), 100.0, 10_000.0)]);
        let b = series("B", d(10, 31), vec![bar(d(9, 1), 5_000.0, 200.0)]);
        let cands = [
            Candidate { series: &a, bar: &a.bars()[0] },
            Candidate { series: &b, bar: &b.bars()[0] },
        ];
        let product = ProductId::new("IF").unwrap();
        let mut by_volume =
            rule_for(&ContinuousConfig::new(product.clone(), RollStrategy::Volume, AdjustMethod::None));
        let mut by_oi =
            rule_for(&ContinuousConfig::new(product, RollStrategy::OpenInterest, AdjustMethod::None));
        assert_eq!(by_volume.decide(d(9, 1), None, &cands), Verdict::SwitchTo(1));
        assert_eq!(by_oi.decide(d(9, 1), None, &cands), Verdict::SwitchTo(0));
    }

    #[test]
    fn earlier_contract_never_retakes_dominance() {
        let old = series("IF2109", d(9, 17), vec![bar(d(9, 1), 500.0, 500.0)]);
        let new = series("IF2110", d(10, 15), vec![bar(d(9, 1), 10.0, 10.0)]);
        let cands = [
            Candidate { series: &old, bar: &old.bars()[0] },
            Candidate { series: &new, bar: &new.bars()[0] },
        ];
        let mut rule = LiquidityRule::new(MiWeights::default(), DominanceSignal::Mi, 1);
        assert_eq!(rule.decide(d(9, 1), Some(&new), &cands), Verdict::Hold);
        assert!(rule.challenger().is_none());
    }

    #[test]
    fn index_share_signal_is_scale_free() {
        // Raw MI favours A (huge OI); shares favour B (dominant volume share).
        let a = series("A", d(9, 30), vec![bar(d(9, 1), 100.0, 10_000.0)]);
        let b = series("B", d(10, 31), vec![bar(d(9, 1), 900.0, 8_000.0)]);
        let cands = [
            Candidate { series: &a, bar: &a.bars()[0] },
            Candidate { series: &b, bar: &b.bars()[0] },
        ];
        let raw = LiquidityRule::new(MiWeights::default(), DominanceSignal::Mi, 1);
        let share = LiquidityRule::new(MiWeights::default(), DominanceSignal::IndexShare, 1);
        assert_eq!(raw_dominant(&cands, &raw.scores(&cands)), Some(0));
        assert_eq!(raw_dominant(&cands, &share.scores(&cands)), Some(1));
    }

    #[test]
    fn calendar_thresholds() {
        let id = ContractId::new("IF2109").unwrap();
        let spec = ContractSpec::new(id, d(9, 17)).with_delivery(DeliveryMonth::new(2021, 9).unwrap());
        assert_eq!(CalendarRule::time(5).threshold(&spec), d(9, 12));
        assert_eq!(CalendarRule::fixed(5).threshold(&spec), d(9, 25));
        assert_eq!(CalendarRule::time(0).threshold(&spec), d(9, 17));
    }

    #[test]
    fn calendar_rule_rolls_to_the_next_dated_contract() {
        let sep = series("IF2109", d(9, 17), vec![bar(d(9, 10), 1.0, 1.0), bar(d(9, 13), 1.0, 1.0)]);
        let oct = series("IF2110", d(10, 15), vec![bar(d(9, 10), 1.0, 1.0), bar(d(9, 13), 1.0, 1.0)]);
        let dec = series("IF2112", d(12, 17), vec![bar(d(9, 10), 1.0, 1.0), bar(d(9, 13), 1.0, 1.0)]);
        let mut rule = CalendarRule::time(5);

        let day1 = [
            Candidate { series: &dec, bar: &dec.bars()[0] },
            Candidate { series: &sep, bar: &sep.bars()[0] },
            Candidate { series: &oct, bar: &oct.bars()[0] },
        ];
        // Nothing held: nearest contract whose threshold (9/12) is ahead.
        assert_eq!(rule.decide(d(9, 10), None, &day1), Verdict::SwitchTo(1));
        assert_eq!(rule.decide(d(9, 10), Some(&sep), &day1), Verdict::Hold);

        let day2 = [
            Candidate { series: &dec, bar: &dec.bars()[1] },
            Candidate { series: &sep, bar: &sep.bars()[1] },
            Candidate { series: &oct, bar: &oct.bars()[1] },
        ];
        assert_eq!(rule.decide(d(9, 13), Some(&sep), &day2), Verdict::SwitchTo(2));
    }

    fn two_contract_store() -> InMemoryBarStore {
        let product = ProductId::new("IF").unwrap();
        let a = series(
            "IF2109",
            d(9, 17),
            vec![bar(d(9, 1), 100.0, 100.0), bar(d(9, 2), 100.0, 100.0), bar(d(9, 3), 50.0, 50.0)],
        );
        let b = series(
            "IF2110",
            d(10, 15),
            vec![
                bar(d(9, 1), 10.0, 10.0),
                bar(d(9, 2), 200.0, 200.0),
                bar(d(9, 3), 300.0, 300.0),
                bar(d(9, 20), 300.0, 300.0),
            ],
        );
        InMemoryBarStore::new()
            .with_series(product.clone(), a)
            .unwrap()
            .with_series(product, b)
            .unwrap()
    }

    fn config(strategy: RollStrategy) -> ContinuousConfig {
        ContinuousConfig::new(ProductId::new("IF").unwrap(), strategy, AdjustMethod::None)
    }

    #[test]
    fn evaluator_switches_and_reports_the_outgoing_contract() {
        let store = two_contract_store();
        let mut ev = DominanceEvaluator::new(&store, &config(RollStrategy::Volume)).unwrap();
        assert_eq!(ev.rule_name(), "liquidity");

        let first = ev.step(d(9, 1)).unwrap();
        assert_eq!(first.held.unwrap().id().as_str(), "IF2109");
        assert!(first.switch.is_none());

        let second = ev.step(d(9, 2)).unwrap();
        assert_eq!(second.held.unwrap().id().as_str(), "IF2110");
        let switch = second.switch.unwrap();
        assert_eq!(switch.from.id().as_str(), "IF2109");
        assert_eq!(switch.reason, RollReason::Dominance);
    }

    #[test]
    fn dominant_on_replays_history() {
        let store = two_contract_store();
        let cfg = config(RollStrategy::Volume).with_hysteresis_days(2);
        assert_eq!(dominant_on(&store, &cfg, d(9, 2)).unwrap().unwrap().as_str(), "IF2109");
        assert_eq!(dominant_on(&store, &cfg, d(9, 3)).unwrap().unwrap().as_str(), "IF2110");
        // Same inputs, same answer.
        assert_eq!(dominant_on(&store, &cfg, d(9, 3)), dominant_on(&store, &cfg, d(9, 3)));
    }

    #[test]
    fn month_filter_excluding_everything_has_no_contract() {
        let store = two_contract_store();
        let cfg = config(RollStrategy::Volume).with_contract_months([3, 6]);
        let mut ev = DominanceEvaluator::new(&store, &cfg).unwrap();
        assert!(ev.universe().is_empty());
        assert!(matches!(ev.step(d(9, 1)), Err(CoreError::NoContractAvailable { .. })));
    }
}
