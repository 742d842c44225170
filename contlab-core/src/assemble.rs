//! Continuous Series Assembler — stitches adjusted segments into one series.
//!
//! One output bar per in-range trading date on which the effective dominant
//! traded. Prices pass through the segment's adjustment entry; volume and
//! open interest are copied from the source bar untouched. A failed build
//! returns an error and no partial series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::adjust::build_table;
use crate::config::{ContinuousConfig, DateRange};
use crate::data::BarStore;
use crate::domain::{
    AdjustmentAnchor, AdjustmentEntry, AdjustmentTable, Bar, ContinuousBar, ContractId, ProductId,
    RollEvent, SeriesFingerprint,
};
use crate::error::CoreError;
use crate::schedule::schedule;

/// Output of one build: bars plus the audit trail that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousSeries {
    pub product: ProductId,
    pub range: DateRange,
    pub config: ContinuousConfig,
    pub bars: Vec<ContinuousBar>,
    pub rolls: Vec<RollEvent>,
    pub adjustments: AdjustmentTable,
}

impl ContinuousSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Which point in time kept its original prices.
    pub fn anchor(&self) -> AdjustmentAnchor {
        self.adjustments.anchor
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn bar_on(&self, date: NaiveDate) -> Option<&ContinuousBar> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| &self.bars[i])
    }

    /// Distinct source contracts in order of first use.
    pub fn source_contracts(&self) -> Vec<&ContractId> {
        let mut out: Vec<&ContractId> = Vec::new();
        for bar in &self.bars {
            if out.last() != Some(&&bar.source_contract_id) {
                out.push(&bar.source_contract_id);
            }
        }
        out
    }

    /// BLAKE3 over the serialized series.
    ///
    /// Identical inputs and configuration give an identical fingerprint.
    pub fn fingerprint(&self) -> SeriesFingerprint {
        let json = serde_json::to_vec(self).expect("ContinuousSeries must serialize");
        SeriesFingerprint::from_bytes(&json)
    }
}

/// Apply `entry` to the prices of `bar`.
pub fn adjust_bar(
    entry: &AdjustmentEntry,
    bar: &Bar,
    source: &ContractId,
    is_roll_date: bool,
) -> ContinuousBar {
    ContinuousBar {
        date: bar.date,
        open: entry.apply(bar.open),
        high: entry.apply(bar.high),
        low: entry.apply(bar.low),
        close: entry.apply(bar.close),
        volume: bar.volume,
        open_interest: bar.open_interest,
        source_contract_id: source.clone(),
        is_roll_date,
    }
}

/// Builds continuous series for one product configuration.
pub struct ContinuousBuilder<'a, S: BarStore + ?Sized> {
    store: &'a S,
    config: ContinuousConfig,
}

impl<'a, S: BarStore + ?Sized> ContinuousBuilder<'a, S> {
    pub fn new(store: &'a S, config: ContinuousConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ContinuousConfig {
        &self.config
    }

    #[instrument(
        skip(self),
        fields(
            product = %self.config.product,
            strategy = ?self.config.roll_strategy,
            method = ?self.config.adjust_method,
        )
    )]
    pub fn build(&self, range: &DateRange) -> Result<ContinuousSeries, CoreError> {
        let schedule = schedule(self.store, &self.config, range)?;
        let table = build_table(self.config.adjust_method, &schedule)?;

        let bars = schedule
            .selections
            .iter()
            .map(|sel| {
                let entry = table
                    .entry_for(sel.date)
                    .ok_or_else(|| CoreError::NotFound(format!("adjustment entry for {}", sel.date)))?;
                Ok(adjust_bar(entry, sel.bar, sel.series.id(), sel.is_roll_date))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        info!(
            bars = bars.len(),
            rolls = schedule.rolls.len(),
            segments = table.entries.len(),
            anchor = ?table.anchor,
            "continuous series built"
        );

        Ok(ContinuousSeries {
            product: self.config.product.clone(),
            range: *range,
            config: self.config.clone(),
            bars,
            rolls: schedule.rolls,
            adjustments: table,
        })
    }
}

/// Build the continuous series of `config.product` over `range`.
pub fn build_continuous<S: BarStore + ?Sized>(
    store: &S,
    config: &ContinuousConfig,
    range: &DateRange,
) -> Result<ContinuousSeries, CoreError> {
    ContinuousBuilder::new(store, config.clone())?.build(range)
}
