//! Serializable configuration for one continuous-series request.
//!
//! Every parameter is explicit. The only defaults are the documented ones:
//! equal volume/OI weights, a one-day hysteresis window, zero-day calendar
//! offsets, no contract-month filter, and ranking by the roll strategy's own
//! liquidity term.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::{AdjustmentAnchor, Bar, ContractSpec, ProductId};
use crate::error::CoreError;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// How the held contract is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollStrategy {
    /// Hysteresis rule ranking contracts by traded volume.
    Volume,
    /// Hysteresis rule ranking contracts by open interest.
    #[serde(rename = "oi")]
    OpenInterest,
    /// Roll `dominant_days` before the held contract's expiry.
    Time,
    /// Roll `rollover_days` before the end of the held contract's delivery month.
    Fixed,
}

impl RollStrategy {
    pub fn is_liquidity_based(&self) -> bool {
        matches!(self, RollStrategy::Volume | RollStrategy::OpenInterest)
    }
}

/// Price adjustment applied across rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustMethod {
    Backward,
    Forward,
    Ratio,
    Difference,
    None,
}

impl AdjustMethod {
    pub fn anchor(&self) -> AdjustmentAnchor {
        match self {
            AdjustMethod::Backward | AdjustMethod::Difference => AdjustmentAnchor::Latest,
            AdjustMethod::Forward | AdjustMethod::Ratio => AdjustmentAnchor::Earliest,
            AdjustMethod::None => AdjustmentAnchor::Unadjusted,
        }
    }

    pub fn is_multiplicative(&self) -> bool {
        matches!(self, AdjustMethod::Backward | AdjustMethod::Forward | AdjustMethod::Ratio)
    }
}

/// Score used to rank contracts under the volume / oi strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceSignal {
    /// The strategy's own term: volume for `volume`, open interest for `oi`.
    #[default]
    Term,
    /// Blended `MI = Wv·volume + Woi·open_interest` on raw values.
    Mi,
    /// `Wv·volume/Σvolume + Woi·oi/Σoi`: the contract's product-index weight.
    IndexShare,
}

/// Volume / open-interest weights, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiWeights {
    pub volume: f64,
    pub open_interest: f64,
}

impl Default for MiWeights {
    fn default() -> Self {
        Self { volume: 0.5, open_interest: 0.5 }
    }
}

impl MiWeights {
    /// All weight on volume.
    pub const VOLUME: MiWeights = MiWeights { volume: 1.0, open_interest: 0.0 };
    /// All weight on open interest.
    pub const OPEN_INTEREST: MiWeights = MiWeights { volume: 0.0, open_interest: 1.0 };

    pub fn new(volume: f64, open_interest: f64) -> Result<Self, CoreError> {
        let weights = Self { volume, open_interest };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let (wv, woi) = (self.volume, self.open_interest);
        if !wv.is_finite() || !woi.is_finite() || wv < 0.0 || woi < 0.0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "weights must be finite and non-negative (volume={wv}, open_interest={woi})"
            )));
        }
        if (wv + woi - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CoreError::InvalidConfiguration(format!(
                "weights must sum to 1 (volume={wv}, open_interest={woi})"
            )));
        }
        Ok(())
    }

    /// Dominance index `MI = Wv·volume + Woi·open_interest`.
    pub fn score(&self, bar: &Bar) -> f64 {
        self.volume * bar.volume + self.open_interest * bar.open_interest
    }
}

/// Inclusive date range of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

fn default_hysteresis_days() -> u32 {
    1
}

/// Configuration of one continuous-series build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinuousConfig {
    pub product: ProductId,
    pub roll_strategy: RollStrategy,
    pub adjust_method: AdjustMethod,
    /// Eligible delivery months (1..=12). `None` admits every contract.
    #[serde(default)]
    pub contract_months: Option<BTreeSet<u32>>,
    /// Time strategy: roll this many days before expiry.
    #[serde(default)]
    pub dominant_days: u32,
    /// Fixed strategy: roll this many days before the delivery month ends.
    #[serde(default)]
    pub rollover_days: u32,
    #[serde(default)]
    pub weights: MiWeights,
    /// Consecutive trading dates a challenger must lead before it takes over.
    #[serde(default = "default_hysteresis_days")]
    pub hysteresis_days: u32,
    #[serde(default)]
    pub signal: DominanceSignal,
}

impl ContinuousConfig {
    pub fn new(product: ProductId, roll_strategy: RollStrategy, adjust_method: AdjustMethod) -> Self {
        Self {
            product,
            roll_strategy,
            adjust_method,
            contract_months: None,
            dominant_days: 0,
            rollover_days: 0,
            weights: MiWeights::default(),
            hysteresis_days: default_hysteresis_days(),
            signal: DominanceSignal::default(),
        }
    }

    pub fn with_contract_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.contract_months = Some(months.into_iter().collect());
        self
    }

    pub fn with_weights(mut self, weights: MiWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_hysteresis_days(mut self, days: u32) -> Self {
        self.hysteresis_days = days;
        self
    }

    pub fn with_dominant_days(mut self, days: u32) -> Self {
        self.dominant_days = days;
        self
    }

    pub fn with_rollover_days(mut self, days: u32) -> Self {
        self.rollover_days = days;
        self
    }

    pub fn with_signal(mut self, signal: DominanceSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.weights.validate()?;
        if let Some(months) = &self.contract_months {
            if months.is_empty() {
                return Err(CoreError::InvalidConfiguration(
                    "contract month filter must not be empty".into(),
                ));
            }
            if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
                return Err(CoreError::InvalidConfiguration(format!(
                    "contract month {bad} outside 1..=12"
                )));
            }
        }
        if self.hysteresis_days == 0 {
            return Err(CoreError::InvalidConfiguration("hysteresis_days must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether a contract passes the contract-month filter.
    pub fn admits(&self, spec: &ContractSpec) -> bool {
        self.contract_months.as_ref().map_or(true, |months| months.contains(&spec.month()))
    }

    /// Weights the volume / oi strategies rank by.
    ///
    /// Under [`DominanceSignal::Term`] the strategy picks the term; the blended
    /// signals use the configured `weights`.
    pub fn ranking_weights(&self) -> MiWeights {
        match (self.signal, self.roll_strategy) {
            (DominanceSignal::Term, RollStrategy::Volume) => MiWeights::VOLUME,
            (DominanceSignal::Term, RollStrategy::OpenInterest) => MiWeights::OPEN_INTEREST,
            _ => self.weights,
        }
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CoreError::InvalidConfiguration(format!("parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Deterministic BLAKE3 hash of the configuration.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).expect("ContinuousConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
