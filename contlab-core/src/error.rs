//! Error type shared by every core operation.
//!
//! All failures are reported synchronously. Nothing is retried internally:
//! the core is a deterministic function of its inputs, so a retry without new
//! input cannot change the outcome.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Requested product, contract or bar is absent from the store.
    #[error("{0} not found")]
    NotFound(String),

    /// No eligible contract is listed on a date inside the requested range.
    #[error("no eligible contract for '{product}' on {date}")]
    NoContractAvailable { product: String, date: NaiveDate },

    /// Index aggregation found zero live contracts.
    #[error("no live contracts for '{product}' on {date}")]
    NoLiveContracts { product: String, date: NaiveDate },

    /// The assembled output would contain zero records.
    #[error("no continuous bars for '{product}' between {start} and {end}")]
    DateRangeEmpty { product: String, start: NaiveDate, end: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A contract series violated an ingestion invariant.
    #[error("invalid series for contract '{contract}': {reason}")]
    InvalidSeries { contract: String, reason: String },

    /// A multiplicative method met a roll with a non-positive price.
    #[error(
        "cannot form a ratio for roll {from} -> {to} on {date} (price_from={price_from}, price_to={price_to})"
    )]
    DegenerateRollPrice {
        date: NaiveDate,
        from: String,
        to: String,
        price_from: f64,
        price_to: f64,
    },
}

impl CoreError {
    pub(crate) fn invalid_series(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSeries { contract: contract.into(), reason: reason.into() }
    }
}
