//! ContLab Core — continuous-contract construction and roll adjustment.
//!
//! Given the per-contract bar series of one futures product, this crate
//! produces a single continuous series:
//! - Bar store read interface and an in-memory implementation
//! - Dominance evaluation (MI score with hysteresis, or time/fixed calendar rules)
//! - Roll scheduling into an ordered list of roll events
//! - Price adjustment (backward, forward, ratio, difference, none)
//! - Assembly into continuous bars with an audit trail and fingerprint
//! - Product index aggregation across all live contracts
//!
//! The core performs no I/O. Every build is a deterministic function of the
//! store contents and the configuration.

pub mod adjust;
pub mod assemble;
pub mod config;
pub mod data;
pub mod domain;
pub mod dominance;
pub mod error;
pub mod index;
pub mod schedule;

pub use assemble::{build_continuous, ContinuousBuilder, ContinuousSeries};
pub use config::{AdjustMethod, ContinuousConfig, DateRange, DominanceSignal, MiWeights, RollStrategy};
pub use error::CoreError;
pub use index::{IndexBar, ProductIndex};
