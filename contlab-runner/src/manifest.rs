//! Reproducibility manifest for one build.
//!
//! Three hashes pin a build: the configuration, the input dataset and the
//! output series. Re-running a job against the same dataset must reproduce
//! all three.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use contlab_core::data::BarStore;
use contlab_core::domain::{AdjustmentAnchor, ProductId, SeriesFingerprint};
use contlab_core::{AdjustMethod, ContinuousSeries, CoreError, DateRange, RollStrategy};

/// Manifest schema version. Newer versions are rejected on load.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub schema_version: u32,
    pub job: String,
    pub product: ProductId,
    pub range: DateRange,
    pub roll_strategy: RollStrategy,
    pub adjust_method: AdjustMethod,
    pub anchor: AdjustmentAnchor,
    pub config_hash: String,
    pub dataset_hash: String,
    pub fingerprint: SeriesFingerprint,
    pub bars: usize,
    pub rolls: usize,
    pub segments: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl BuildManifest {
    pub fn new(job: &str, series: &ContinuousSeries, dataset_hash: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            job: job.to_string(),
            product: series.product.clone(),
            range: series.range,
            roll_strategy: series.config.roll_strategy,
            adjust_method: series.config.adjust_method,
            anchor: series.anchor(),
            config_hash: series.config.config_hash(),
            dataset_hash: dataset_hash.to_string(),
            fingerprint: series.fingerprint(),
            bars: series.len(),
            rolls: series.rolls.len(),
            segments: series.adjustments.entries.len(),
            first_date: series.first_date(),
            last_date: series.last_date(),
        }
    }

    /// Whether `series` is the output this manifest describes.
    pub fn matches(&self, series: &ContinuousSeries) -> bool {
        self.fingerprint == series.fingerprint()
    }
}

/// BLAKE3 over every bar in the store, in product / contract / date order.
pub fn dataset_hash<S: BarStore + ?Sized>(store: &S) -> Result<String, CoreError> {
    let mut hasher = blake3::Hasher::new();
    for product in store.products() {
        hasher.update(product.as_str().as_bytes());
        for series in store.contracts(product)? {
            hasher.update(series.id().as_str().as_bytes());
            hasher.update(series.expiry().to_string().as_bytes());
            for bar in series.bars() {
                hasher.update(bar.date.to_string().as_bytes());
                for v in [bar.open, bar.high, bar.low, bar.close, bar.volume, bar.open_interest] {
                    hasher.update(&v.to_le_bytes());
                }
            }
        }
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn write_manifest(path: &Path, manifest: &BuildManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("failed to serialize build manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write manifest to {}", path.display()))?;
    Ok(())
}
