//! Export — JSON and CSV artifacts for built continuous series.
//!
//! One directory per job:
//! - `manifest.json`: the [`BuildManifest`] (hashes, counts, configuration)
//! - `series.json`: the full `ContinuousSeries`, round-trippable
//! - `bars.csv`, `rolls.csv`, `adjustments.csv`: flat tables for other tools
//! - `index.csv`: the product index, when the job requested one
//!
//! Manifests carry a `schema_version`; newer versions are rejected on load,
//! as is a series whose fingerprint disagrees with its manifest.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use contlab_core::domain::{AdjustmentTable, ContinuousBar, RollEvent};
use contlab_core::index::Ohlc;
use contlab_core::{ContinuousSeries, IndexBar};

use crate::batch::BuildArtifacts;
use crate::manifest::{write_manifest, BuildManifest, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(series: &ContinuousSeries) -> Result<String> {
    serde_json::to_string_pretty(series).context("failed to serialize ContinuousSeries to JSON")
}

pub fn import_json(json: &str) -> Result<ContinuousSeries> {
    serde_json::from_str(json).context("failed to deserialize ContinuousSeries from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, open, high, low, close, volume, open_interest,
/// source_contract, is_roll_date
pub fn export_bars_csv(bars: &[ContinuousBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "open_interest",
        "source_contract",
        "is_roll_date",
    ])?;
    for b in bars {
        wtr.write_record([
            &b.date.to_string(),
            &format!("{:.6}", b.open),
            &format!("{:.6}", b.high),
            &format!("{:.6}", b.low),
            &format!("{:.6}", b.close),
            &b.volume.to_string(),
            &b.open_interest.to_string(),
            b.source_contract_id.as_str(),
            &b.is_roll_date.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Columns: date, from_contract, to_contract, price_from, price_to, reason
pub fn export_rolls_csv(rolls: &[RollEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "from_contract", "to_contract", "price_from", "price_to", "reason"])?;
    for r in rolls {
        wtr.write_record([
            &r.date.to_string(),
            r.from_contract.as_str(),
            r.to_contract.as_str(),
            &format!("{:.6}", r.price_from),
            &format!("{:.6}", r.price_to),
            r.reason.as_str(),
        ])?;
    }
    finish(wtr)
}

/// Columns: contract, start, end, factor, offset
pub fn export_adjustments_csv(table: &AdjustmentTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["contract", "start", "end", "factor", "offset"])?;
    for e in &table.entries {
        wtr.write_record([
            e.contract.as_str(),
            &e.start.to_string(),
            &e.end.to_string(),
            &format!("{:.10}", e.factor),
            &format!("{:.6}", e.offset),
        ])?;
    }
    finish(wtr)
}

/// Four price cells of a weighted index term, empty when the term is absent.
fn ohlc_cells(ohlc: Option<Ohlc>) -> [String; 4] {
    match ohlc {
        Some(o) => [o.open, o.high, o.low, o.close].map(|p| format!("{p:.6}")),
        None => Default::default(),
    }
}

/// Columns: date, open, high, low, close, volume, open_interest,
/// live_contracts, then `{volume,oi}_{open,high,low,close}_index`
pub fn export_index_csv(bars: &[IndexBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "open_interest",
        "live_contracts",
        "volume_open_index",
        "volume_high_index",
        "volume_low_index",
        "volume_close_index",
        "oi_open_index",
        "oi_high_index",
        "oi_low_index",
        "oi_close_index",
    ])?;
    for b in bars {
        let mut record = vec![
            b.date.to_string(),
            format!("{:.6}", b.open),
            format!("{:.6}", b.high),
            format!("{:.6}", b.low),
            format!("{:.6}", b.close),
            b.volume.to_string(),
            b.open_interest.to_string(),
            b.live_contracts.to_string(),
        ];
        record.extend(ohlc_cells(b.volume_weighted));
        record.extend(ohlc_cells(b.oi_weighted));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

// ─── Artifact directories ───────────────────────────────────────────

/// Write one job's artifacts under `output_dir/<job name>/`.
///
/// Returns the path to the job directory. Re-saving a job overwrites it.
pub fn save_artifacts(artifacts: &BuildArtifacts, output_dir: &Path) -> Result<PathBuf> {
    let job_dir = output_dir.join(&artifacts.manifest.job);
    std::fs::create_dir_all(&job_dir)
        .with_context(|| format!("failed to create artifact dir: {}", job_dir.display()))?;

    write_manifest(&job_dir.join("manifest.json"), &artifacts.manifest)?;
    std::fs::write(job_dir.join("series.json"), export_json(&artifacts.series)?)?;
    std::fs::write(job_dir.join("bars.csv"), export_bars_csv(&artifacts.series.bars)?)?;
    std::fs::write(job_dir.join("rolls.csv"), export_rolls_csv(&artifacts.series.rolls)?)?;
    std::fs::write(
        job_dir.join("adjustments.csv"),
        export_adjustments_csv(&artifacts.series.adjustments)?,
    )?;
    if let Some(index) = &artifacts.index {
        std::fs::write(job_dir.join("index.csv"), export_index_csv(index)?)?;
    }

    Ok(job_dir)
}

/// Load the manifest and series saved by [`save_artifacts`].
pub fn load_artifacts(dir: &Path) -> Result<(BuildManifest, ContinuousSeries)> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: BuildManifest =
        serde_json::from_str(&json).context("failed to deserialize BuildManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }

    let series_path = dir.join("series.json");
    let json = std::fs::read_to_string(&series_path)
        .with_context(|| format!("failed to read {}", series_path.display()))?;
    let series = import_json(&json)?;
    if !manifest.matches(&series) {
        bail!("series in {} does not match its manifest fingerprint", dir.display());
    }
    Ok((manifest, series))
}
