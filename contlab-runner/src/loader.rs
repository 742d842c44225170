//! Bar loading from normalized per-contract CSV files.
//!
//! Columns: `date, open, high, low, close, volume, open_interest`, plus an
//! optional `contract` column. Files without it hold one contract named by
//! the file stem (`IF2109.csv`); files with it may hold any number of
//! contracts in long format. Dates are `YYYYMMDD` or `YYYY-MM-DD`.
//!
//! Contract specs come from, in order: an explicit spec in [`LoadOptions`],
//! the contract code (`IF2109` expires at the end of September 2021), or the
//! last bar date when the code carries no delivery month.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use contlab_core::data::{product_of, spec_from_code, BarStore, InMemoryBarStore};
use contlab_core::domain::{
    date_from_yyyymmdd, Bar, BarKind, ContractId, ContractSeries, ContractSpec, ProductId,
};
use contlab_core::CoreError;

use crate::manifest::dataset_hash;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid date '{value}' in '{path}' (expected YYYYMMDD or YYYY-MM-DD)")]
    BadDate { path: PathBuf, value: String },

    #[error("cannot name the contract of rows in '{0}' (no contract column and no file stem)")]
    NoContractId(PathBuf),

    #[error("cannot infer the product of contract '{0}'")]
    NoProduct(String),

    #[error("no CSV files found in '{0}'")]
    NoFiles(PathBuf),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Options controlling how files become contract series.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Aggregation kind shared by every loaded series.
    pub kind: BarKind,
    /// Explicit specs for contracts whose codes carry no delivery month.
    pub specs: BTreeMap<ContractId, ContractSpec>,
    /// Product for every loaded contract; otherwise the code prefix.
    pub product: Option<ProductId>,
}

/// Populated store plus provenance.
#[derive(Debug)]
pub struct LoadedStore {
    pub store: InMemoryBarStore,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
    pub files: usize,
    pub contracts: usize,
    pub bars: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    contract: Option<String>,
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    open_interest: f64,
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok().and_then(date_from_yyyymmdd);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Read bars grouped by contract code from one CSV source.
///
/// `default_contract` names rows that carry no `contract` value.
pub fn read_bars<R: Read>(
    reader: R,
    path: &Path,
    default_contract: Option<&str>,
) -> Result<BTreeMap<String, Vec<Bar>>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut grouped: BTreeMap<String, Vec<Bar>> = BTreeMap::new();

    for row in rdr.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv { path: path.to_path_buf(), source })?;
        let date = parse_date(&row.date).ok_or_else(|| LoadError::BadDate {
            path: path.to_path_buf(),
            value: row.date.clone(),
        })?;
        let contract = row
            .contract
            .filter(|c| !c.trim().is_empty())
            .or_else(|| default_contract.map(str::to_string))
            .ok_or_else(|| LoadError::NoContractId(path.to_path_buf()))?;
        grouped.entry(contract).or_default().push(Bar {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            open_interest: row.open_interest,
        });
    }

    for bars in grouped.values_mut() {
        bars.sort_by_key(|b| b.date);
    }
    Ok(grouped)
}

fn spec_for(id: &ContractId, bars: &[Bar], opts: &LoadOptions) -> Option<ContractSpec> {
    opts.specs
        .get(id)
        .cloned()
        .or_else(|| spec_from_code(id))
        .or_else(|| bars.last().map(|b| ContractSpec::new(id.clone(), b.date)))
}

/// Turn grouped bars into series and insert them into `store`.
pub fn ingest(
    store: &mut InMemoryBarStore,
    grouped: BTreeMap<String, Vec<Bar>>,
    opts: &LoadOptions,
) -> Result<usize, LoadError> {
    let mut inserted = 0;
    for (code, bars) in grouped {
        let id = ContractId::new(code.as_str())?;
        let product = match &opts.product {
            Some(p) => p.clone(),
            None => ProductId::new(product_of(&code).ok_or_else(|| LoadError::NoProduct(code.clone()))?)?,
        };
        let spec = spec_for(&id, &bars, opts).ok_or_else(|| LoadError::NoContractId(PathBuf::from(&code)))?;
        debug!(contract = %id, %product, bars = bars.len(), expiry = %spec.expiry, "ingest contract");
        store.insert(product, ContractSeries::new(spec, opts.kind, bars)?)?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Load the given CSV files into a fresh store.
pub fn load_files(paths: &[PathBuf], opts: &LoadOptions) -> Result<LoadedStore, LoadError> {
    let mut store = InMemoryBarStore::new();
    let mut contracts = 0;
    for path in paths {
        let file = std::fs::File::open(path)
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;
        let stem = path.file_stem().and_then(|s| s.to_str());
        let grouped = read_bars(file, path, stem)?;
        contracts += ingest(&mut store, grouped, opts)?;
    }

    let bars = store
        .products()
        .into_iter()
        .map(|p| store.contracts(p).map(|cs| cs.iter().map(|s| s.len()).sum::<usize>()))
        .sum::<Result<usize, CoreError>>()?;
    let hash = dataset_hash(&store)?;
    info!(files = paths.len(), contracts, bars, dataset_hash = %hash, "bars loaded");

    Ok(LoadedStore { store, dataset_hash: hash, files: paths.len(), contracts, bars })
}

/// Load every `*.csv` file in `dir`, in file-name order.
pub fn load_dir(dir: &Path, opts: &LoadOptions) -> Result<LoadedStore, LoadError> {
    let entries =
        std::fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(LoadError::NoFiles(dir.to_path_buf()));
    }
    paths.sort();
    load_files(&paths, opts)
}
