//! ContLab Runner — batch orchestration around `contlab-core`.
//!
//! This crate provides:
//! - CSV loading of per-contract bars into an in-memory store
//! - TOML job files describing one or more builds
//! - Parallel batch builds with per-job error isolation
//! - Reproducibility manifests (config, dataset and series hashes)
//! - JSON/CSV artifact export and reload

pub mod batch;
pub mod export;
pub mod job;
pub mod loader;
pub mod manifest;

pub use batch::{run_job, run_jobs, BatchSummary, BuildArtifacts, JobOutcome};
pub use export::{load_artifacts, save_artifacts};
pub use job::{BuildJob, JobError, JobFile};
pub use loader::{load_dir, load_files, LoadError, LoadOptions, LoadedStore};
pub use manifest::{dataset_hash, BuildManifest, SCHEMA_VERSION};
