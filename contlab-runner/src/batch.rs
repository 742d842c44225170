//! Batch builds — run many jobs against one loaded store in parallel.
//!
//! Jobs share the store read-only. A failed job does not stop the batch;
//! its error is returned in its outcome.

use rayon::prelude::*;
use tracing::{info, warn};

use contlab_core::data::BarStore;
use contlab_core::{ContinuousBuilder, ContinuousSeries, CoreError, IndexBar, ProductIndex};

use crate::job::BuildJob;
use crate::manifest::BuildManifest;

/// Everything one successful job produced.
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    pub series: ContinuousSeries,
    pub index: Option<Vec<IndexBar>>,
    pub manifest: BuildManifest,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<BuildArtifacts, CoreError>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Build one job's series (and index when requested).
pub fn run_job<S: BarStore + ?Sized>(
    store: &S,
    job: &BuildJob,
    dataset_hash: &str,
) -> Result<BuildArtifacts, CoreError> {
    let series = ContinuousBuilder::new(store, job.config.clone())?.build(&job.range)?;
    let index = if job.index {
        let index = ProductIndex::new(store, job.config.weights)?;
        Some(index.series(&job.config.product, &job.range)?)
    } else {
        None
    };
    let manifest = BuildManifest::new(&job.name, &series, dataset_hash);
    Ok(BuildArtifacts { series, index, manifest })
}

/// Run every job in parallel. Outcomes keep the input order.
pub fn run_jobs<S: BarStore + ?Sized>(
    store: &S,
    jobs: &[BuildJob],
    dataset_hash: &str,
) -> Vec<JobOutcome> {
    info!(jobs = jobs.len(), "starting batch");
    let outcomes: Vec<JobOutcome> = jobs
        .par_iter()
        .map(|job| {
            let result = run_job(store, job, dataset_hash);
            match &result {
                Ok(artifacts) => info!(
                    job = %job.name,
                    bars = artifacts.series.len(),
                    rolls = artifacts.series.rolls.len(),
                    fingerprint = %artifacts.manifest.fingerprint,
                    "job finished"
                ),
                Err(e) => warn!(job = %job.name, error = %e, "job failed"),
            }
            JobOutcome { name: job.name.clone(), result }
        })
        .collect();

    let summary = BatchSummary::of(&outcomes);
    info!(succeeded = summary.succeeded, failed = summary.failed, "batch finished");
    outcomes
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub bars: usize,
    pub rolls: usize,
}

impl BatchSummary {
    pub fn of(outcomes: &[JobOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, o| {
            match &o.result {
                Ok(a) => {
                    acc.succeeded += 1;
                    acc.bars += a.series.len();
                    acc.rolls += a.series.rolls.len();
                }
                Err(_) => acc.failed += 1,
            }
            acc
        })
    }
}
