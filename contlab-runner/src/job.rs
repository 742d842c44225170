//! TOML job files: one or more continuous-series build requests.
//!
//! ```toml
//! [[job]]
//! name = "if-backward"
//! index = true
//! range = { start = "2021-01-04", end = "2021-06-30" }
//!
//! [job.config]
//! product = "IF"
//! roll_strategy = "volume"
//! adjust_method = "backward"
//! hysteresis_days = 3
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use contlab_core::{ContinuousConfig, CoreError, DateRange};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("job file defines no jobs")]
    Empty,

    #[error("duplicate job name '{0}'")]
    DuplicateName(String),

    #[error("job '{name}': {source}")]
    Invalid {
        name: String,
        #[source]
        source: CoreError,
    },
}

/// One build request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildJob {
    pub name: String,
    pub range: DateRange,
    pub config: ContinuousConfig,
    /// Also compute the product index over the same range.
    #[serde(default)]
    pub index: bool,
}

impl BuildJob {
    pub fn new(name: impl Into<String>, range: DateRange, config: ContinuousConfig) -> Self {
        Self { name: name.into(), range, config, index: false }
    }

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<(), JobError> {
        let invalid = |source| JobError::Invalid { name: self.name.clone(), source };
        if self.name.trim().is_empty() {
            return Err(invalid(CoreError::InvalidConfiguration("job name must not be empty".into())));
        }
        if self.range.is_empty() {
            return Err(invalid(CoreError::InvalidConfiguration(format!(
                "range start {} is after end {}",
                self.range.start, self.range.end
            ))));
        }
        self.config.validate().map_err(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(rename = "job", default)]
    pub jobs: Vec<BuildJob>,
}

impl JobFile {
    /// Parse and validate a job file.
    pub fn from_toml(content: &str) -> Result<Self, JobError> {
        let file: Self = toml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, JobError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| JobError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.jobs.is_empty() {
            return Err(JobError::Empty);
        }
        let mut seen = BTreeSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !seen.insert(job.name.as_str()) {
                return Err(JobError::DuplicateName(job.name.clone()));
            }
        }
        Ok(())
    }
}
