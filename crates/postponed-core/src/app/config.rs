//! Pool configuration.
//!
//! Every field has a default so partial JSON files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::processes::WorkerCommand;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on tasks running at once.
    pub max_workers: usize,

    /// Validate arguments when binding.
    pub check_inputs: bool,

    /// Worker process to start for isolated runs. `None` means the caller
    /// decides (the CLI re-runs itself as `postponed worker`).
    pub worker: Option<WorkerCommand>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            check_inputs: true,
            worker: None,
        }
    }
}

impl PoolConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
