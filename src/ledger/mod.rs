//! Exposure statistics ledger
//!
//! Accumulates bit-seconds of exposure and detected upsets across exposure
//! periods and process restarts. Every checkpoint is flushed to disk before
//! it returns, so a crash loses at most the period in progress.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading or persisting statistics
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Reading or writing the statistics file failed
    #[error("statistics I/O failed for {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Statistics file exists but is not a valid document
    #[error("malformed statistics in {path}: {source}")]
    Format {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Long-run counters, serialised with their historical field names
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum over periods of `arena bits * period seconds`
    #[serde(rename = "bitSeconds")]
    pub bit_seconds: f64,

    /// `bit_seconds / 3600 / 1e9`
    #[serde(rename = "GbitHours")]
    pub gbit_hours: f64,

    /// Number of scans that found a set bit
    #[serde(rename = "SEUCases")]
    pub seu_cases: u64,

    /// Total observed seconds
    #[serde(rename = "runSeconds")]
    pub run_seconds: f64,

    /// `run_seconds / 3600`
    #[serde(rename = "runHours")]
    pub run_hours: f64,
}

impl Statistics {
    /// Fold one exposure period into the counters
    pub fn accumulate(&mut self, elapsed_seconds: f64, arena_len_bits: u64, upset_found: bool) {
        self.bit_seconds += arena_len_bits as f64 * elapsed_seconds;
        self.gbit_hours = self.bit_seconds / 3600.0 / 1e9;
        self.run_seconds += elapsed_seconds;
        self.run_hours = self.run_seconds / 3600.0;
        if upset_found {
            self.seu_cases += 1;
        }
    }

    /// Observed upsets per Gbit-hour, `None` before any exposure
    pub fn upset_rate_per_gbit_hour(&self) -> Option<f64> {
        if self.gbit_hours > 0.0 {
            Some(self.seu_cases as f64 / self.gbit_hours)
        } else {
            None
        }
    }
}

/// Result of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointOutcome {
    /// Index of the upset found by the scan, if any
    pub upset: Option<usize>,
    /// Whether the next sizing evaluation must reinitialise the arena
    pub force_reinit: bool,
}

/// Statistics bound to the file they persist to
#[derive(Debug)]
pub struct StatisticsLedger {
    path: PathBuf,
    stats: Statistics,
}

impl StatisticsLedger {
    /// Load statistics from `path`; a missing file starts from zero
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let stats = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                LedgerError::Format {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no statistics found, starting fresh");
                Statistics::default()
            }
            Err(source) => return Err(LedgerError::Io { path, source }),
        };
        Ok(Self { path, stats })
    }

    /// Wrap existing statistics without touching the disk
    pub fn with_statistics(path: impl Into<PathBuf>, stats: Statistics) -> Self {
        Self {
            path: path.into(),
            stats,
        }
    }

    /// Current counters
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// File the ledger persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fold a finished exposure period into the counters and persist them.
    ///
    /// `elapsed_seconds` is measured from the start of the period.
    pub fn checkpoint(
        &mut self,
        elapsed_seconds: f64,
        arena_len_bits: u64,
        upset: Option<usize>,
    ) -> Result<CheckpointOutcome, LedgerError> {
        debug!("check_data");
        self.stats
            .accumulate(elapsed_seconds, arena_len_bits, upset.is_some());
        if let Some(index) = upset {
            warn!(index, seu_cases = self.stats.seu_cases, "ONE was found");
        }
        self.persist()?;
        Ok(CheckpointOutcome {
            upset,
            force_reinit: upset.is_some(),
        })
    }

    /// Overwrite the statistics file with the current counters.
    ///
    /// Written to a sibling file first and renamed into place.
    pub fn persist(&self) -> Result<(), LedgerError> {
        let body = serde_json::to_string_pretty(&self.stats).map_err(|source| {
            LedgerError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp = temp_path(&self.path);
        fs::write(&tmp, body).map_err(|source| LedgerError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            path = %self.path.display(),
            gbit_hours = self.stats.gbit_hours,
            seu_cases = self.stats.seu_cases,
            "statistics persisted"
        );
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
