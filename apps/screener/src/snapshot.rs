//! Snapshot store: hands the raw `MatchResult` from a screening run to a later
//! report view.
//!
//! Only the pre-aggregation payload is stored. The aggregator runs again at
//! display time.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::MatchResult;

pub const DEFAULT_SNAPSHOT_PATH: &str = "screen_results.json";
const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot at '{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot version {found} is not supported (expected {})", CURRENT_VERSION)]
    UnsupportedVersion { found: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub job_description: String,
    pub result: MatchResult,
}

impl Snapshot {
    pub fn new(job_description: impl Into<String>, result: MatchResult) -> Self {
        Self {
            version: CURRENT_VERSION,
            saved_at: Utc::now(),
            job_description: job_description.into(),
            result,
        }
    }
}

/// Writes `snapshot` as pretty JSON, creating parent directories as needed.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(snapshot).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, body).await.map_err(io_err)?;

    info!(
        "Saved {} candidate record(s) to {}",
        snapshot.result.shortlisted_candidates.len(),
        path.display()
    );
    Ok(())
}

/// Reads a snapshot. `Ok(None)` means no screening has been saved yet.
pub async fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let body = match tokio::fs::read(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let snapshot: Snapshot =
        serde_json::from_slice(&body).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if snapshot.version != CURRENT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
        });
    }

    Ok(Some(snapshot))
}
