//! Config dumps read from disk

use async_trait::async_trait;
use mcv_convergence::{Workload, WorkloadError};
use mcv_structpath::{Snapshot, SnapshotError};
use std::path::{Path, PathBuf};

/// Encoding of a dump file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick by extension; anything other than `.yaml`/`.yml` is JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    /// Decode text in this format
    ///
    /// # Errors
    /// Returns `SnapshotError` if the text does not decode
    pub fn decode(self, text: &str) -> Result<Snapshot, SnapshotError> {
        match self {
            Self::Json => Snapshot::from_json_str(text),
            Self::Yaml => Snapshot::from_yaml_str(text),
        }
    }
}

/// Workload whose config dump is a file, re-read on every fetch
///
/// Lets an operator point the poller at a dump another process keeps
/// refreshing.
#[derive(Debug, Clone)]
pub struct FileWorkload {
    name: String,
    path: PathBuf,
    format: SnapshotFormat,
}

impl FileWorkload {
    /// Create workload for `path`, format chosen by extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            format: SnapshotFormat::from_path(&path),
            path,
        }
    }

    /// Dump file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file once
    ///
    /// # Errors
    /// Returns `WorkloadError::Unreachable` if the file cannot be read and
    /// `WorkloadError::Decode` if it does not decode
    pub fn load(&self) -> Result<Snapshot, WorkloadError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|err| WorkloadError::unreachable(&self.name, err.to_string()))?;
        self.format
            .decode(&text)
            .map_err(|err| WorkloadError::decode(&self.name, err))
    }
}

#[async_trait]
impl Workload for FileWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_proxy(&self) -> bool {
        true
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, WorkloadError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| WorkloadError::unreachable(&self.name, err.to_string()))?;
        self.format
            .decode(&text)
            .map_err(|err| WorkloadError::decode(&self.name, err))
    }
}
