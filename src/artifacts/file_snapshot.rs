//! Snapshots of a file's contents (device log, app log...).
//!
//! Starting the artifact copies the current contents of the source into a
//! private temporary file. Saving copies that file to its destination and
//! discarding deletes it. A source that does not exist yet yields an empty
//! snapshot rather than an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, trace};
use tempfile::NamedTempFile;

use super::artifact::Artifact;
use super::path_builder::ArtifactPathBuilder;
use super::types::{SnapshotSlot, TestSummary};
use crate::error_handling::types::ArtifactError;
use crate::snapshot_lifecycle::plugin::SnapshotPlugin;

#[derive(Debug)]
enum SnapshotState {
    Idle,
    Recording(NamedTempFile),
    Stopped(NamedTempFile),
    Disposed,
}

#[derive(Debug)]
pub struct FileSnapshot {
    source: PathBuf,
    state: SnapshotState,
    captured_bytes: usize,
}

impl FileSnapshot {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            state: SnapshotState::Idle,
            captured_bytes: 0,
        }
    }

    fn take_stopped(&mut self) -> Result<NamedTempFile, ArtifactError> {
        match std::mem::replace(&mut self.state, SnapshotState::Disposed) {
            SnapshotState::Stopped(file) => Ok(file),
            other => {
                self.state = other;
                Err(ArtifactError::InvalidState("snapshot must be stopped before disposal"))
            }
        }
    }
}

#[async_trait]
impl Artifact for FileSnapshot {
    async fn start(&mut self) -> Result<(), ArtifactError> {
        if !matches!(self.state, SnapshotState::Idle) {
            return Err(ArtifactError::InvalidState("snapshot already started"));
        }

        let contents = match tokio::fs::read(&self.source).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet, taking an empty snapshot", self.source.display());
                Vec::new()
            }
            Err(e) => {
                return Err(ArtifactError::StartFailed(format!(
                    "cannot read {}: {}",
                    self.source.display(),
                    e
                )))
            }
        };

        let temp = NamedTempFile::new()
            .map_err(|e| ArtifactError::StartFailed(format!("cannot create temporary file: {}", e)))?;
        tokio::fs::write(temp.path(), &contents)
            .await
            .map_err(|e| ArtifactError::StartFailed(format!("cannot write {}: {}", temp.path().display(), e)))?;

        self.captured_bytes = contents.len();
        trace!(
            "captured {} byte(s) of {} into {}",
            contents.len(),
            self.source.display(),
            temp.path().display()
        );
        self.state = SnapshotState::Recording(temp);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ArtifactError> {
        match std::mem::replace(&mut self.state, SnapshotState::Disposed) {
            SnapshotState::Recording(file) => {
                self.state = SnapshotState::Stopped(file);
                Ok(())
            }
            other => {
                self.state = other;
                Err(ArtifactError::StopFailed("snapshot is not recording".into()))
            }
        }
    }

    async fn save(&mut self, path: &Path) -> Result<(), ArtifactError> {
        let temp = self.take_stopped()?;
        tokio::fs::copy(temp.path(), path)
            .await
            .map_err(|source| ArtifactError::SaveFailed {
                path: path.to_path_buf(),
                source,
            })?;
        temp.close().map_err(ArtifactError::DiscardFailed)?;
        debug!(
            "snapshot of {} ({} byte(s)) saved to {}",
            self.source.display(),
            self.captured_bytes,
            path.display()
        );
        Ok(())
    }

    async fn discard(&mut self) -> Result<(), ArtifactError> {
        let temp = self.take_stopped()?;
        temp.close().map_err(ArtifactError::DiscardFailed)?;
        debug!(
            "snapshot of {} ({} byte(s)) discarded",
            self.source.display(),
            self.captured_bytes
        );
        Ok(())
    }
}

/// Takes [`FileSnapshot`]s of one source file and lays them out per test as
/// `testStart.<ext>` and `testDone.<ext>`.
#[derive(Debug, Clone)]
pub struct FileSnapshotPlugin {
    source: PathBuf,
    extension: String,
    path_builder: ArtifactPathBuilder,
}

impl FileSnapshotPlugin {
    pub fn new<P: AsRef<Path>>(source: P, extension: &str, path_builder: ArtifactPathBuilder) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            extension: extension.to_string(),
            path_builder,
        }
    }

    pub fn artifact_name(&self, slot: SnapshotSlot) -> String {
        let stem = match slot {
            SnapshotSlot::Before => "testStart",
            SnapshotSlot::After => "testDone",
        };
        format!("{}.{}", stem, self.extension)
    }
}

#[async_trait]
impl SnapshotPlugin for FileSnapshotPlugin {
    type Artifact = FileSnapshot;

    fn name(&self) -> &str {
        "file-snapshot"
    }

    fn create_test_artifact(&self) -> FileSnapshot {
        FileSnapshot::new(&self.source)
    }

    async fn prepare_path_for_snapshot(
        &self,
        summary: &TestSummary,
        slot: SnapshotSlot,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self
            .path_builder
            .build_path_for_test_artifact(summary, &self.artifact_name(slot));
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                ArtifactError::PathResolution(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        Ok(path)
    }
}
