use std::path::PathBuf;

use async_trait::async_trait;

use crate::artifacts::artifact::Artifact;
use crate::artifacts::types::{SnapshotSlot, TestSummary};
use crate::error_handling::types::ArtifactError;

/// Capability a concrete artifact kind provides to the snapshot lifecycle.
///
/// Kinds differ in what they capture and where they store it; the lifecycle
/// itself is the same for all of them.
#[async_trait]
pub trait SnapshotPlugin: Send + Sync + 'static {
    type Artifact: Artifact;

    /// Short kind name used in logs and tracking labels (`log`, `screenshot`...).
    fn name(&self) -> &str;

    /// Creates a fresh, not yet started artifact handle.
    fn create_test_artifact(&self) -> Self::Artifact;

    /// Destination of the snapshot taken in `slot` for the given test.
    ///
    /// Must return the same path for the same `(summary, slot)` within one run.
    async fn prepare_path_for_snapshot(
        &self,
        summary: &TestSummary,
        slot: SnapshotSlot,
    ) -> Result<PathBuf, ArtifactError>;
}
