use std::path::Path;

use async_trait::async_trait;

use super::types::ArtifactId;
use crate::error_handling::types::ArtifactError;

/// A single-use capture of observable state (log segment, screenshot, trace...).
///
/// Each handle sees exactly one `start` followed by one `stop`, and is then
/// disposed of exactly once through either `save` or `discard`.
#[async_trait]
pub trait Artifact: Send + 'static {
    async fn start(&mut self) -> Result<(), ArtifactError>;

    async fn stop(&mut self) -> Result<(), ArtifactError>;

    /// Persists the captured data at `path`.
    async fn save(&mut self, path: &Path) -> Result<(), ArtifactError>;

    /// Releases the captured data without persisting it.
    async fn discard(&mut self) -> Result<(), ArtifactError>;
}

/// An artifact paired with the id it is tracked under.
#[derive(Debug)]
pub struct TrackedArtifact<A> {
    pub id: ArtifactId,
    pub artifact: A,
}

impl<A: Artifact> TrackedArtifact<A> {
    pub fn new(artifact: A) -> Self {
        Self {
            id: ArtifactId::new(),
            artifact,
        }
    }
}
