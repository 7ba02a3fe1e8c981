//! Artifact handles and the bookkeeping around them.
//!
//! Components:
//! - `artifact`: the `Artifact` trait every snapshot kind implements.
//! - `types`: test summaries, slots and artifact ids shared across the crate.
//! - `registry`: tracking of captured artifacts until they are disposed of.
//! - `path_builder`: per-run and per-test destination paths.
//! - `file_snapshot`: snapshots of a file's contents, the bundled artifact kind.

pub mod artifact;
pub mod file_snapshot;
pub mod path_builder;
pub mod registry;
pub mod types;

pub use artifact::{Artifact, TrackedArtifact};
pub use file_snapshot::{FileSnapshot, FileSnapshotPlugin};
pub use path_builder::ArtifactPathBuilder;
pub use registry::{ArtifactTracker, TrackingRegistry};
pub use types::{ArtifactId, SnapshotSlot, TestStatus, TestSummary};
