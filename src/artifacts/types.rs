//! Common data types shared by artifact plugins and the snapshot lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of a test as reported by the surrounding framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test body has not finished yet.
    Running,
    Passed,
    Failed,
}

/// Per-test context handed to each cycle boundary.
///
/// The lifecycle never interprets it; it is passed through to the retention
/// predicate and to the plugin's path hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Short test title (`it(...)` name).
    pub title: String,
    /// Fully qualified name including enclosing describe blocks.
    pub full_name: String,
    pub status: TestStatus,
    /// How many times this test has been run so far; 1 for the first attempt.
    #[serde(default = "first_invocation")]
    pub invocations: u32,
}

fn first_invocation() -> u32 {
    1
}

impl TestSummary {
    pub fn new(full_name: impl Into<String>, status: TestStatus) -> Self {
        let full_name = full_name.into();
        Self {
            title: full_name.clone(),
            full_name,
            status,
            invocations: 1,
        }
    }

    pub fn with_invocations(mut self, invocations: u32) -> Self {
        self.invocations = invocations;
        self
    }
}

/// One of the two fixed snapshot positions of a test cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotSlot {
    /// Taken right before the test body runs.
    Before,
    /// Taken right after the test body finished.
    After,
}

impl SnapshotSlot {
    pub const ALL: [SnapshotSlot; 2] = [SnapshotSlot::Before, SnapshotSlot::After];
}

impl fmt::Display for SnapshotSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSlot::Before => write!(f, "before"),
            SnapshotSlot::After => write!(f, "after"),
        }
    }
}

/// Identifier under which a captured artifact is tracked until disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_defaults_to_first_invocation_when_deserialized() {
        let summary: TestSummary = serde_json::from_str(
            r#"{"title":"logs in","full_name":"Login logs in","status":"failed"}"#,
        )
        .unwrap();
        assert_eq!(summary.status, TestStatus::Failed);
        assert_eq!(summary.invocations, 1);
    }

    #[test]
    fn slots_are_ordered_before_then_after() {
        assert_eq!(SnapshotSlot::ALL.map(|s| s.to_string()), ["before", "after"]);
    }
}
