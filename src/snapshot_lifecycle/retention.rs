use crate::artifacts::types::{TestStatus, TestSummary};
use crate::configuration::types::SnapshotPreset;

/// Decides whether the artifacts of a finished test are worth keeping.
pub trait RetentionPredicate: Send + Sync {
    fn should_keep(&self, summary: &TestSummary) -> bool;
}

impl<F> RetentionPredicate for F
where
    F: Fn(&TestSummary) -> bool + Send + Sync,
{
    fn should_keep(&self, summary: &TestSummary) -> bool {
        self(summary)
    }
}

/// Keeps everything, or only the artifacts of failed tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub keep_only_failed_tests: bool,
}

impl RetentionPolicy {
    pub fn keep_all() -> Self {
        Self {
            keep_only_failed_tests: false,
        }
    }

    pub fn keep_failed_only() -> Self {
        Self {
            keep_only_failed_tests: true,
        }
    }

    pub fn from_preset(preset: SnapshotPreset) -> Self {
        match preset {
            SnapshotPreset::Failing => Self::keep_failed_only(),
            SnapshotPreset::All | SnapshotPreset::None => Self::keep_all(),
        }
    }
}

impl RetentionPredicate for RetentionPolicy {
    fn should_keep(&self, summary: &TestSummary) -> bool {
        !(self.keep_only_failed_tests && summary.status != TestStatus::Failed)
    }
}
