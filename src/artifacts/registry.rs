//! Bookkeeping of artifacts that were captured but not yet disposed of.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use super::types::ArtifactId;

/// Registry other parts of a test run consult to learn which captures are
/// still outstanding. Bookkeeping only; implementations must not fail.
pub trait ArtifactTracker: Send + Sync {
    fn track(&self, id: ArtifactId, label: &str);
    fn untrack(&self, id: ArtifactId);
}

/// In-memory [`ArtifactTracker`] keyed by artifact id.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    outstanding: Mutex<HashMap<ArtifactId, String>>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ArtifactId, String>> {
        // Entries are plain strings, so a poisoned map is still consistent.
        self.outstanding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of artifacts tracked and not yet untracked.
    pub fn outstanding(&self) -> usize {
        self.entries().len()
    }

    pub fn is_tracked(&self, id: ArtifactId) -> bool {
        self.entries().contains_key(&id)
    }

    /// Labels of every outstanding artifact, sorted for stable reporting.
    pub fn outstanding_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.entries().values().cloned().collect();
        labels.sort();
        labels
    }
}

impl ArtifactTracker for TrackingRegistry {
    fn track(&self, id: ArtifactId, label: &str) {
        debug!("[{}] tracking artifact {}", id, label);
        self.entries().insert(id, label.to_string());
    }

    fn untrack(&self, id: ArtifactId) {
        match self.entries().remove(&id) {
            Some(label) => debug!("[{}] untracked artifact {}", id, label),
            None => warn!("[{}] untrack requested for unknown artifact", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_then_untrack_leaves_nothing_outstanding() {
        let registry = TrackingRegistry::new();
        let id = ArtifactId::new();

        registry.track(id, "log:testStart");
        assert!(registry.is_tracked(id));
        assert_eq!(registry.outstanding(), 1);

        registry.untrack(id);
        assert!(!registry.is_tracked(id));
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn untracking_unknown_id_is_a_no_op() {
        let registry = TrackingRegistry::new();
        registry.track(ArtifactId::new(), "log:testStart");
        registry.untrack(ArtifactId::new());
        assert_eq!(registry.outstanding_labels(), vec!["log:testStart".to_string()]);
    }
}
