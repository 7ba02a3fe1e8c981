//! Two-snapshots-per-test lifecycle.
//!
//! For every test cycle the controller takes one snapshot before the test body
//! runs and, if the outcome is worth keeping, one after it. It then hands both
//! to the idle scheduler for saving, or hands the first one over for
//! discarding, and forgets about them before the next test starts.
//!
//! ```text
//! on_cycle_start ── capture(before)
//!        │
//!   (test body)
//!        │
//! on_cycle_end ──┬─ keep ──── capture(after), save(before), save(after)
//!                └─ discard ─ discard(before)
//!                   then both slots are cleared
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use super::plugin::SnapshotPlugin;
use super::retention::RetentionPredicate;
use crate::artifacts::artifact::{Artifact, TrackedArtifact};
use crate::artifacts::registry::ArtifactTracker;
use crate::artifacts::types::{SnapshotSlot, TestSummary};
use crate::error_handling::types::{ArtifactError, LifecycleError, SchedulerError};
use crate::scheduling::IdleScheduler;

/// Counters over the lifetime of one controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub captured: usize,
    pub saves_scheduled: usize,
    pub discards_scheduled: usize,
}

/// The two slots of the currently open cycle.
struct Snapshots<A> {
    before: Option<TrackedArtifact<A>>,
    after: Option<TrackedArtifact<A>>,
}

impl<A> Snapshots<A> {
    fn empty() -> Self {
        Self {
            before: None,
            after: None,
        }
    }

    fn slot_mut(&mut self, slot: SnapshotSlot) -> &mut Option<TrackedArtifact<A>> {
        match slot {
            SnapshotSlot::Before => &mut self.before,
            SnapshotSlot::After => &mut self.after,
        }
    }

    fn is_populated(&self, slot: SnapshotSlot) -> bool {
        match slot {
            SnapshotSlot::Before => self.before.is_some(),
            SnapshotSlot::After => self.after.is_some(),
        }
    }

    fn clear(&mut self) {
        self.before = None;
        self.after = None;
    }
}

/// Captures, decides on, and disposes of the two snapshots of each test.
///
/// At most one cycle is open at a time. Slots are only mutated through
/// [`on_cycle_start`](Self::on_cycle_start), [`on_cycle_end`](Self::on_cycle_end)
/// and [`abort_cycle`](Self::abort_cycle). Dropping a controller with an open
/// cycle discards whatever that cycle captured.
pub struct SnapshotLifecycleController<P: SnapshotPlugin> {
    plugin: Arc<P>,
    tracker: Arc<dyn ArtifactTracker>,
    scheduler: Arc<dyn IdleScheduler>,
    retention: Arc<dyn RetentionPredicate>,
    enabled: bool,
    snapshots: Snapshots<P::Artifact>,
    cycle_open: bool,
    stats: SnapshotStats,
}

impl<P: SnapshotPlugin> SnapshotLifecycleController<P> {
    pub fn new(
        plugin: Arc<P>,
        tracker: Arc<dyn ArtifactTracker>,
        scheduler: Arc<dyn IdleScheduler>,
        retention: Arc<dyn RetentionPredicate>,
    ) -> Self {
        debug!("[{}] snapshot lifecycle created", plugin.name());
        Self {
            plugin,
            tracker,
            scheduler,
            retention,
            enabled: true,
            snapshots: Snapshots::empty(),
            cycle_open: false,
            stats: SnapshotStats::default(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns capture off for every following cycle. Logged once.
    pub fn disable(&mut self, reason: &str) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        warn!("[{}] snapshots disabled: {}", self.plugin.name(), reason);
    }

    pub fn is_cycle_open(&self) -> bool {
        self.cycle_open
    }

    pub fn is_slot_populated(&self, slot: SnapshotSlot) -> bool {
        self.snapshots.is_populated(slot)
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats
    }

    /// Opens a cycle and takes the `before` snapshot.
    ///
    /// Capture failures are returned as is and leave the cycle open; the caller
    /// either ends it normally or calls [`abort_cycle`](Self::abort_cycle).
    pub async fn on_cycle_start(&mut self, summary: &TestSummary) -> Result<(), LifecycleError> {
        if self.cycle_open {
            return Err(LifecycleError::CycleAlreadyOpen);
        }
        self.cycle_open = true;
        debug!("[{}] cycle start: {}", self.plugin.name(), summary.full_name);

        self.take_automatic_snapshot(SnapshotSlot::Before).await
    }

    /// Applies the retention decision, schedules disposal and closes the cycle.
    ///
    /// A failure to capture the `after` snapshot is returned before anything is
    /// scheduled, leaving the cycle open. A scheduling failure does not stop the
    /// remaining steps; the cycle is still closed and the first such error returned.
    pub async fn on_cycle_end(&mut self, summary: &TestSummary) -> Result<(), LifecycleError> {
        if !self.cycle_open {
            return Err(LifecycleError::CycleNotOpen);
        }

        let keep = self.retention.should_keep(summary);
        debug!(
            "[{}] cycle end: {} ({:?}), keep={}",
            self.plugin.name(),
            summary.full_name,
            summary.status,
            keep
        );

        let scheduled = if keep {
            self.take_automatic_snapshot(SnapshotSlot::After).await?;
            let before = self.schedule_save(SnapshotSlot::Before, summary);
            let after = self.schedule_save(SnapshotSlot::After, summary);
            before.and(after)
        } else {
            self.schedule_discard(SnapshotSlot::Before)
        };

        self.clear_snapshot_references();
        self.cycle_open = false;
        scheduled.map_err(LifecycleError::from)
    }

    /// Discards whatever the open cycle captured and closes it.
    ///
    /// Used when a test never reaches its end event. No-op without an open cycle.
    pub fn abort_cycle(&mut self) -> Result<(), LifecycleError> {
        if !self.cycle_open {
            return Ok(());
        }
        warn!("[{}] aborting open cycle, discarding its snapshots", self.plugin.name());

        let before = self.schedule_discard(SnapshotSlot::Before);
        let after = self.schedule_discard(SnapshotSlot::After);
        self.clear_snapshot_references();
        self.cycle_open = false;
        before.and(after).map_err(LifecycleError::from)
    }

    async fn take_automatic_snapshot(&mut self, slot: SnapshotSlot) -> Result<(), LifecycleError> {
        if !self.enabled {
            return Ok(());
        }
        let snapshot = self.take_snapshot(slot).await?;
        *self.snapshots.slot_mut(slot) = Some(snapshot);
        Ok(())
    }

    async fn take_snapshot(&mut self, slot: SnapshotSlot) -> Result<TrackedArtifact<P::Artifact>, LifecycleError> {
        let mut artifact = self.plugin.create_test_artifact();
        artifact.start().await?;
        artifact.stop().await?;

        let snapshot = TrackedArtifact::new(artifact);
        self.tracker
            .track(snapshot.id, &format!("{}:{}", self.plugin.name(), slot));
        self.stats.captured += 1;
        debug!("[{}] captured {} snapshot {}", self.plugin.name(), slot, snapshot.id);
        Ok(snapshot)
    }

    /// Hands the snapshot in `slot` to the idle scheduler for saving.
    /// No-op on an empty slot.
    pub(crate) fn schedule_save(&mut self, slot: SnapshotSlot, summary: &TestSummary) -> Result<(), SchedulerError> {
        let Some(mut snapshot) = self.snapshots.slot_mut(slot).take() else {
            return Ok(());
        };

        let plugin = Arc::clone(&self.plugin);
        let tracker = Arc::clone(&self.tracker);
        let summary = summary.clone();
        let label = format!("save {} {} snapshot of '{}'", plugin.name(), slot, summary.full_name);
        self.stats.saves_scheduled += 1;

        self.scheduler.request_idle_callback(
            label,
            Box::pin(async move {
                let path = plugin.prepare_path_for_snapshot(&summary, slot).await?;
                snapshot.artifact.save(&path).await?;
                tracker.untrack(snapshot.id);
                info!("[{}] saved {} snapshot to {}", plugin.name(), slot, path.display());
                Ok::<(), ArtifactError>(())
            }),
        )
    }

    /// Hands the snapshot in `slot` to the idle scheduler for discarding.
    /// No-op on an empty slot.
    pub(crate) fn schedule_discard(&mut self, slot: SnapshotSlot) -> Result<(), SchedulerError> {
        let Some(mut snapshot) = self.snapshots.slot_mut(slot).take() else {
            return Ok(());
        };

        let tracker = Arc::clone(&self.tracker);
        let label = format!("discard {} {} snapshot", self.plugin.name(), slot);
        self.stats.discards_scheduled += 1;

        self.scheduler.request_idle_callback(
            label,
            Box::pin(async move {
                snapshot.artifact.discard().await?;
                tracker.untrack(snapshot.id);
                Ok::<(), ArtifactError>(())
            }),
        )
    }

    pub(crate) fn clear_snapshot_references(&mut self) {
        self.snapshots.clear();
    }
}

impl<P: SnapshotPlugin> Drop for SnapshotLifecycleController<P> {
    fn drop(&mut self) {
        if self.cycle_open {
            if let Err(e) = self.abort_cycle() {
                warn!("[{}] could not discard snapshots on drop: {}", self.plugin.name(), e);
            }
        }
    }
}
