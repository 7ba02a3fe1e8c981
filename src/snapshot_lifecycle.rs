//! Per-test snapshot lifecycle: capture at test boundaries, retention
//! decision, and deferred disposal.

pub mod controller;
pub mod plugin;
pub mod retention;


pub use controller::{SnapshotLifecycleController, SnapshotStats};
pub use plugin::SnapshotPlugin;
pub use retention::{RetentionPolicy, RetentionPredicate};
