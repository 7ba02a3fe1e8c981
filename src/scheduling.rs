//! Idle-time scheduling of deferred work.

pub mod idle_queue;

pub use idle_queue::{DeferredAction, DisposalFailure, IdleQueue, IdleScheduler};
