pub mod types;

pub use types::{ArtifactError, ConfigError, LifecycleError, SchedulerError};
