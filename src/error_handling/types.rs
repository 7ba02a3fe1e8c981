use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    DirectoryDoesNotExist(String),
    InvalidValue(String),
    ManifestError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
            ConfigError::ManifestError(e) => write!(f, "Test manifest error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures raised by an artifact handle or by the path hook of its plugin.
#[derive(Debug)]
pub enum ArtifactError {
    StartFailed(String),
    StopFailed(String),
    SaveFailed { path: PathBuf, source: std::io::Error },
    DiscardFailed(std::io::Error),
    PathResolution(String),
    InvalidState(&'static str),
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::StartFailed(e) => write!(f, "Artifact start failed: {}", e),
            ArtifactError::StopFailed(e) => write!(f, "Artifact stop failed: {}", e),
            ArtifactError::SaveFailed { path, source } => {
                write!(f, "Artifact save to {} failed: {}", path.display(), source)
            }
            ArtifactError::DiscardFailed(e) => write!(f, "Artifact discard failed: {}", e),
            ArtifactError::PathResolution(e) => write!(f, "Artifact path resolution failed: {}", e),
            ArtifactError::InvalidState(e) => write!(f, "Artifact in invalid state: {}", e),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactError::SaveFailed { source, .. } => Some(source),
            ArtifactError::DiscardFailed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum SchedulerError {
    QueueClosed,
    WorkerFailed(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::QueueClosed => write!(f, "Idle queue is closed"),
            SchedulerError::WorkerFailed(e) => write!(f, "Idle queue worker failed: {}", e),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Errors surfaced synchronously from the cycle-boundary calls of a controller.
#[derive(Debug)]
pub enum LifecycleError {
    Capture(ArtifactError),
    Scheduling(SchedulerError),
    CycleAlreadyOpen,
    CycleNotOpen,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::Capture(e) => write!(f, "Snapshot capture error: {}", e),
            LifecycleError::Scheduling(e) => write!(f, "Disposal scheduling error: {}", e),
            LifecycleError::CycleAlreadyOpen => {
                write!(f, "A test cycle is already open; it must end before the next starts")
            }
            LifecycleError::CycleNotOpen => write!(f, "No test cycle is open"),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::Capture(e) => Some(e),
            LifecycleError::Scheduling(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArtifactError> for LifecycleError {
    fn from(err: ArtifactError) -> Self {
        LifecycleError::Capture(err)
    }
}

impl From<SchedulerError> for LifecycleError {
    fn from(err: SchedulerError) -> Self {
        LifecycleError::Scheduling(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn lifecycle_error_exposes_capture_source() {
        let err: LifecycleError = ArtifactError::StartFailed("device offline".into()).into();
        assert_eq!(
            err.to_string(),
            "Snapshot capture error: Artifact start failed: device offline"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn save_failure_names_destination() {
        let err = ArtifactError::SaveFailed {
            path: PathBuf::from("/tmp/out/testDone.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/out/testDone.log"));
    }
}
