use super::types::*;
use crate::error_handling::types::ConfigError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `root_dir` when set.
pub const ARTIFACTS_DIR_ENV: &str = "SNAPSHOT_ARTIFACTS_DIR";
/// Overrides `snapshots.preset` when set (`none`, `failing` or `all`).
pub const ARTIFACTS_PRESET_ENV: &str = "SNAPSHOT_ARTIFACTS_PRESET";

/// Runtime configuration of the artifact lifecycle.
///
/// Loaded from a TOML file, then adjusted by environment overrides and
/// validated.
///
/// # Examples
///
/// ```toml
/// root_dir = "/tmp/artifacts"
/// run_name = "android.emu.debug"
///
/// [snapshots]
/// preset = "failing"
/// source = "/tmp/device.log"
/// extension = "log"
/// ```
///
/// # Fields Overview
///
/// - `root_dir`: directory under which each run gets its own timestamped folder
/// - `run_name`: optional prefix of the run folder, `run` when missing
/// - `snapshots`: what is captured and which preset decides retention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub root_dir: PathBuf,
    #[serde(default)]
    pub run_name: Option<String>,
    pub snapshots: SnapshotConfig,
}

impl Config {
    /// Reads the configuration stored at `path` and applies environment overrides.
    ///
    /// Not validated yet: callers apply their own overrides first, then call
    /// [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var(ARTIFACTS_DIR_ENV) {
            debug!("root_dir overridden by {}: {}", ARTIFACTS_DIR_ENV, dir);
            self.root_dir = PathBuf::from(dir);
        }
        if let Ok(preset) = std::env::var(ARTIFACTS_PRESET_ENV) {
            debug!("preset overridden by {}: {}", ARTIFACTS_PRESET_ENV, preset);
            self.snapshots.preset = parse_preset(&preset)?;
        }
        Ok(())
    }

    /// Checks values that would otherwise only fail once a test run is under way.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("root_dir must not be empty".into()));
        }

        let extension = &self.snapshots.extension;
        if extension.is_empty() || extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::InvalidValue(format!(
                "snapshot extension '{}' must be a bare extension like 'log'",
                extension
            )));
        }

        if self.snapshots.preset.is_enabled() {
            // The source itself may appear later (logs are created lazily), its directory may not.
            let parent = self
                .snapshots
                .source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if !parent.is_dir() {
                return Err(ConfigError::DirectoryDoesNotExist(format!(
                    "directory of snapshot source {} does not exist",
                    self.snapshots.source.display()
                )));
            }
        }
        Ok(())
    }
}

fn parse_preset(raw: &str) -> Result<SnapshotPreset, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(SnapshotPreset::None),
        "failing" => Ok(SnapshotPreset::Failing),
        "all" => Ok(SnapshotPreset::All),
        other => Err(ConfigError::InvalidValue(format!(
            "unknown snapshot preset '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("artifacts.toml");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn sim_config(dir: &Path) -> String {
        format!(
            r#"
root_dir = "{root}"
run_name = "ios.sim"

[snapshots]
preset = "all"
source = "{source}"
"#,
            root = dir.join("out").display(),
            source = dir.join("device.log").display()
        )
    }

    #[test]
    #[serial]
    fn test_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), &sim_config(tmp.path()));

        let config = Config::from_file(&path).unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(config.root_dir, tmp.path().join("out"));
        assert_eq!(config.run_name.as_deref(), Some("ios.sim"));
        assert_eq!(config.snapshots.preset, SnapshotPreset::All);
        assert_eq!(config.snapshots.extension, "log");
    }

    #[test]
    #[serial]
    fn env_overrides_root_dir_and_preset() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), &sim_config(tmp.path()));

        std::env::set_var(ARTIFACTS_DIR_ENV, "/var/tmp/overridden");
        std::env::set_var(ARTIFACTS_PRESET_ENV, "None");
        let config = Config::from_file(&path);
        std::env::remove_var(ARTIFACTS_DIR_ENV);
        std::env::remove_var(ARTIFACTS_PRESET_ENV);

        let config = config.unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/var/tmp/overridden"));
        assert_eq!(config.snapshots.preset, SnapshotPreset::None);
    }

    #[test]
    #[serial]
    fn unknown_env_preset_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), &sim_config(tmp.path()));

        std::env::set_var(ARTIFACTS_PRESET_ENV, "sometimes");
        let result = Config::from_file(&path);
        std::env::remove_var(ARTIFACTS_PRESET_ENV);

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    #[serial]
    fn later_overrides_can_rescue_a_file_that_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let body = format!(
            r#"
root_dir = "{root}"
[snapshots]
preset = "all"
source = "{source}"
"#,
            root = tmp.path().join("out").display(),
            source = tmp.path().join("gone").join("device.log").display()
        );
        let path = write_config(tmp.path(), &body);

        let mut config = Config::from_file(&path).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryDoesNotExist(_))
        ));

        config.snapshots.preset = SnapshotPreset::None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn preset_defaults_to_failing() {
        let config = Config::from_toml(
            r#"
root_dir = "/tmp/a"
[snapshots]
source = "/tmp/device.log"
"#,
        )
        .unwrap();
        assert_eq!(config.snapshots.preset, SnapshotPreset::Failing);
        assert_eq!(config.run_name, None);
    }

    #[test]
    fn missing_snapshots_table_is_a_toml_error() {
        let result = Config::from_toml(r#"root_dir = "/tmp/a""#);
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn extension_with_dot_is_rejected() {
        let mut config = Config::from_toml(
            r#"
root_dir = "/tmp/a"
[snapshots]
source = "/tmp/device.log"
extension = ".log"
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.snapshots.extension = "txt".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn source_in_missing_directory_is_rejected_unless_disabled() {
        let mut config = Config::from_toml(
            r#"
root_dir = "/tmp/a"
[snapshots]
preset = "all"
source = "/definitely/not/here/device.log"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryDoesNotExist(_))
        ));

        config.snapshots.preset = SnapshotPreset::None;
        assert!(config.validate().is_ok());
    }
}
