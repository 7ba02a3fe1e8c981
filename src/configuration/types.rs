use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How snapshots behave for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotPreset {
    /// No snapshots are taken.
    None,
    /// Snapshots are taken for every test but only kept for failed ones.
    #[default]
    Failing,
    /// Snapshots are taken and kept for every test.
    All,
}

impl SnapshotPreset {
    pub fn is_enabled(self) -> bool {
        self != SnapshotPreset::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub preset: SnapshotPreset,
    /// File whose contents are captured at each snapshot (e.g. a device log).
    pub source: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "log".to_string()
}
