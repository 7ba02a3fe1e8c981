//! Destination paths for persisted test artifacts.
//!
//! Layout of a run:
//! ```text
//! <artifacts_dir>/<run name>.<UTC timestamp>/
//!     ✓ Login screen shows the form/testStart.log
//!     ✗ Login screen rejects bad passwords (attempt 2)/testDone.log
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::types::{TestStatus, TestSummary};

const MAX_FILENAME_BYTES: usize = 255;
const DEFAULT_RUN_NAME: &str = "run";

fn forbidden_chars() -> &'static Regex {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    FORBIDDEN.get_or_init(|| {
        Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("forbidden filename pattern is valid")
    })
}

/// Replaces characters that are not portable in file names and truncates the
/// result to 255 bytes without splitting a character.
pub fn safe_filename(name: &str) -> String {
    safe_filename_with_suffix(name, "")
}

/// Like [`safe_filename`], but `suffix` always survives truncation: only the
/// `name` part is shortened to make room for it.
fn safe_filename_with_suffix(name: &str, suffix: &str) -> String {
    let suffix = forbidden_chars().replace_all(suffix, "_");
    let cleaned = forbidden_chars().replace_all(name, "_");
    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len());
    let mut end = cleaned.len().min(budget);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &cleaned[..end], suffix)
}

#[derive(Debug, Clone)]
pub struct ArtifactPathBuilder {
    root_dir: PathBuf,
}

impl ArtifactPathBuilder {
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        }
    }

    /// Builder rooted at a fresh per-run directory under `artifacts_dir`.
    pub fn for_run<P: AsRef<Path>>(
        artifacts_dir: P,
        run_name: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let name = format!(
            "{}.{}",
            run_name.unwrap_or(DEFAULT_RUN_NAME),
            started_at.format("%Y-%m-%d %H-%M-%SZ")
        );
        Self::new(artifacts_dir.as_ref().join(safe_filename(&name)))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Path of `artifact_name` inside the directory of the given test.
    ///
    /// Deterministic for a given summary and name.
    pub fn build_path_for_test_artifact(&self, summary: &TestSummary, artifact_name: &str) -> PathBuf {
        let prefix = match summary.status {
            TestStatus::Passed => "✓ ",
            TestStatus::Failed => "✗ ",
            TestStatus::Running => "",
        };
        let attempt = if summary.invocations > 1 {
            format!(" (attempt {})", summary.invocations)
        } else {
            String::new()
        };
        let test_dir = safe_filename_with_suffix(&format!("{}{}", prefix, summary.full_name), &attempt);
        self.root_dir.join(test_dir).join(safe_filename(artifact_name))
    }
}
