//! Replays a recorded list of test outcomes through a snapshot lifecycle.
//!
//! Each manifest entry drives one full cycle: the start event sees the test as
//! running, the end event sees the recorded outcome. Disposal runs on an
//! [`IdleQueue`] which is drained before the report is returned.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::artifacts::file_snapshot::FileSnapshotPlugin;
use crate::artifacts::path_builder::ArtifactPathBuilder;
use crate::artifacts::registry::TrackingRegistry;
use crate::artifacts::types::{TestStatus, TestSummary};
use crate::configuration::Config;
use crate::error_handling::types::{ConfigError, LifecycleError};
use crate::scheduling::IdleQueue;
use crate::snapshot_lifecycle::{
    RetentionPolicy, SnapshotLifecycleController, SnapshotPlugin, SnapshotStats,
};

#[derive(Debug)]
pub struct ReplayReport {
    pub run_dir: PathBuf,
    pub tests: usize,
    pub stats: SnapshotStats,
    /// Deferred disposals that ran, successfully or not.
    pub disposals_completed: usize,
    /// Disposal failures, as `<action>: <error>`.
    pub failures: Vec<String>,
    /// Labels of artifacts still tracked after the queue drained (failed disposals).
    pub outstanding: Vec<String>,
}

/// Reads a JSON array of test summaries.
pub fn load_manifest(path: &Path) -> Result<Vec<TestSummary>, ConfigError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::ManifestError(format!("{}: {}", path.display(), e)))
}

pub async fn replay(config: &Config, summaries: &[TestSummary]) -> Result<ReplayReport, LifecycleError> {
    let preset = config.snapshots.preset;
    let path_builder =
        ArtifactPathBuilder::for_run(&config.root_dir, config.run_name.as_deref(), Utc::now());
    let run_dir = path_builder.root_dir().to_path_buf();
    info!("Replaying {} test(s) into {}", summaries.len(), run_dir.display());

    let plugin = Arc::new(FileSnapshotPlugin::new(
        &config.snapshots.source,
        &config.snapshots.extension,
        path_builder,
    ));
    let registry = Arc::new(TrackingRegistry::new());
    let queue = Arc::new(IdleQueue::spawn());
    let mut controller = SnapshotLifecycleController::new(
        plugin,
        registry.clone(),
        queue.clone(),
        Arc::new(RetentionPolicy::from_preset(preset)),
    )
    .with_enabled(preset.is_enabled());

    let outcome = run_cycles(&mut controller, summaries).await;
    if outcome.is_err() {
        if let Err(e) = controller.abort_cycle() {
            warn!("Could not abort the interrupted cycle: {}", e);
        }
    }
    let stats = controller.stats();
    drop(controller);

    queue.wait_idle().await;
    queue.shutdown().await?;
    outcome?;

    let failures: Vec<String> = queue
        .take_errors()
        .into_iter()
        .map(|f| format!("{}: {}", f.label, f.error))
        .collect();

    Ok(ReplayReport {
        run_dir,
        tests: summaries.len(),
        stats,
        disposals_completed: queue.completed(),
        failures,
        outstanding: registry.outstanding_labels(),
    })
}

async fn run_cycles<P: SnapshotPlugin>(
    controller: &mut SnapshotLifecycleController<P>,
    summaries: &[TestSummary],
) -> Result<(), LifecycleError> {
    for summary in summaries {
        let running = TestSummary {
            status: TestStatus::Running,
            ..summary.clone()
        };
        controller.on_cycle_start(&running).await?;
        controller.on_cycle_end(summary).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::{SnapshotConfig, SnapshotPreset};

    fn config(dir: &Path, preset: SnapshotPreset) -> Config {
        Config {
            root_dir: dir.join("artifacts"),
            run_name: Some("replay".into()),
            snapshots: SnapshotConfig {
                preset,
                source: dir.join("app.log"),
                extension: "log".into(),
            },
        }
    }

    fn manifest() -> Vec<TestSummary> {
        vec![
            TestSummary::new("Onboarding skips intro", TestStatus::Passed),
            TestSummary::new("Onboarding asks for consent", TestStatus::Failed),
            TestSummary::new("Onboarding asks for consent", TestStatus::Passed).with_invocations(2),
        ]
    }

    #[tokio::test]
    async fn failing_preset_saves_only_failed_tests() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("app.log"), "ready\n").unwrap();

        let report = replay(&config(tmp.path(), SnapshotPreset::Failing), &manifest())
            .await
            .unwrap();

        assert_eq!(report.tests, 3);
        assert_eq!(
            report.stats,
            SnapshotStats {
                captured: 4,
                saves_scheduled: 2,
                discards_scheduled: 2
            }
        );
        assert_eq!(report.disposals_completed, 4);
        assert!(report.failures.is_empty());
        assert!(report.outstanding.is_empty());

        let failed_dir = report.run_dir.join("✗ Onboarding asks for consent");
        assert!(failed_dir.join("testStart.log").is_file());
        assert!(failed_dir.join("testDone.log").is_file());
        assert!(!report.run_dir.join("✓ Onboarding skips intro").exists());
        assert!(report.run_dir.starts_with(tmp.path().join("artifacts")));
    }

    #[tokio::test]
    async fn all_preset_keeps_retries_apart() {
        let tmp = tempfile::tempdir().unwrap();
        let report = replay(&config(tmp.path(), SnapshotPreset::All), &manifest())
            .await
            .unwrap();

        assert_eq!(report.stats.saves_scheduled, 6);
        assert!(report
            .run_dir
            .join("✓ Onboarding asks for consent (attempt 2)")
            .join("testDone.log")
            .is_file());
    }

    #[tokio::test]
    async fn failed_saves_are_reported_with_their_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("artifacts"), "not a directory").unwrap();
        let summaries = vec![TestSummary::new("Checkout pays", TestStatus::Failed)];

        let report = replay(&config(tmp.path(), SnapshotPreset::Failing), &summaries)
            .await
            .unwrap();

        assert_eq!(report.stats.saves_scheduled, 2);
        assert_eq!(report.disposals_completed, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].starts_with("save file-snapshot before snapshot of 'Checkout pays'"));
        assert_eq!(
            report.outstanding,
            vec!["file-snapshot:after".to_string(), "file-snapshot:before".to_string()]
        );
    }

    #[tokio::test]
    async fn none_preset_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let report = replay(&config(tmp.path(), SnapshotPreset::None), &manifest())
            .await
            .unwrap();

        assert_eq!(report.stats, SnapshotStats::default());
        assert!(!report.run_dir.exists());
    }

    #[test]
    fn manifest_is_read_from_a_json_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"title":"a","full_name":"Suite a","status":"passed"},
                {"title":"b","full_name":"Suite b","status":"failed","invocations":2}]"#,
        )
        .unwrap();

        let summaries = load_manifest(&path).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].invocations, 2);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(ConfigError::ManifestError(_))
        ));
    }
}
