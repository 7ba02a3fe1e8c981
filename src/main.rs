use std::path::PathBuf;

use artifact_lifecycle::configuration::{Config, SnapshotPreset};
use artifact_lifecycle::replay::{load_manifest, replay};
use clap::Parser;
use log::{error, info, warn};

#[derive(Parser)]
#[command(name = "artifact-lifecycle")]
#[command(version)]
#[command(about = "Replays recorded test outcomes through the two-snapshots-per-test artifact lifecycle")]
struct Args {
    /// TOML configuration file
    config_file: PathBuf,

    /// JSON array of test summaries to replay
    manifest: PathBuf,

    /// Overrides `root_dir` from the configuration file and `SNAPSHOT_ARTIFACTS_DIR`
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Overrides `snapshots.preset` from the configuration file and `SNAPSHOT_ARTIFACTS_PRESET`
    #[arg(long, value_enum)]
    preset: Option<SnapshotPreset>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let mut config = Config::from_file(&args.config_file).unwrap_or_else(|e| {
        error!("Unable to import configuration from file: {}", e);
        std::process::exit(1);
    });
    if let Some(dir) = args.artifacts_dir {
        config.root_dir = dir;
    }
    if let Some(preset) = args.preset {
        config.snapshots.preset = preset;
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    info!("Configuration imported successfully");

    let summaries = load_manifest(&args.manifest).unwrap_or_else(|e| {
        error!("Unable to read test manifest: {}", e);
        std::process::exit(1);
    });

    let report = replay(&config, &summaries).await.unwrap_or_else(|e| {
        error!("Replay aborted: {}", e);
        std::process::exit(1);
    });

    info!(
        "Replayed {} test(s): {} snapshot(s) captured, {} scheduled for saving, {} scheduled for discarding -> {}",
        report.tests,
        report.stats.captured,
        report.stats.saves_scheduled,
        report.stats.discards_scheduled,
        report.run_dir.display()
    );
    info!(
        "{} of {} disposal(s) succeeded",
        report.disposals_completed.saturating_sub(report.failures.len()),
        report.disposals_completed
    );

    if !report.failures.is_empty() {
        for failure in &report.failures {
            error!("{}", failure);
        }
        warn!(
            "{} artifact(s) left undisposed: {}",
            report.outstanding.len(),
            report.outstanding.join(", ")
        );
        std::process::exit(2);
    }
}
