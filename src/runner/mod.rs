//! Run controller: one locked pass over the watch folder or a single file.

mod lock;
mod targets;

pub use lock::{LockError, RunLock};
pub use targets::{PlatformFlags, PublishTargets};

use crate::api::{build_client, ProcessClient, ProcessOptions, ProcessOutcome, Publisher};
use crate::config::Config;
use crate::ledger::Ledgers;
use crate::pipeline::Normalizer;
use crate::scanner::{self, ForceList, ScanRules, WorkItem};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Everything a run takes from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub targets: PublishTargets,
    pub test_mode: bool,
    pub process: ProcessOptions,
    pub force: ForceList,
    /// Process this file instead of scanning the watch folder.
    pub path: Option<PathBuf>,
    /// Show progress bars.
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Create the data directories and open both ledgers.
pub fn prepare(config: &Config) -> Result<Ledgers> {
    let paths = &config.paths;
    for dir in [
        &paths.data_dir,
        &paths.watch_dir,
        &paths.transcription_dir,
        &paths.augment_dir,
        &paths.logs_dir,
    ] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }
    Ledgers::open(&paths.videos_db, &paths.processed_db)
}

/// The per-file stages, built once per run.
struct FilePipeline {
    normalizer: Normalizer,
    processor: ProcessClient,
    publisher: Publisher,
}

impl FilePipeline {
    fn new(config: &Config, verbose: bool) -> Self {
        let client = build_client(Duration::from_secs(config.endpoints.connect_timeout_secs));
        Self {
            normalizer: Normalizer::from_config(config),
            processor: ProcessClient::new(client.clone(), config).with_progress(verbose),
            publisher: Publisher::from_config(client, config),
        }
    }

    async fn run(&self, item: &WorkItem, options: &RunOptions) -> Result<()> {
        let normalizer = self.normalizer.clone();
        let input = item.path.clone();
        let video = tokio::task::spawn_blocking(move || normalizer.normalize(&input))
            .await
            .context("Length normalization task failed")?;

        let outcome = self
            .processor
            .submit(&video, &options.process)
            .await
            .with_context(|| format!("Processing {} failed", item.filename))?;

        match outcome {
            ProcessOutcome::Bundle(bundle) => {
                self.publisher
                    .publish(&bundle.archive_path, options.targets, options.test_mode)
                    .await
                    .with_context(|| format!("Publishing {} failed", item.filename))?;
            }
            ProcessOutcome::Remote(job) => {
                info!(
                    "Video {} accepted by the processing service; it publishes on its own",
                    job.video_id
                );
            }
        }
        Ok(())
    }
}

/// Run the whole pipeline once under the run lock.
///
/// Per-file failures are logged and counted; only setup problems (lock held,
/// unreadable watch folder, ledger I/O) abort the run.
pub async fn run(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    let _lock = RunLock::acquire(&config.paths.lock_file)?;
    let ledgers = prepare(config)?;

    info!(
        "Publishing to [{}]{}",
        options.targets,
        if options.test_mode { " in test mode" } else { "" }
    );
    if !options.force.is_empty() {
        info!("Forcing: {}", options.force.entries().join(", "));
    }

    let mut summary = RunSummary::default();
    let items = match &options.path {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("File not found: {:?}", path);
            }
            match scanner::qualify_single(path, &config.video.extensions, &ledgers, &options.force) {
                Some(item) => {
                    ledgers.seen.append_if_absent(&item.filename)?;
                    vec![item]
                }
                None => {
                    summary.skipped += 1;
                    Vec::new()
                }
            }
        }
        None => {
            let rules = ScanRules {
                extensions: &config.video.extensions,
                skip_prefix: &config.video.skip_prefix,
            };
            let found = scanner::scan(&config.paths.watch_dir, &rules, &ledgers, &options.force)?;
            summary.skipped += found.skipped;
            found.items
        }
    };

    if items.is_empty() {
        info!("Nothing to process");
        return Ok(summary);
    }

    let pipeline = FilePipeline::new(config, options.verbose);
    let bar = batch_bar(items.len() as u64, options.verbose);

    for item in &items {
        bar.set_message(item.filename.clone());
        info!(
            "Processing {}{}",
            item.filename,
            if item.forced { " (forced)" } else { "" }
        );

        match pipeline.run(item, options).await {
            Ok(()) => {
                ledgers.processed.append_if_absent(&item.filename)?;
                info!("Finished {}", item.filename);
                summary.processed += 1;
            }
            Err(e) => {
                error!("{:#}", e);
                summary.failed += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        "Run complete: {} processed, {} failed, {} skipped",
        summary.processed, summary.failed, summary.skipped
    );
    Ok(summary)
}

fn batch_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}
