//! Watch-folder scanner.
//!
//! Lists the watch folder (non-recursively, in directory order), records what
//! it sees in the ledgers, and returns the files that still need a run.

mod force;

pub use force::ForceList;

use crate::ledger::Ledgers;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A file selected for processing in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    pub filename: String,
    /// Selected by `--force` rather than by absence from the ledger.
    pub forced: bool,
}

/// Result of one directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Files to process, in directory order.
    pub items: Vec<WorkItem>,
    /// Video files left alone because they were processed or not forced.
    pub skipped: usize,
}

/// What a scan looks for.
#[derive(Debug, Clone)]
pub struct ScanRules<'a> {
    pub extensions: &'a [String],
    /// Names starting with this are our own intermediates.
    pub skip_prefix: &'a str,
}

impl ScanRules<'_> {
    pub fn has_video_extension(&self, name: &str) -> bool {
        has_video_extension(name, self.extensions)
    }
}

/// Check a file name against an extension allowlist, ignoring case.
pub fn has_video_extension(name: &str, extensions: &[String]) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    !stem.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Scan `dir` and build this run's work queue.
///
/// Side effects on the ledgers:
/// - names carrying the skip prefix go straight into `processed`;
/// - every video file goes into `seen`, whether or not it is queued.
pub fn scan(
    dir: &Path,
    rules: &ScanRules<'_>,
    ledgers: &Ledgers,
    force: &ForceList,
) -> Result<Scan> {
    info!("Scanning directory: {:?}", dir);

    if !dir.is_dir() {
        anyhow::bail!("Watch directory does not exist: {:?}", dir);
    }

    let mut found = Scan::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };

        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 file name: {:?}", entry.path());
            continue;
        };

        if filename.starts_with(rules.skip_prefix) {
            if ledgers.processed.append_if_absent(&filename)? {
                debug!("Recorded intermediate {} as processed", filename);
            }
            continue;
        }

        if !rules.has_video_extension(&filename) {
            continue;
        }

        // Follows symlinks, so a linked video counts as a regular file.
        if !entry.path().is_file() {
            continue;
        }

        ledgers
            .seen
            .append_if_absent(&filename)
            .with_context(|| format!("Failed to record {} as seen", filename))?;

        match select(entry.path(), &filename, ledgers, force) {
            Some(item) => found.items.push(item),
            None => found.skipped += 1,
        }
    }

    info!(
        "Scan complete: {} file(s) queued, {} skipped in {:?}",
        found.items.len(),
        found.skipped,
        dir
    );
    Ok(found)
}

fn select(path: &Path, filename: &str, ledgers: &Ledgers, force: &ForceList) -> Option<WorkItem> {
    let forced = if force.is_empty() {
        if ledgers.processed.contains(filename) {
            debug!("Already processed: {}", filename);
            return None;
        }
        false
    } else if force.matches(filename) {
        true
    } else {
        return None;
    };

    Some(WorkItem {
        path: path.to_path_buf(),
        filename: filename.to_string(),
        forced,
    })
}

/// Qualify a single path given on the command line.
///
/// The name must carry a video extension. Processed names are skipped unless
/// a force list was given.
pub fn qualify_single(
    path: &Path,
    extensions: &[String],
    ledgers: &Ledgers,
    force: &ForceList,
) -> Option<WorkItem> {
    let filename = path.file_name()?.to_str()?.to_string();

    if !has_video_extension(&filename, extensions) {
        info!("{} does not look like a video file", filename);
        return None;
    }

    let forced = !force.is_empty();
    if !forced && ledgers.processed.contains(&filename) {
        info!("{} has already been processed", filename);
        return None;
    }

    Some(WorkItem {
        path: path.to_path_buf(),
        filename,
        forced,
    })
}
