//! Append-only filename ledgers.
//!
//! A ledger is a CSV file with one filename per row and no header. Rows are
//! never rewritten or removed. On open, every row is loaded into a set so
//! membership checks do not touch the disk again, and all appends go through
//! one mutex so a process never writes the same name twice.

mod csv;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Ledger {
    path: PathBuf,
    inner: Mutex<LedgerInner>,
}

struct LedgerInner {
    names: HashSet<String>,
    file: File,
}

impl Ledger {
    /// Open (creating if needed) the ledger at `path` and index its rows.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create ledger directory: {:?}", parent))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open ledger: {:?}", path))?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger: {:?}", path))?;
        let names: HashSet<String> = csv::first_fields(&content)
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect();

        tracing::debug!("Ledger {:?} holds {} names", path, names.len());

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(LedgerInner { names, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().names.contains(name)
    }

    /// Record `name` unless it is already present.
    ///
    /// Returns `true` when a row was written.
    pub fn append_if_absent(&self, name: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.names.contains(name) {
            return Ok(false);
        }

        let row = csv::encode_row(name);
        inner
            .file
            .write_all(row.as_bytes())
            .and_then(|_| inner.file.flush())
            .with_context(|| format!("Failed to append to ledger: {:?}", self.path))?;
        inner.names.insert(name.to_string());

        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The two ledgers a run works with.
pub struct Ledgers {
    /// Every video name the scanner has observed.
    pub seen: Ledger,
    /// Names whose pipeline completed.
    pub processed: Ledger,
}

impl Ledgers {
    pub fn open(seen: &Path, processed: &Path) -> Result<Self> {
        Ok(Self {
            seen: Ledger::open(seen)?,
            processed: Ledger::open(processed)?,
        })
    }
}
