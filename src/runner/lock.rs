use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another run is in progress (lock file {path:?} exists)")]
    Held { path: PathBuf },

    #[error("failed to create lock file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Marker file held for the duration of a run.
///
/// Created exclusively, so of two racing processes only one gets it. The
/// file is removed when the guard drops.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LockError::Held {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(io_err(e)),
        };

        let lock = Self {
            path: path.to_path_buf(),
        };
        // The pid is informational; a failed write still leaves us holding the lock.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::warn!("Could not write pid to {:?}: {}", path, e);
        }
        tracing::debug!("Acquired run lock {:?}", path);
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Released run lock {:?}", self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove lock file {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/autopub.lock");

        let lock = RunLock::acquire(&path).unwrap();
        assert!(path.exists());
        let pid = std::fs::read_to_string(&path).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());

        assert_matches!(RunLock::acquire(&path), Err(LockError::Held { .. }));

        drop(lock);
        assert!(!path.exists());
        let again = RunLock::acquire(&path).unwrap();
        assert_eq!(again.path(), path.as_path());
    }

    #[test]
    fn test_stale_lock_file_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autopub.lock");
        std::fs::write(&path, "12345\n").unwrap();

        assert_matches!(RunLock::acquire(&path), Err(LockError::Held { .. }));
        // The existing file belongs to someone else and is left alone
        assert!(path.exists());
    }
}
