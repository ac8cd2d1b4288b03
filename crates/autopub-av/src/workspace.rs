//! Scoped scratch space for intermediate files.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding intermediate files for one tool invocation.
///
/// Everything inside is deleted when the workspace is dropped, whether the
/// invocation succeeded, failed, or unwound.
///
/// # Example
///
/// ```
/// use autopub_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// let list = workspace.temp_file("concat_list.txt");
/// std::fs::write(&list, "file '/tmp/a.mp4'\n")?;
/// let dir = workspace.temp_dir().to_path_buf();
/// drop(workspace);
/// assert!(!dir.exists());
/// # Ok::<(), autopub_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new workspace in the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("autopub-")
            .tempdir()
            .map_err(|e| Error::Workspace(e.to_string()))?;
        Ok(Self { temp_dir })
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file() {
        let workspace = Workspace::new().unwrap();

        let intermediate = workspace.temp_file("concat_list.txt");
        assert!(intermediate.starts_with(workspace.temp_dir()));
        assert_eq!(intermediate.file_name().unwrap(), "concat_list.txt");
    }

    #[test]
    fn test_dropped_workspace_is_removed() {
        let workspace = Workspace::new().unwrap();
        std::fs::write(workspace.temp_file("scratch"), b"x").unwrap();
        let dir = workspace.temp_dir().to_path_buf();
        assert!(dir.exists());

        drop(workspace);
        assert!(!dir.exists());
    }
}
