//! External tool detection and management.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// The ffmpeg/ffprobe executables used for every invocation.
///
/// Defaults to the bare program names, which are resolved through `PATH` when
/// spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Toolchain {
    /// Build a toolchain from optional configured paths.
    ///
    /// A configured path that does not exist falls back to the bare name.
    pub fn from_paths(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Self {
        Self {
            ffmpeg: configured_or_default("ffmpeg", ffmpeg),
            ffprobe: configured_or_default("ffprobe", ffprobe),
        }
    }
}

fn configured_or_default(name: &str, configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Configured {} path {:?} does not exist, using PATH lookup",
                name,
                path
            );
            let _ = path;
            PathBuf::from(name)
        }
        None => PathBuf::from(name),
    }
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use autopub_av::check_tool;
///
/// let info = check_tool("ffprobe");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(Path::new(name), "-version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(program: &Path, version_arg: &str) -> ToolInfo {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string());

    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = which::which(program).ok();

            ToolInfo {
                name,
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the tools autopub shells out to.
pub fn check_tools(tools: &Toolchain) -> Vec<ToolInfo> {
    vec![
        check_tool_with_arg(&tools.ffmpeg, "-version"),
        check_tool_with_arg(&tools.ffprobe, "-version"),
    ]
}
