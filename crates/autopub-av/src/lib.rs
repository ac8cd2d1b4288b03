//! # autopub-av
//!
//! Thin wrappers around the ffmpeg command-line tools used by autopub.
//!
//! This crate provides functionality for:
//! - Probing the duration of a media file with ffprobe
//! - Looping a short clip until it reaches a minimum length (concat demuxer)
//! - Fast-start remuxing (moving the MP4 index to the front) for streaming uploads
//! - Locating and version-checking the external tools
//!
//! ## Features
//!
//! - `tracing` - Emit tracing events for tool invocations
//!
//! ## Example
//!
//! ```no_run
//! use autopub_av::{probe_duration, Toolchain};
//!
//! let tools = Toolchain::default();
//! let duration = probe_duration(&tools, "/path/to/clip.mp4")?;
//! println!("{:.1}s", duration.as_secs_f64());
//! # Ok::<(), autopub_av::Error>(())
//! ```

mod error;
pub mod actions;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, ToolInfo, Toolchain};
pub use workspace::Workspace;

/// Probe the container duration of a media file.
///
/// This is a convenience wrapper around [`probe::probe_duration`].
pub fn probe_duration<P: AsRef<std::path::Path>>(
    tools: &Toolchain,
    path: P,
) -> Result<std::time::Duration> {
    probe::probe_duration(tools, path.as_ref())
}
