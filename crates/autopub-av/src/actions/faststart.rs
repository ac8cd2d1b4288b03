//! Fast-start remux for streaming uploads.

use crate::{Error, Result, Toolchain};
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name prefix of remuxed copies.
///
/// Directory scans skip files carrying it so the tool never re-ingests its
/// own intermediates.
pub const FASTSTART_PREFIX: &str = "preprocessed";

/// `<dir of input>/preprocessed_<file name>`
pub fn faststart_output_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("no file name in {:?}", input)))?;
    let remuxed = format!("{}_{}", FASTSTART_PREFIX, name.to_string_lossy());
    Ok(match input.parent() {
        Some(parent) => parent.join(remuxed),
        None => PathBuf::from(remuxed),
    })
}

/// Move the container index to the front of the file, copying both tracks.
///
/// Returns the path of the remuxed copy.
pub fn faststart_remux(tools: &Toolchain, input: &Path) -> Result<PathBuf> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }
    let output = faststart_output_path(input)?;

    #[cfg(feature = "tracing")]
    tracing::info!("Fast-start remux {:?} -> {:?}", input, output);

    let result = Command::new(&tools.ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-vcodec", "copy", "-acodec", "copy", "-movflags", "faststart"])
        .arg(&output)
        .output()
        .map_err(|e| Error::spawn("ffmpeg", e))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(Error::tool_failed("ffmpeg", stderr.trim().to_string()));
    }

    Ok(output)
}
