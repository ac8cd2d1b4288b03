//! Loop a short clip until it reaches a minimum length.
//!
//! The clip is listed several times in a concat-demuxer directive and written
//! out in one ffmpeg pass. Video is stream-copied; audio is re-encoded to AAC
//! because copied audio does not join cleanly across the repeated segments.

use crate::{Error, Result, Toolchain, Workspace};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Upper bound on copies in one directive.
pub const MAX_REPEATS: u32 = 1000;

/// Number of back-to-back copies needed to reach `minimum`.
///
/// `ceil(minimum / duration)`, never less than one. Durations so short that
/// more than [`MAX_REPEATS`] copies would be needed are rejected.
pub fn repeat_count(duration: Duration, minimum: Duration) -> Result<u32> {
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "cannot loop a clip of {}s",
            secs
        )));
    }
    let count = (minimum.as_secs_f64() / secs).ceil().max(1.0);
    if count > f64::from(MAX_REPEATS) {
        return Err(Error::InvalidInput(format!(
            "a {}s clip needs {} copies to reach {}s (limit {})",
            secs,
            count,
            minimum.as_secs_f64(),
            MAX_REPEATS
        )));
    }
    Ok(count as u32)
}

/// Concat-demuxer directive listing `input` `count` times.
pub fn concat_directive(input: &Path, count: u32) -> String {
    // Single quotes inside a quoted path close, escape, and reopen the quote.
    let escaped = input.display().to_string().replace('\'', r"'\''");
    let line = format!("file '{}'\n", escaped);
    line.repeat(count as usize)
}

/// Where the looped copy of `input` is written.
///
/// `<dir>/<stem>_augmented_<min>s.<ext>`
pub fn augmented_output_path(dir: &Path, input: &Path, minimum: Duration) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::InvalidInput(format!("no file name in {:?}", input)))?
        .to_string_lossy();
    let secs = format_secs(minimum);
    let name = match input.extension() {
        Some(ext) => format!("{}_augmented_{}s.{}", stem, secs, ext.to_string_lossy()),
        None => format!("{}_augmented_{}s", stem, secs),
    };
    Ok(dir.join(name))
}

fn format_secs(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{}", secs)
    }
}

/// Write `count` concatenated copies of `input` to `output`.
///
/// The directive file lives in a [`Workspace`] that is removed when this
/// function returns, on success and on every error path.
pub fn loop_to_duration(
    tools: &Toolchain,
    input: &Path,
    output: &Path,
    count: u32,
    audio_bitrate: &str,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }
    if count == 0 || count > MAX_REPEATS {
        return Err(Error::InvalidInput(format!(
            "repeat count must be between 1 and {}, got {}",
            MAX_REPEATS, count
        )));
    }

    // The concat demuxer resolves relative entries against the list's own
    // directory, so the directive must carry an absolute path.
    let absolute = std::fs::canonicalize(input)?;

    let workspace = Workspace::new()?;
    let list = workspace.temp_file("concat_list.txt");
    std::fs::write(&list, concat_directive(&absolute, count))?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Looping {:?} x{} -> {:?} (audio aac {})",
        input,
        count,
        output,
        audio_bitrate
    );

    let result = Command::new(&tools.ffmpeg)
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list)
        .args(["-c:v", "copy", "-c:a", "aac", "-b:a", audio_bitrate])
        .arg(output)
        .output()
        .map_err(|e| Error::spawn("ffmpeg", e))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(Error::tool_failed(
            "ffmpeg",
            format!("concat exited with {:?}: {}", result.status.code(), stderr.trim()),
        ));
    }

    if !output.exists() {
        return Err(Error::tool_failed(
            "ffmpeg",
            format!("concat reported success but {:?} was not written", output),
        ));
    }

    Ok(())
}
