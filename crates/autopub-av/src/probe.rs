//! FFprobe-based duration probing.

use crate::{Error, Result, Toolchain};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Probe the container duration of a media file using ffprobe.
///
/// Runs `ffprobe -v error -show_entries format=duration -of
/// default=noprint_wrappers=1:nokey=1 <path>` and parses the single number it
/// prints.
pub fn probe_duration(tools: &Toolchain, path: &Path) -> Result<Duration> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Probing duration of {:?}", path);

    let output = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| Error::spawn("ffprobe", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed("ffprobe", stderr.trim().to_string()));
    }

    let stdout = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    parse_duration(&stdout)
}

/// Parse ffprobe's bare duration output (seconds as a decimal number).
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let secs: f64 = trimmed
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| Error::parse_error("ffprobe", format!("not a duration: {:?}", trimmed)))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("non-positive duration: {}", secs),
        ));
    }

    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3.000000\n").unwrap(), Duration::from_secs(3));
        assert_eq!(
            parse_duration("  12.5 ").unwrap(),
            Duration::from_millis(12_500)
        );
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0.0").is_err());
        assert!(parse_duration("-4").is_err());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe_duration(&Toolchain::default(), Path::new("/no/such/clip.mp4"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_probe_missing_tool() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tools = Toolchain {
            ffprobe: "nonexistent_ffprobe_12345".into(),
            ..Toolchain::default()
        };
        let err = probe_duration(&tools, file.path()).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }
}
