//! Length normalizer: loop clips shorter than the publishing minimum.

use crate::config::Config;
use autopub_av::actions::{augmented_output_path, loop_to_duration, repeat_count};
use autopub_av::Toolchain;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for [`Normalizer::normalize`], taken from the resolved config.
#[derive(Debug, Clone)]
pub struct Normalizer {
    tools: Toolchain,
    min_duration: Duration,
    augment_dir: PathBuf,
    audio_bitrate: String,
}

impl Normalizer {
    pub fn new(
        tools: Toolchain,
        min_duration: Duration,
        augment_dir: impl Into<PathBuf>,
        audio_bitrate: impl Into<String>,
    ) -> Self {
        Self {
            tools,
            min_duration,
            augment_dir: augment_dir.into(),
            audio_bitrate: audio_bitrate.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.toolchain(),
            config.video.min_duration(),
            &config.paths.augment_dir,
            &config.video.audio_bitrate,
        )
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    /// Return a path to a file at least the minimum length.
    ///
    /// That is `input` itself when it is already long enough, when its length
    /// cannot be probed, or when looping fails. Otherwise it is the looped
    /// copy under the augment directory. Never fails.
    pub fn normalize(&self, input: &Path) -> PathBuf {
        let duration = match autopub_av::probe_duration(&self.tools, input) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    "Could not probe duration of {:?}, leaving it as is: {}",
                    input,
                    e
                );
                return input.to_path_buf();
            }
        };

        if duration >= self.min_duration {
            tracing::debug!(
                "{:?} is {:.2}s, no augmentation needed",
                input,
                duration.as_secs_f64()
            );
            return input.to_path_buf();
        }

        let output = match augmented_output_path(&self.augment_dir, input, self.min_duration) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Cannot name augmented output for {:?}: {}", input, e);
                return input.to_path_buf();
            }
        };

        if output.is_file() {
            tracing::info!("Reusing augmented video {:?}", output);
            return output;
        }

        let count = match repeat_count(duration, self.min_duration) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Not looping {:?}: {}", input, e);
                return input.to_path_buf();
            }
        };

        tracing::info!(
            "{:?} is {:.2}s (< {:.2}s), repeating {} times",
            input,
            duration.as_secs_f64(),
            self.min_duration.as_secs_f64(),
            count
        );

        match loop_to_duration(&self.tools, input, &output, count, &self.audio_bitrate) {
            Ok(()) => {
                tracing::info!("Augmented video written to {:?}", output);
                output
            }
            Err(e) => {
                tracing::error!("Augmenting {:?} failed, using the original: {}", input, e);
                // A partial output would otherwise be reused on the next run
                if let Err(e) = std::fs::remove_file(&output) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!("Failed to remove partial output {:?}: {}", output, e);
                    }
                }
                input.to_path_buf()
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        input: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("clip.mp4");
            std::fs::write(&input, b"not really a video").unwrap();
            Self { dir, input }
        }

        fn script(&self, name: &str, body: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        /// ffprobe reporting `secs` for everything except augmented outputs,
        /// which report eight seconds.
        fn ffprobe(&self, secs: &str) -> PathBuf {
            self.script(
                "ffprobe",
                &format!(
                    "case \"$*\" in *_augmented_*) echo 8.0 ;; *) echo {} ;; esac",
                    secs
                ),
            )
        }

        /// ffmpeg that records each call, keeps a copy of the concat list
        /// and creates its output file.
        fn ffmpeg(&self) -> PathBuf {
            let dir = self.dir.path().display();
            self.script(
                "ffmpeg",
                &format!(
                    r#"echo call >> "{dir}/calls"
prev=""
last=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then cp "$a" "{dir}/directive.txt"; fi
  prev="$a"
  last="$a"
done
: > "$last""#
                ),
            )
        }

        fn calls(&self) -> usize {
            std::fs::read_to_string(self.dir.path().join("calls"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        fn directive(&self) -> String {
            std::fs::read_to_string(self.dir.path().join("directive.txt")).unwrap()
        }

        fn normalizer(&self, ffmpeg: PathBuf, ffprobe: PathBuf) -> Normalizer {
            Normalizer::new(
                Toolchain { ffmpeg, ffprobe },
                Duration::from_secs(7),
                self.dir.path().join("augmented"),
                "192k",
            )
        }
    }

    #[test]
    fn test_short_clip_is_looped_in_one_pass() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("2.0"));

        let out = normalizer.normalize(&fx.input);

        assert_eq!(out, fx.dir.path().join("augmented/clip_augmented_7s.mp4"));
        assert!(out.exists());
        assert_eq!(fx.calls(), 1);
        let directive = fx.directive();
        assert_eq!(directive.lines().count(), 4);
        assert!(directive.lines().all(|l| l.starts_with("file '") && l.ends_with("clip.mp4'")));
    }

    #[test]
    fn test_three_second_clip_repeats_three_times() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("3"));

        normalizer.normalize(&fx.input);

        assert_eq!(fx.directive().lines().count(), 3);
    }

    #[test]
    fn test_long_clip_is_untouched() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("7.0"));

        assert_eq!(normalizer.normalize(&fx.input), fx.input);
        assert_eq!(fx.calls(), 0);
    }

    #[test]
    fn test_probe_failure_returns_input() {
        let fx = Fixture::new();
        let ffprobe = fx.script("ffprobe", "exit 1");
        let normalizer = fx.normalizer(fx.ffmpeg(), ffprobe);

        assert_eq!(normalizer.normalize(&fx.input), fx.input);
        assert_eq!(fx.calls(), 0);
    }

    #[test]
    fn test_transcoder_failure_returns_input() {
        let fx = Fixture::new();
        let ffmpeg = fx.script("ffmpeg", "exit 1");
        let normalizer = fx.normalizer(ffmpeg, fx.ffprobe("2.0"));

        assert_eq!(normalizer.normalize(&fx.input), fx.input);
    }

    #[test]
    fn test_normalizing_output_again_is_a_no_op() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("2.0"));

        let first = normalizer.normalize(&fx.input);
        let second = normalizer.normalize(&first);

        assert_eq!(first, second);
        assert_eq!(fx.calls(), 1);
    }

    #[test]
    fn test_existing_augmented_output_is_reused() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("2.0"));

        let first = normalizer.normalize(&fx.input);
        let second = normalizer.normalize(&fx.input);

        assert_eq!(first, second);
        assert_eq!(fx.calls(), 1);
    }

    #[test]
    fn test_failed_loop_leaves_no_output_behind() {
        let fx = Fixture::new();
        let ffmpeg = fx.script(
            "ffmpeg",
            "for a in \"$@\"; do last=\"$a\"; done\n: > \"$last\"\nexit 1",
        );
        let normalizer = fx.normalizer(ffmpeg, fx.ffprobe("2.0"));

        assert_eq!(normalizer.normalize(&fx.input), fx.input);
        assert!(!fx.dir.path().join("augmented/clip_augmented_7s.mp4").exists());
    }

    #[test]
    fn test_vanishingly_short_clip_is_not_looped() {
        let fx = Fixture::new();
        let normalizer = fx.normalizer(fx.ffmpeg(), fx.ffprobe("0.000000001"));

        assert_eq!(normalizer.normalize(&fx.input), fx.input);
        assert_eq!(fx.calls(), 0);
    }
}
