use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration as written in a config file.
///
/// Every section and field is optional; anything left out falls back to the
/// built-in defaults when the file is resolved into a [`Config`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub publish: PublishDefaults,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Unexpanded path settings. `~` is expanded during resolution.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PathsConfig {
    /// Root for everything below when not set individually
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Folder scanned for new videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_dir: Option<String>,

    /// Root of the processed bundle cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_dir: Option<String>,

    /// Where looped copies of short clips are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augment_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<String>,

    /// Ledger of every video name ever seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos_db: Option<String>,

    /// Ledger of successfully published video names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_db: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EndpointsConfig {
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Processing endpoint. With `use_app_api` this is a template containing
    /// `{video_id}` or `{id}`.
    #[serde(default = "default_process_url")]
    pub process_url: String,

    #[serde(default = "default_publish_url")]
    pub publish_url: String,

    /// Route processing by the video id returned from the upload
    #[serde(default)]
    pub use_app_api: bool,

    /// Value of the `source` upload field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_source: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_upload_url() -> String {
    "http://localhost:8081/upload".to_string()
}

fn default_process_url() -> String {
    "http://localhost:8081/video-processing".to_string()
}

fn default_publish_url() -> String {
    "http://lazyingart:8081/publish".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
            process_url: default_process_url(),
            publish_url: default_publish_url(),
            use_app_api: false,
            upload_source: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl EndpointsConfig {
    /// `source` field sent with uploads.
    ///
    /// Identifier-routed deployments identify themselves as `api` unless a
    /// source is configured explicitly.
    pub fn effective_upload_source(&self) -> Option<&str> {
        match (&self.upload_source, self.use_app_api) {
            (Some(source), _) => Some(source.as_str()),
            (None, true) => Some("api"),
            (None, false) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VideoConfig {
    /// Accepted file extensions, matched case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Clips shorter than this are looped up to it
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,

    /// AAC bitrate used when looping clips
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Names starting with this prefix are our own intermediates
    #[serde(default = "default_skip_prefix")]
    pub skip_prefix: String,
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "flv", "wmv", "mkv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_duration() -> f64 {
    7.0
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_skip_prefix() -> String {
    autopub_av::actions::FASTSTART_PREFIX.to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            min_duration_secs: default_min_duration(),
            audio_bitrate: default_audio_bitrate(),
            skip_prefix: default_skip_prefix(),
        }
    }
}

impl VideoConfig {
    pub fn min_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_duration_secs.max(0.0)).unwrap_or(Duration::ZERO)
    }
}

/// Platforms published to when no `--pub-*` flag is given.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublishDefaults {
    #[serde(default = "default_true")]
    pub xhs: bool,

    #[serde(default = "default_true")]
    pub bilibili: bool,

    #[serde(default = "default_true")]
    pub douyin: bool,

    #[serde(default = "default_true")]
    pub shipinhao: bool,

    #[serde(default = "default_true")]
    pub y2b: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PublishDefaults {
    fn default() -> Self {
        Self {
            xhs: true,
            bilibili: true,
            douyin: true,
            shipinhao: true,
            y2b: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
}

/// Fully resolved, absolute locations used during a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub watch_dir: PathBuf,
    pub transcription_dir: PathBuf,
    pub augment_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub videos_db: PathBuf,
    pub processed_db: PathBuf,
    pub lock_file: PathBuf,
}

/// Immutable configuration for one run.
///
/// Built once at startup by [`super::resolve`] and passed by reference to
/// every component.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub paths: Paths,
    pub endpoints: EndpointsConfig,
    pub video: VideoConfig,
    pub publish: PublishDefaults,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        super::resolve(ConfigFile::default(), &super::EnvOverrides::default())
    }
}

impl Config {
    pub fn toolchain(&self) -> autopub_av::Toolchain {
        autopub_av::Toolchain::from_paths(
            self.tools.ffmpeg_path.as_deref(),
            self.tools.ffprobe_path.as_deref(),
        )
    }

    /// Render back into file form with every path spelled out.
    pub fn to_file(&self) -> ConfigFile {
        let show = |p: &PathBuf| Some(p.display().to_string());
        ConfigFile {
            paths: PathsConfig {
                data_dir: show(&self.paths.data_dir),
                watch_dir: show(&self.paths.watch_dir),
                transcription_dir: show(&self.paths.transcription_dir),
                augment_dir: show(&self.paths.augment_dir),
                logs_dir: show(&self.paths.logs_dir),
                videos_db: show(&self.paths.videos_db),
                processed_db: show(&self.paths.processed_db),
                lock_file: show(&self.paths.lock_file),
            },
            endpoints: self.endpoints.clone(),
            video: self.video.clone(),
            publish: self.publish,
            tools: self.tools.clone(),
        }
    }
}
