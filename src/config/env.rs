//! `AUTOPUB_*` environment overrides.
//!
//! Variable names follow the exported shell configuration, e.g.
//! `AUTOPUB_AUTO_PUBLISH_DIR` or `AUTOPUB_UPLOAD_URL`.

use super::ConfigFile;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "AUTOPUB_";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EnvOverrides {
    pub data_dir: Option<String>,
    pub auto_publish_dir: Option<String>,
    pub transcription_data_dir: Option<String>,
    pub augment_dir: Option<String>,
    pub logs_dir: Option<String>,
    pub videos_db_path: Option<String>,
    pub processed_path: Option<String>,
    pub lock_path: Option<String>,
    pub upload_url: Option<String>,
    pub process_url: Option<String>,
    pub publish_url: Option<String>,
    pub upload_source: Option<String>,
    pub use_app_api: Option<bool>,
    pub min_video_length: Option<f64>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Read overrides from explicit key/value pairs (keys without prefix
    /// handling, e.g. `AUTOPUB_UPLOAD_URL`).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(pairs)
    }

    /// Overlay these values onto a parsed config file.
    pub fn apply(&self, file: &mut ConfigFile) {
        fn set(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut file.paths.data_dir, &self.data_dir);
        set(&mut file.paths.watch_dir, &self.auto_publish_dir);
        set(&mut file.paths.transcription_dir, &self.transcription_data_dir);
        set(&mut file.paths.augment_dir, &self.augment_dir);
        set(&mut file.paths.logs_dir, &self.logs_dir);
        set(&mut file.paths.videos_db, &self.videos_db_path);
        set(&mut file.paths.processed_db, &self.processed_path);
        set(&mut file.paths.lock_file, &self.lock_path);
        set(&mut file.endpoints.upload_source, &self.upload_source);

        if let Some(url) = &self.upload_url {
            file.endpoints.upload_url = url.clone();
        }
        if let Some(url) = &self.process_url {
            file.endpoints.process_url = url.clone();
        }
        if let Some(url) = &self.publish_url {
            file.endpoints.publish_url = url.clone();
        }
        if let Some(flag) = self.use_app_api {
            file.endpoints.use_app_api = flag;
        }
        if let Some(secs) = self.min_video_length {
            file.video.min_duration_secs = secs;
        }
        if let Some(path) = &self.ffmpeg_path {
            file.tools.ffmpeg_path = Some(path.into());
        }
        if let Some(path) = &self.ffprobe_path {
            file.tools.ffprobe_path = Some(path.into());
        }
    }
}
