//! Shared fixtures for integration tests.

#![allow(dead_code)]

use autopub::config::{self, Config, ConfigFile, EnvOverrides};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A data directory with a watch folder, wired to `base_url` for every
/// service endpoint.
pub struct TestEnv {
    pub root: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new(base_url: &str) -> Self {
        Self::with(base_url, |_| {})
    }

    pub fn with(base_url: &str, customize: impl FnOnce(&mut ConfigFile)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut file = ConfigFile::default();
        file.paths.data_dir = Some(root.path().display().to_string());
        file.endpoints.upload_url = format!("{}/upload", base_url);
        file.endpoints.process_url = format!("{}/video-processing", base_url);
        file.endpoints.publish_url = format!("{}/publish", base_url);
        // A directory cannot be executed, so probing and remuxing always fail
        // and clips are uploaded as they are
        file.tools.ffmpeg_path = Some(root.path().to_path_buf());
        file.tools.ffprobe_path = Some(root.path().to_path_buf());
        customize(&mut file);

        let config = config::resolve_with_home(file, &EnvOverrides::default(), root.path());
        std::fs::create_dir_all(&config.paths.watch_dir).unwrap();
        Self { root, config }
    }

    /// Drop a fake video into the watch folder.
    pub fn add_video(&self, name: &str) -> PathBuf {
        let path = self.config.paths.watch_dir.join(name);
        std::fs::write(&path, b"fake video bytes").unwrap();
        path
    }

    /// Pre-populate the bundle cache for `video_name`.
    pub fn add_cached_bundle(&self, video_name: &str) -> PathBuf {
        let video = Path::new(video_name);
        let path = autopub::api::cache_path_for(&self.config.paths.transcription_dir, video);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"PK cached bundle").unwrap();
        path
    }

    pub fn processed(&self) -> String {
        std::fs::read_to_string(&self.config.paths.processed_db).unwrap_or_default()
    }

    pub fn seen(&self) -> String {
        std::fs::read_to_string(&self.config.paths.videos_db).unwrap_or_default()
    }
}

/// Value of a text field in a multipart body.
pub fn form_field(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"", name);
    let start = body.find(&marker)? + marker.len();
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let end = value.find("\r\n")?;
    Some(value[..end].to_string())
}
