use super::progress::download_bar;
use super::{bool_field, file_part, ApiError, Stage};
use crate::config::Config;
use autopub_av::actions::faststart_remux;
use autopub_av::Toolchain;
use indicatif::ProgressBar;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Cache switches for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOptions {
    /// Reuse an existing local bundle instead of contacting the service.
    pub use_cache: bool,
    /// Forwarded to the service.
    pub use_translation_cache: bool,
    /// Forwarded to the service.
    pub use_metadata_cache: bool,
}

/// A processed archive on local disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBundle {
    pub archive_path: PathBuf,
    /// Parsed `<stem>_data.json`, or `null` when it is absent or unreadable.
    pub metadata: Value,
}

/// A job accepted by a service that processes by video id and answers in
/// JSON instead of returning an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    pub video_id: String,
    pub file_path: Option<String>,
    pub upload: Value,
    pub process: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Bundle(ProcessedBundle),
    Remote(RemoteJob),
}

/// `<transcription_dir>/<stem>/<stem>.zip`
pub fn cache_path_for(transcription_dir: &Path, video: &Path) -> PathBuf {
    let stem = stem_of(video);
    transcription_dir.join(&stem).join(format!("{}.zip", stem))
}

/// `<transcription_dir>/<stem>/<stem>_data.json`
pub fn sidecar_path_for(transcription_dir: &Path, video: &Path) -> PathBuf {
    let stem = stem_of(video);
    transcription_dir.join(&stem).join(format!("{}_data.json", stem))
}

fn stem_of(video: &Path) -> String {
    video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn name_of(video: &Path) -> String {
    video
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether uploads go through the streaming endpoint (path ends in `stream`).
pub(crate) fn is_streaming_endpoint(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().trim_end_matches('/').ends_with("stream"),
        Err(_) => url.trim_end_matches('/').ends_with("stream"),
    }
}

/// Fill `{video_id}` or `{id}` in the process URL. A template without a
/// placeholder is used as is.
pub(crate) fn process_url_for(template: &str, video_id: &str) -> String {
    template
        .replace("{video_id}", video_id)
        .replace("{id}", video_id)
}

/// The `video_id` of an upload response, as a string or a number.
fn video_id_of(upload: &Value) -> Option<String> {
    match upload.get("video_id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Uploads videos and retrieves their processed bundles.
#[derive(Debug, Clone)]
pub struct ProcessClient {
    client: Client,
    upload_url: String,
    process_url: String,
    use_app_api: bool,
    upload_source: Option<String>,
    transcription_dir: PathBuf,
    tools: Toolchain,
    show_progress: bool,
}

impl ProcessClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            upload_url: config.endpoints.upload_url.clone(),
            process_url: config.endpoints.process_url.clone(),
            use_app_api: config.endpoints.use_app_api,
            upload_source: config.endpoints.effective_upload_source().map(str::to_string),
            transcription_dir: config.paths.transcription_dir.clone(),
            tools: config.toolchain(),
            show_progress: false,
        }
    }

    /// Show byte progress while downloading bundles.
    pub fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    /// Get a processed bundle for `video`, from the local cache when allowed
    /// or by uploading it and asking the service to process it.
    pub async fn submit(
        &self,
        video: &Path,
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome, ApiError> {
        let archive_path = cache_path_for(&self.transcription_dir, video);

        if archive_path.exists() {
            if options.use_cache {
                info!("Cache hit for {:?}: {:?}", video, archive_path);
                let metadata = read_sidecar(&sidecar_path_for(&self.transcription_dir, video));
                return Ok(ProcessOutcome::Bundle(ProcessedBundle {
                    archive_path,
                    metadata,
                }));
            }
            info!("Cache ignored for {:?}, reprocessing", video);
        } else if options.use_cache {
            info!("Cache miss for {:?}", video);
        }

        let upload = self.upload(video).await?;

        if self.use_app_api {
            match video_id_of(&upload) {
                Some(video_id) => {
                    return self
                        .process_remote(upload, video_id, options)
                        .await
                        .map(ProcessOutcome::Remote);
                }
                None => info!(
                    "Upload of {:?} returned no video_id, using the file_path flow",
                    video
                ),
            }
        }

        let remote_path = upload
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or(ApiError::MissingField {
                stage: Stage::Upload,
                field: "file_path",
            })?
            .to_string();

        self.process_legacy(video, &remote_path, &archive_path, options)
            .await
            .map(ProcessOutcome::Bundle)
    }

    async fn upload(&self, video: &Path) -> Result<Value, ApiError> {
        let filename = name_of(video);
        let mut fields = vec![("filename", filename.clone()), ("title", stem_of(video))];
        if let Some(source) = &self.upload_source {
            fields.push(("source", source.clone()));
        }

        let response = if is_streaming_endpoint(&self.upload_url) {
            let payload = self.faststart(video).await;
            info!("Uploading {:?} to {} (streaming)", payload, self.upload_url);
            let part = file_part(&payload, &name_of(&payload), "video/mp4").await?;
            self.client
                .put(&self.upload_url)
                .query(&fields)
                .multipart(Form::new().part("video", part))
                .send()
                .await?
        } else {
            info!("Uploading {:?} to {}", video, self.upload_url);
            let part = file_part(video, &filename, "video/mp4").await?;
            let form = fields
                .into_iter()
                .fold(Form::new().part("video", part), |form, (name, value)| {
                    form.text(name, value)
                });
            self.client
                .post(&self.upload_url)
                .multipart(form)
                .send()
                .await?
        };

        let response = ApiError::check(Stage::Upload, response).await?;
        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            stage: Stage::Upload,
            source,
        })?;
        debug!("Upload response: {}", value);
        Ok(value)
    }

    /// Remux for streaming. Falls back to the original file on failure.
    async fn faststart(&self, video: &Path) -> PathBuf {
        let tools = self.tools.clone();
        let input = video.to_path_buf();
        match tokio::task::spawn_blocking(move || faststart_remux(&tools, &input)).await {
            Ok(Ok(remuxed)) => remuxed,
            Ok(Err(e)) => {
                warn!("Fast-start remux of {:?} failed, uploading original: {}", video, e);
                video.to_path_buf()
            }
            Err(e) => {
                warn!("Fast-start task for {:?} did not complete: {}", video, e);
                video.to_path_buf()
            }
        }
    }

    async fn process_remote(
        &self,
        upload: Value,
        video_id: String,
        options: &ProcessOptions,
    ) -> Result<RemoteJob, ApiError> {
        let url = process_url_for(&self.process_url, &video_id);
        info!("Requesting processing of video {} at {}", video_id, url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "use_translation_cache": options.use_translation_cache,
                "use_metadata_cache": options.use_metadata_cache,
            }))
            .send()
            .await?;
        let response = ApiError::check(Stage::Process, response).await?;
        let text = response.text().await?;
        let process = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => json!({ "raw": text }),
        };

        let file_path = upload
            .get("file_path")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(RemoteJob {
            video_id,
            file_path,
            upload,
            process,
        })
    }

    async fn process_legacy(
        &self,
        video: &Path,
        remote_path: &str,
        archive_path: &Path,
        options: &ProcessOptions,
    ) -> Result<ProcessedBundle, ApiError> {
        info!("Requesting processing of {}", remote_path);
        let form = [
            ("file_path", remote_path),
            (
                "use_translation_cache",
                bool_field(options.use_translation_cache),
            ),
            ("use_metadata_cache", bool_field(options.use_metadata_cache)),
        ];
        let response = self
            .client
            .post(&self.process_url)
            .form(&form)
            .send()
            .await?;
        let response = ApiError::check(Stage::Process, response).await?;

        if let Some(dir) = archive_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ApiError::io(dir, e))?;
        }

        // Stream into a side file so an interrupted download never looks
        // like a cached bundle.
        let partial = archive_path.with_extension("zip.part");
        let bar = download_bar(response.content_length(), self.show_progress);
        let streamed = stream_to_file(response, &partial, &bar).await;
        bar.finish_and_clear();
        let bytes = match streamed {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, archive_path)
            .await
            .map_err(|e| ApiError::io(archive_path, e))?;
        info!("Bundle saved to {:?} ({} bytes)", archive_path, bytes);

        let metadata = json!({
            "processed_date": chrono::Local::now().to_rfc3339(),
            "video_path": video.display().to_string(),
            "video_name": name_of(video),
            "processing_options": options,
        });
        write_sidecar(&sidecar_path_for(&self.transcription_dir, video), &metadata);

        Ok(ProcessedBundle {
            archive_path: archive_path.to_path_buf(),
            metadata,
        })
    }
}

async fn stream_to_file(
    mut response: Response,
    path: &Path,
    bar: &ProgressBar,
) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::io(path, e))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::io(path, e))?;
        written += chunk.len() as u64;
        bar.inc(chunk.len() as u64);
    }
    file.flush().await.map_err(|e| ApiError::io(path, e))?;
    Ok(written)
}

fn read_sidecar(path: &Path) -> Value {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or(Value::Null)
}

fn write_sidecar(path: &Path, metadata: &Value) {
    let result = serde_json::to_string_pretty(metadata)
        .map_err(std::io::Error::from)
        .and_then(|content| std::fs::write(path, content));
    if let Err(e) = result {
        warn!("Failed to write metadata {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_paths_hang_off_stem() {
        let root = Path::new("/data/transcription_data");
        let video = Path::new("/watch/clip_augmented_7s.mp4");
        assert_eq!(
            cache_path_for(root, video),
            PathBuf::from("/data/transcription_data/clip_augmented_7s/clip_augmented_7s.zip")
        );
        assert_eq!(
            sidecar_path_for(root, video),
            PathBuf::from(
                "/data/transcription_data/clip_augmented_7s/clip_augmented_7s_data.json"
            )
        );
    }

    #[test]
    fn test_is_streaming_endpoint() {
        assert!(is_streaming_endpoint("http://host:8081/upload-stream"));
        assert!(is_streaming_endpoint("http://host:8081/api/stream/"));
        assert!(!is_streaming_endpoint("http://host:8081/upload"));
        assert!(!is_streaming_endpoint("http://host:8081/upload?mode=stream"));
    }

    #[test]
    fn test_process_url_for() {
        assert_eq!(
            process_url_for("http://h/api/videos/{video_id}/process", "42"),
            "http://h/api/videos/42/process"
        );
        assert_eq!(
            process_url_for("http://h/api/videos/{id}/process", "abc"),
            "http://h/api/videos/abc/process"
        );
        assert_eq!(
            process_url_for("http://h/video-processing", "7"),
            "http://h/video-processing"
        );
    }

    #[test]
    fn test_video_id_of() {
        assert_eq!(video_id_of(&json!({"video_id": "abc"})), Some("abc".into()));
        assert_eq!(video_id_of(&json!({"video_id": 42})), Some("42".into()));
        assert_eq!(video_id_of(&json!({"video_id": null})), None);
        assert_eq!(video_id_of(&json!({"file_path": "/u/clip.mp4"})), None);
    }

    #[test]
    fn test_read_sidecar_missing_is_null() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_sidecar(&dir.path().join("nope.json")), Value::Null);

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_sidecar(&path), Value::Null);
    }
}
