//! Readers for the two older config formats.
//!
//! - Shell-style `KEY="value"` files (`autopub.config`), where values may
//!   reference earlier keys or environment variables as `${NAME}`.
//! - The flat JSON document (`autopub_config.json`).

use super::{ConfigFile, PublishDefaults};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Parse a shell-style `KEY=value` config.
pub fn parse_key_value(content: &str) -> Result<ConfigFile> {
    let mut vars: HashMap<String, String> = HashMap::new();
    let mut file = ConfigFile::default();

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            tracing::debug!("Ignoring config line {}: {:?}", line_no + 1, raw);
            continue;
        };

        let key = key.trim();
        let value = unquote(value.trim());
        let value = shellexpand::env_with_context_no_errors(value, |name: &str| {
            vars.get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
        })
        .into_owned();

        match key {
            "DATA_DIR" => file.paths.data_dir = Some(value.clone()),
            "AUTOPUBLISH_DIR" => file.paths.watch_dir = Some(value.clone()),
            "TRANSCRIPTION_DIR" => file.paths.transcription_dir = Some(value.clone()),
            "AUGMENT_DIR" => file.paths.augment_dir = Some(value.clone()),
            "LOGS_DIR" => file.paths.logs_dir = Some(value.clone()),
            "VIDEOS_DB_PATH" => file.paths.videos_db = Some(value.clone()),
            "PROCESSED_PATH" => file.paths.processed_db = Some(value.clone()),
            "AUTOPUB_LOCK" => file.paths.lock_file = Some(value.clone()),
            "UPLOAD_URL" => file.endpoints.upload_url = value.clone(),
            "PROCESS_URL" => file.endpoints.process_url = value.clone(),
            "PUBLISH_URL" => file.endpoints.publish_url = value.clone(),
            "MIN_VIDEO_LENGTH" => {
                file.video.min_duration_secs = value
                    .parse()
                    .with_context(|| format!("MIN_VIDEO_LENGTH is not a number: {:?}", value))?
            }
            other => tracing::debug!("Ignoring unknown config key {}", other),
        }

        vars.insert(key.to_string(), value);
    }

    Ok(file)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[derive(Debug, Default, Deserialize)]
struct JsonConfig {
    data_dir: Option<String>,
    auto_publish_dir: Option<String>,
    transcription_data_dir: Option<String>,
    logs_dir: Option<String>,
    videos_db_path: Option<String>,
    processed_path: Option<String>,
    upload_url: Option<String>,
    process_url: Option<String>,
    publish_url: Option<String>,
    min_video_length: Option<f64>,
    video_file_extensions: Option<Vec<String>>,
    default_publish_platforms: Option<JsonPlatforms>,
}

#[derive(Debug, Deserialize)]
struct JsonPlatforms {
    #[serde(default = "yes")]
    publish_xhs: bool,
    #[serde(default = "yes")]
    publish_bilibili: bool,
    #[serde(default = "yes")]
    publish_douyin: bool,
    #[serde(default = "yes")]
    publish_shipinhao: bool,
    #[serde(default = "yes")]
    publish_y2b: bool,
}

fn yes() -> bool {
    true
}

/// Parse the flat JSON config document. Unknown keys are ignored.
pub fn parse_json(content: &str) -> Result<ConfigFile> {
    let json: JsonConfig = serde_json::from_str(content).context("Invalid JSON config")?;
    let mut file = ConfigFile::default();

    file.paths.data_dir = json.data_dir;
    file.paths.watch_dir = json.auto_publish_dir;
    file.paths.transcription_dir = json.transcription_data_dir;
    file.paths.logs_dir = json.logs_dir;
    file.paths.videos_db = json.videos_db_path;
    file.paths.processed_db = json.processed_path;

    if let Some(url) = json.upload_url {
        file.endpoints.upload_url = url;
    }
    if let Some(url) = json.process_url {
        file.endpoints.process_url = url;
    }
    if let Some(url) = json.publish_url {
        file.endpoints.publish_url = url;
    }
    if let Some(secs) = json.min_video_length {
        file.video.min_duration_secs = secs;
    }
    if let Some(exts) = json.video_file_extensions {
        file.video.extensions = exts;
    }
    if let Some(p) = json.default_publish_platforms {
        file.publish = PublishDefaults {
            xhs: p.publish_xhs,
            bilibili: p.publish_bilibili,
            douyin: p.publish_douyin,
            shipinhao: p.publish_shipinhao,
            y2b: p.publish_y2b,
        };
    }

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_with_substitution() {
        let content = r#"
# comment
DATA_DIR="/srv/autopub"
AUTOPUBLISH_DIR="${DATA_DIR}/AutoPublish"
export UPLOAD_URL="http://media:8081/upload"
AUTOPUB_SH=/opt/autopub.sh
not a key value line
"#;
        let file = parse_key_value(content).unwrap();

        assert_eq!(file.paths.data_dir.as_deref(), Some("/srv/autopub"));
        assert_eq!(
            file.paths.watch_dir.as_deref(),
            Some("/srv/autopub/AutoPublish")
        );
        assert_eq!(file.endpoints.upload_url, "http://media:8081/upload");
        // Untouched keys keep their defaults
        assert_eq!(
            file.endpoints.process_url,
            "http://localhost:8081/video-processing"
        );
    }

    #[test]
    fn test_key_value_bad_number() {
        assert!(parse_key_value("MIN_VIDEO_LENGTH=soon").is_err());
    }

    #[test]
    fn test_json_document() {
        let content = r#"{
            "auto_publish_dir": "/videos/in",
            "publish_url": "http://pub:8081/publish",
            "min_video_length": 5,
            "video_file_extensions": ["mp4"],
            "default_publish_platforms": {"publish_xhs": false, "publish_y2b": true},
            "conda_env": "ignored"
        }"#;
        let file = parse_json(content).unwrap();

        assert_eq!(file.paths.watch_dir.as_deref(), Some("/videos/in"));
        assert_eq!(file.endpoints.publish_url, "http://pub:8081/publish");
        assert_eq!(file.video.min_duration_secs, 5.0);
        assert_eq!(file.video.extensions, vec!["mp4".to_string()]);
        assert!(!file.publish.xhs);
        assert!(file.publish.bilibili);
    }
}
