mod env;
pub mod legacy;
mod types;

pub use env::{EnvOverrides, ENV_PREFIX};
pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default config file locations, searched in order.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./autopub.toml",
    "./autopub_config.json",
    "./autopub.config",
    "~/.config/autopub/config.toml",
    "/etc/autopub/config.toml",
];

/// Parse a config file without resolving it.
///
/// The format follows the extension: `.toml`, `.json`, anything else is read
/// as shell-style `KEY=value`.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "toml" => toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path)),
        "json" => legacy::parse_json(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path)),
        _ => legacy::parse_key_value(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path)),
    }
}

/// Load, resolve and validate a config file. Errors are returned, not
/// papered over.
pub fn load_config(path: &Path) -> Result<Config> {
    let file = read_config_file(path)?;
    let overrides = EnvOverrides::from_env().context("Invalid AUTOPUB_* environment variable")?;
    let config = resolve(file, &overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Load config from the given or default locations, falling back to
/// built-in defaults with a warning when anything is missing or malformed.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Config {
    let overrides = EnvOverrides::from_env().unwrap_or_else(|e| {
        tracing::warn!("Ignoring AUTOPUB_* environment overrides: {}", e);
        EnvOverrides::default()
    });

    let file = match find_config_file(custom_path) {
        Some(path) => match read_config_file(&path) {
            Ok(file) => {
                tracing::debug!("Loaded config from {:?}", path);
                file
            }
            Err(e) => {
                tracing::warn!("{:#}. Using default configuration.", e);
                ConfigFile::default()
            }
        },
        None => {
            if let Some(path) = custom_path {
                tracing::warn!("Config file {:?} not found. Using defaults.", path);
            }
            ConfigFile::default()
        }
    };

    let config = resolve(file, &overrides);
    match validate_config(&config) {
        Ok(()) => config,
        Err(e) => {
            tracing::warn!("{:#}. Using default configuration.", e);
            resolve(ConfigFile::default(), &overrides)
        }
    }
}

fn find_config_file(custom_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom_path {
        return path.exists().then(|| path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Combine a config file with environment overrides into a [`Config`].
///
/// Precedence: environment override, then config file, then built-in default.
pub fn resolve(file: ConfigFile, overrides: &EnvOverrides) -> Config {
    let home = shellexpand::tilde("~").into_owned();
    resolve_with_home(file, overrides, Path::new(&home))
}

/// [`resolve`] with an explicit home directory for `~` expansion.
pub fn resolve_with_home(mut file: ConfigFile, overrides: &EnvOverrides, home: &Path) -> Config {
    overrides.apply(&mut file);

    let expand = |raw: &str| -> PathBuf {
        let expanded = shellexpand::tilde_with_context(raw, || Some(home.display().to_string()));
        PathBuf::from(expanded.as_ref())
    };

    let p = &file.paths;
    let data_dir = p
        .data_dir
        .as_deref()
        .map(expand)
        .unwrap_or_else(|| home.join("AutoPublishDATA"));
    let under_data = |value: &Option<String>, default: &str| {
        value
            .as_deref()
            .map(expand)
            .unwrap_or_else(|| data_dir.join(default))
    };

    let paths = Paths {
        watch_dir: under_data(&p.watch_dir, "AutoPublish"),
        transcription_dir: under_data(&p.transcription_dir, "transcription_data"),
        augment_dir: under_data(&p.augment_dir, "augmented"),
        logs_dir: under_data(&p.logs_dir, "logs"),
        videos_db: under_data(&p.videos_db, "videos_db.csv"),
        processed_db: under_data(&p.processed_db, "processed.csv"),
        lock_file: under_data(&p.lock_file, "autopub.lock"),
        data_dir: data_dir.clone(),
    };

    let mut tools = file.tools;
    tools.ffmpeg_path = tools.ffmpeg_path.map(|p| expand(&p.to_string_lossy()));
    tools.ffprobe_path = tools.ffprobe_path.map(|p| expand(&p.to_string_lossy()));

    Config {
        paths,
        endpoints: file.endpoints,
        video: file.video,
        publish: file.publish,
        tools,
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if !config.paths.watch_dir.exists() {
        tracing::warn!("Watch directory does not exist: {:?}", config.paths.watch_dir);
    }

    for (name, url) in [
        ("upload_url", &config.endpoints.upload_url),
        ("process_url", &config.endpoints.process_url),
        ("publish_url", &config.endpoints.publish_url),
    ] {
        if url.trim().is_empty() {
            anyhow::bail!("endpoints.{} cannot be empty", name);
        }
    }

    if !(config.video.min_duration_secs.is_finite() && config.video.min_duration_secs >= 0.0) {
        anyhow::bail!(
            "video.min_duration_secs must be a non-negative number, got {}",
            config.video.min_duration_secs
        );
    }

    if config.video.extensions.is_empty() {
        anyhow::bail!("video.extensions cannot be empty");
    }

    if config.video.skip_prefix.is_empty() {
        anyhow::bail!("video.skip_prefix cannot be empty");
    }

    Ok(())
}

/// Write a config file as TOML.
pub fn save_config(path: &Path, file: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(file).context("Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}
