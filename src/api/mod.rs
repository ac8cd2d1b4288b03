//! HTTP clients for the processing and publishing services.

mod error;
mod process;
mod progress;
mod publish;

pub use error::{ApiError, Stage};
pub use process::{
    cache_path_for, sidecar_path_for, ProcessClient, ProcessOptions, ProcessOutcome,
    ProcessedBundle, RemoteJob,
};
pub use publish::{PublishReceipt, Publisher};

use reqwest::Client;
use std::time::Duration;

/// Build the shared HTTP client.
///
/// Only connecting is bounded; uploads of large videos may take as long as
/// they need.
pub fn build_client(connect_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with connect timeout: {}", e);
            Client::new()
        })
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// A multipart file part that streams `path` from disk.
async fn file_part(
    path: &std::path::Path,
    filename: &str,
    mime: &str,
) -> Result<reqwest::multipart::Part, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::io(path, e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::io(path, e))?
        .len();
    let body = reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(file));
    Ok(reqwest::multipart::Part::stream_with_length(body, length)
        .file_name(filename.to_string())
        .mime_str(mime)?)
}
