use super::{bool_field, file_part, ApiError, Stage};
use crate::config::Config;
use crate::runner::PublishTargets;
use reqwest::multipart::Form;
use reqwest::Client;
use std::path::Path;
use tracing::info;

/// What the publishing service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub status: u16,
    pub body: String,
}

/// Forwards processed bundles to the publishing service.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
    publish_url: String,
}

impl Publisher {
    pub fn new(client: Client, publish_url: impl Into<String>) -> Self {
        Self {
            client,
            publish_url: publish_url.into(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(client, &config.endpoints.publish_url)
    }

    /// Send `bundle` with one flag per platform.
    ///
    /// The request goes out even when every flag is off; the service still
    /// records the bundle.
    pub async fn publish(
        &self,
        bundle: &Path,
        targets: PublishTargets,
        test_mode: bool,
    ) -> Result<PublishReceipt, ApiError> {
        let filename = bundle
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = file_part(bundle, &filename, "application/zip").await?;

        let form = Form::new()
            .part("file", part)
            .text("publish_xhs", bool_field(targets.xhs))
            .text("publish_bilibili", bool_field(targets.bilibili))
            .text("publish_douyin", bool_field(targets.douyin))
            .text("publish_shipinhao", bool_field(targets.shipinhao))
            .text("publish_y2b", bool_field(targets.y2b))
            .text("test", bool_field(test_mode))
            .text("filename", filename.clone());

        info!(
            "Publishing {} to [{}]{}",
            filename,
            targets,
            if test_mode { " (test mode)" } else { "" }
        );

        let response = self
            .client
            .post(&self.publish_url)
            .multipart(form)
            .send()
            .await?;
        let response = ApiError::check(Stage::Publish, response).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        info!("Publish accepted ({}): {}", status, body);

        Ok(PublishReceipt { status, body })
    }
}
