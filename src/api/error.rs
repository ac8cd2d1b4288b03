use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which remote call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Process,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Upload => "upload",
            Stage::Process => "process",
            Stage::Publish => "publish",
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{stage} failed with status {status}: {body}")]
    Status {
        stage: Stage,
        status: u16,
        body: String,
    },

    #[error("{stage} response is not valid JSON: {source}")]
    Decode {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} response is missing `{field}`")]
    MissingField { stage: Stage, field: &'static str },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Turn a non-2xx response into [`ApiError::Status`], keeping the body.
    pub(crate) async fn check(
        stage: Stage,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::Status {
            stage,
            status: status.as_u16(),
            body,
        })
    }
}
