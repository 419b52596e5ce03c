//! Failures of the `/convert` pipeline.
//!
//! Every variant ends the request with a plain-text body. Upstream response
//! bodies are logged where they are read and never echoed to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Missing 'url' or 'type' parameter")]
    MissingParameter,

    #[error("Invalid 'type' parameter. Must be 'mp3', 'mp4', or 'merged'.")]
    InvalidType(String),

    #[error("Failed to connect to conversion service: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Conversion service returned an error: Status {0}")]
    UpstreamBadStatus(u16),

    #[error("Failed to parse conversion service response: {0}")]
    UpstreamMalformedResponse(String),

    #[error("Conversion failed: {0}")]
    UpstreamLogicalFailure(String),

    #[error("Failed to download converted file: {0}")]
    DownloadUnreachable(#[source] reqwest::Error),

    #[error("Failed to download converted file: Status {0}")]
    DownloadBadStatus(u16),
}

impl ConvertError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConvertError::MissingParameter | ConvertError::InvalidType(_) => {
                StatusCode::BAD_REQUEST
            }
            ConvertError::UpstreamUnreachable(_)
            | ConvertError::UpstreamBadStatus(_)
            | ConvertError::UpstreamLogicalFailure(_) => StatusCode::BAD_GATEWAY,
            ConvertError::UpstreamMalformedResponse(_)
            | ConvertError::DownloadUnreachable(_)
            | ConvertError::DownloadBadStatus(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ConvertError::MissingParameter => {
                tracing::warn!("bad request: missing 'url' or 'type'");
            }
            ConvertError::InvalidType(kind) => {
                tracing::warn!(%kind, "bad request: invalid 'type'");
            }
            other => {
                tracing::error!(status = status.as_u16(), error = %other, "conversion request failed");
            }
        }
        (status, self.to_string()).into_response()
    }
}
