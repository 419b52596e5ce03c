use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ConvertError;
use crate::models::{ConversionRequest, ResolvedDownload, UpstreamResult};

/// Client for the third-party conversion service and the files it hosts.
#[derive(Clone)]
pub struct Converter {
    client: Client,
    base_url: String,
}

impl Converter {
    pub fn new(cfg: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("clipfetch/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.upstream_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the conversion service for a converted file.
    ///
    /// Succeeds only when the service answers 2xx with a decodable envelope
    /// whose status is `ok` and whose `url` is set.
    pub async fn request_conversion(
        &self,
        req: &ConversionRequest,
    ) -> Result<UpstreamResult, ConvertError> {
        let endpoint = format!("{}/{}", self.base_url, req.kind);
        let request = self
            .client
            .get(&endpoint)
            .query(&[("url", req.source_url.as_str())])
            .build()
            .map_err(ConvertError::UpstreamUnreachable)?;

        info!(url = %request.url(), "calling conversion service");

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(ConvertError::UpstreamUnreachable)?;

        let status = resp.status();
        if !status.is_success() {
            log_rejected_body("conversion service", resp).await;
            return Err(ConvertError::UpstreamBadStatus(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ConvertError::UpstreamMalformedResponse(e.to_string()))?;
        let result: UpstreamResult = serde_json::from_slice(&body)
            .map_err(|e| ConvertError::UpstreamMalformedResponse(e.to_string()))?;

        if !result.is_ok() {
            warn!(
                status = %result.status,
                error = %result.error,
                "conversion service status not 'ok' or url empty"
            );
            return Err(ConvertError::UpstreamLogicalFailure(result.error_message()));
        }

        debug!(ftype = %result.ftype, fsize = %result.fsize, "conversion service envelope");
        info!(download_url = %result.url, "conversion service returned download URL");
        Ok(result)
    }

    /// Request the converted file's location and read its content headers.
    /// The body is dropped unread.
    pub async fn resolve_download(&self, url: &str) -> Result<ResolvedDownload, ConvertError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ConvertError::DownloadUnreachable)?;

        let status = resp.status();
        if !status.is_success() {
            log_rejected_body("download location", resp).await;
            return Err(ConvertError::DownloadBadStatus(status.as_u16()));
        }

        Ok(ResolvedDownload {
            content_type: header_value(&resp, CONTENT_TYPE),
            content_length: header_value(&resp, CONTENT_LENGTH),
        })
    }
}

fn header_value(resp: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn log_rejected_body(peer: &str, resp: Response) {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    warn!(peer, status, body = %body, "non-success status");
}
