//! The effects-API seam: wire types, the [`EffectsApi`] trait, and the
//! reqwest-backed [`HttpEffectsApi`].
//!
//! The remote API is a fixed external contract (five endpoints; see each
//! trait method). Everything above this module talks to the trait, never to
//! reqwest — inject a scripted implementation via
//! [`crate::config::StencilConfigBuilder::api`] to drive the whole workflow
//! without a network.

use crate::config::StencilConfig;
use crate::error::StencilError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

// ── Wire types ───────────────────────────────────────────────────────────

/// Remote job status vocabulary.
///
/// Anything the service invents beyond the known set lands in `Unknown`,
/// which the poller treats as "still working" and keeps polling through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JobStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
    Error,
    Unknown,
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "submitted" => JobStatus::Submitted,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "error" => JobStatus::Error,
            _ => JobStatus::Unknown,
        }
    }
}

impl JobStatus {
    /// True for `Failed` and `Error` — the two remote failure spellings.
    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Error)
    }
}

/// Body of a job submission, serialised camelCase on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub model: String,
    pub tool_type: String,
    pub effect_id: String,
    pub image_url: String,
    pub user_id: String,
    pub remove_watermark: bool,
    pub is_private: bool,
}

/// What a successful submission returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReceipt {
    pub job_id: String,
    pub status: JobStatus,
}

/// A status-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<ResultPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The `result` field arrives either as a single object or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    One(ResultItem),
    Many(Vec<ResultItem>),
}

impl ResultPayload {
    /// The single object, or the first element of the list.
    pub fn first(&self) -> Option<&ResultItem> {
        match self {
            ResultPayload::One(item) => Some(item),
            ResultPayload::Many(items) => items.first(),
        }
    }
}

/// One generated asset. The service spells the media URL two ways;
/// `mediaUrl` wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ResultItem {
    /// The media URL under whichever field the service used.
    pub fn url(&self) -> Option<&str> {
        self.media_url.as_deref().or(self.image.as_deref())
    }
}

/// Raw bytes fetched for a result asset, with the declared content type.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

// ── The seam ─────────────────────────────────────────────────────────────

/// The five fixed HTTP contracts of the effects service.
#[async_trait]
pub trait EffectsApi: Send + Sync {
    /// `GET /get-emd-upload-url?fileName=<name>` → text body: a write-once
    /// target URL for that storage key.
    async fn fetch_upload_target(&self, file_name: &str) -> Result<String, StencilError>;

    /// `PUT <target>` with the raw bytes and a `Content-Type` header.
    async fn put_object(
        &self,
        target_url: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StencilError>;

    /// `POST /image-gen` with the transformation profile.
    async fn submit_job(&self, request: &SubmitRequest) -> Result<JobReceipt, StencilError>;

    /// `GET /image-gen/<user_id>/<job_id>/status`.
    async fn job_status(&self, user_id: &str, job_id: &str)
        -> Result<StatusResponse, StencilError>;

    /// `GET /download-proxy?url=<url>` — server-side fetch of the asset.
    async fn proxy_fetch(&self, url: &str) -> Result<FetchedAsset, StencilError>;

    /// `GET <url>` with a `<bust_key>=<millis>` cache-busting parameter
    /// appended to whatever query string the URL already carries.
    async fn direct_fetch(&self, url: &str, bust_key: &str) -> Result<FetchedAsset, StencilError>;
}

// ── reqwest implementation ───────────────────────────────────────────────

/// [`EffectsApi`] over HTTPS via reqwest (rustls).
pub struct HttpEffectsApi {
    http: reqwest::Client,
    api_base: String,
    api_timeout: Duration,
    upload_timeout: Duration,
    download_timeout: Duration,
}

impl HttpEffectsApi {
    /// Build a client from the config's endpoint and timeout settings.
    pub fn new(config: &StencilConfig) -> Result<Self, StencilError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StencilError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_timeout: Duration::from_secs(config.api_timeout_secs),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        })
    }
}

/// Wall-clock millis for cache-busting query values.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl EffectsApi for HttpEffectsApi {
    async fn fetch_upload_target(&self, file_name: &str) -> Result<String, StencilError> {
        let endpoint = format!("{}/get-emd-upload-url", self.api_base);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("fileName", file_name)])
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| StencilError::UploadUrl {
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::UploadUrl {
                detail: format!("HTTP {}", response.status()),
            });
        }

        let target = response.text().await.map_err(|e| StencilError::UploadUrl {
            detail: format!("unreadable response body: {e}"),
        })?;
        debug!("got signed upload target for {}", file_name);
        Ok(target)
    }

    async fn put_object(
        &self,
        target_url: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StencilError> {
        let response = self
            .http
            .put(target_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| StencilError::UploadTransfer {
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::UploadTransfer {
                detail: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }

    async fn submit_job(&self, request: &SubmitRequest) -> Result<JobReceipt, StencilError> {
        let endpoint = format!("{}/image-gen", self.api_base);
        let response = self
            .http
            .post(&endpoint)
            .header(ACCEPT, "application/json, text/plain, */*")
            .json(request)
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| StencilError::Submission {
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::Submission {
                detail: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<JobReceipt>()
            .await
            .map_err(|e| StencilError::Submission {
                detail: format!("malformed response body: {e}"),
            })
    }

    async fn job_status(
        &self,
        user_id: &str,
        job_id: &str,
    ) -> Result<StatusResponse, StencilError> {
        let endpoint = format!("{}/image-gen/{}/{}/status", self.api_base, user_id, job_id);
        let response = self
            .http
            .get(&endpoint)
            .header(ACCEPT, "application/json, text/plain, */*")
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| StencilError::StatusCheck {
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::StatusCheck {
                detail: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| StencilError::StatusCheck {
                detail: format!("malformed response body: {e}"),
            })
    }

    async fn proxy_fetch(&self, url: &str) -> Result<FetchedAsset, StencilError> {
        let endpoint = format!("{}/download-proxy", self.api_base);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("url", url)])
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| StencilError::Fetch {
                url: url.to_string(),
                detail: format!("proxy: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::Fetch {
                url: url.to_string(),
                detail: format!("proxy: HTTP {}", response.status()),
            });
        }

        read_asset(response, url).await
    }

    async fn direct_fetch(&self, url: &str, bust_key: &str) -> Result<FetchedAsset, StencilError> {
        let response = self
            .http
            .get(url)
            .query(&[(bust_key, now_millis())])
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| StencilError::Fetch {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StencilError::Fetch {
                url: url.to_string(),
                detail: format!("HTTP {}", response.status()),
            });
        }

        read_asset(response, url).await
    }
}

/// Pull the content type, then the body bytes, out of a fetch response.
async fn read_asset(response: reqwest::Response, url: &str) -> Result<FetchedAsset, StencilError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| StencilError::Fetch {
            url: url.to_string(),
            detail: format!("body read: {e}"),
        })?
        .to_vec();

    Ok(FetchedAsset {
        bytes,
        content_type,
    })
}
