//! Result types: what a workflow run hands back to callers.

use serde::Serialize;
use std::fmt;

/// One stage of the download fallback cascade, in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Server-side proxy fetch through the effects API.
    Proxy,
    /// Direct fetch of the asset URL (cache-busted).
    Direct,
    /// PNG re-encode of result bytes already held in memory.
    CachedReencode,
    /// Fresh fetch of the asset URL, then PNG re-encode.
    FetchReencode,
    /// Hand the raw URL back to the caller — best effort, no bytes.
    Navigate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Proxy => "proxy",
            Strategy::Direct => "direct",
            Strategy::CachedReencode => "cached-reencode",
            Strategy::FetchReencode => "fetch-reencode",
            Strategy::Navigate => "navigate",
        };
        f.write_str(name)
    }
}

/// Why one cascade stage was skipped over. Diagnostics only — stage failures
/// never abort a download on their own.
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub strategy: Strategy,
    pub reason: String,
}

/// What a download resolved to.
#[derive(Debug, Clone)]
pub enum DownloadPayload {
    /// The asset bytes are in hand.
    Bytes(Vec<u8>),
    /// Every byte-yielding stage failed; the caller should open `url`
    /// directly (the forced-navigation stage). There is no success signal.
    Navigate { url: String },
}

impl DownloadPayload {
    /// The bytes, when the cascade produced any.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            DownloadPayload::Bytes(b) => Some(b),
            DownloadPayload::Navigate { .. } => None,
        }
    }
}

/// A resolved download: payload, suggested filename, and how we got there.
#[derive(Debug, Clone)]
pub struct DownloadedAsset {
    /// `stencil_art_<8-char-id>.<ext>`.
    pub file_name: String,
    pub payload: DownloadPayload,
    /// The stage that produced the payload.
    pub strategy: Strategy,
    /// Stages that were tried and failed before `strategy` succeeded.
    pub failures: Vec<StageFailure>,
}

/// Outcome of a generate action: the job that ran and what it produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub job_id: String,
    pub result_url: String,
    /// Status queries issued before the job completed.
    pub poll_attempts: u32,
}

/// Wall-clock accounting for a one-shot run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StencilStats {
    pub upload_ms: u64,
    /// Submission plus the whole poll loop.
    pub generate_ms: u64,
    pub download_ms: u64,
    pub total_ms: u64,
    pub poll_attempts: u32,
}

/// Everything a one-shot [`crate::stencilize::stencilize`] run produced.
#[derive(Debug, Clone, Serialize)]
pub struct StencilOutput {
    pub job_id: String,
    pub result_url: String,
    /// Suggested filename for the downloaded asset.
    pub file_name: String,
    /// The cascade stage that won.
    pub strategy: Strategy,
    /// Stages skipped over on the way there.
    pub download_failures: Vec<StageFailure>,
    /// The downloaded bytes (or the navigate hand-off). Not serialised.
    #[serde(skip)]
    pub payload: DownloadPayload,
    pub stats: StencilStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_serialises_kebab_case() {
        let json = serde_json::to_value(Strategy::CachedReencode).unwrap();
        assert_eq!(json, "cached-reencode");
        assert_eq!(Strategy::FetchReencode.to_string(), "fetch-reencode");
    }

    #[test]
    fn payload_bytes_accessor() {
        let p = DownloadPayload::Bytes(vec![1, 2, 3]);
        assert_eq!(p.bytes(), Some(&[1u8, 2, 3][..]));
        let n = DownloadPayload::Navigate {
            url: "https://out/x.png".into(),
        };
        assert!(n.bytes().is_none());
    }

    #[test]
    fn output_serialises_without_payload() {
        let out = StencilOutput {
            job_id: "j1".into(),
            result_url: "https://out/x.png".into(),
            file_name: "stencil_art_AbCdEfGh.png".into(),
            strategy: Strategy::Proxy,
            download_failures: vec![],
            payload: DownloadPayload::Bytes(vec![0u8; 16]),
            stats: StencilStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("payload").is_none());
        assert_eq!(json["strategy"], "proxy");
        assert_eq!(json["job_id"], "j1");
    }
}
