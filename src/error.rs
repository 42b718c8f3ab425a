//! Error types for the img2stencil library.
//!
//! A single [`StencilError`] covers the whole workflow. Variants map 1:1 onto
//! the stages of the pipeline so callers can tell *where* a run died without
//! parsing message strings: the upload leg (`UploadUrl`, `UploadTransfer`),
//! the job leg (`Submission`, `StatusCheck`, `JobFailed`, `JobTimeout`,
//! `NoResultUrl`) and the retrieval leg (`Fetch`, `Download`).
//!
//! Fallback-cascade stages swallow their own errors (they are logged and
//! aggregated as diagnostics on the download result); only the guard case —
//! asking for a download with no asset URL at all — surfaces as `Download`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the img2stencil library.
#[derive(Debug, Error)]
pub enum StencilError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload-URL-issuing endpoint returned a non-success response.
    #[error("Failed to get a signed upload URL: {detail}\nCheck that the effects API is reachable.")]
    UploadUrl { detail: String },

    /// The PUT of the raw bytes to the write target failed.
    #[error("Failed to upload file to storage: {detail}")]
    UploadTransfer { detail: String },

    // ── Job errors ────────────────────────────────────────────────────────
    /// Job submission returned a non-success response or a malformed body.
    /// Terminal for the run: submissions are never retried.
    #[error("Failed to submit transformation job: {detail}")]
    Submission { detail: String },

    /// A status query failed at the transport level (non-2xx or network).
    /// Aborts the poll loop; not counted against the attempt budget.
    #[error("Failed to check job status: {detail}")]
    StatusCheck { detail: String },

    /// The remote service reported the job as failed.
    ///
    /// Carries the remote error message verbatim (falling back to
    /// "Job processing failed" when the response has none).
    #[error("{message}")]
    JobFailed { message: String },

    /// The poll attempt budget was exhausted without a terminal status.
    #[error("Job timed out after {attempts} polls (~{waited_secs}s)\nThe service may be overloaded; try again later.")]
    JobTimeout { attempts: u32, waited_secs: u64 },

    /// The completed payload carried no media URL under either accepted field.
    #[error("No image URL in the completed job response")]
    NoResultUrl,

    // ── Retrieval errors ──────────────────────────────────────────────────
    /// A single asset fetch (proxy or direct) failed.
    ///
    /// Inside the download cascade these are logged and aggregated, never
    /// propagated; the variant surfaces only when a fetch is performed
    /// outside the cascade.
    #[error("Failed to fetch '{url}': {detail}")]
    Fetch { url: String, detail: String },

    /// The resolver was invoked without an asset URL to download.
    #[error("Download failed: {detail}")]
    Download { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_failed_surfaces_remote_message_verbatim() {
        let e = StencilError::JobFailed {
            message: "bad input".into(),
        };
        assert_eq!(e.to_string(), "bad input");
    }

    #[test]
    fn job_timeout_display() {
        let e = StencilError::JobTimeout {
            attempts: 60,
            waited_secs: 120,
        };
        let msg = e.to_string();
        assert!(msg.contains("60 polls"), "got: {msg}");
        assert!(msg.contains("120s"), "got: {msg}");
    }

    #[test]
    fn upload_url_display_carries_detail() {
        let e = StencilError::UploadUrl {
            detail: "HTTP 503 Service Unavailable".into(),
        };
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn fetch_display_names_url() {
        let e = StencilError::Fetch {
            url: "https://out/x.png".into(),
            detail: "connection reset".into(),
        };
        assert!(e.to_string().contains("https://out/x.png"));
        assert!(e.to_string().contains("connection reset"));
    }
}
