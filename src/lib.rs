//! # img2stencil
//!
//! Turn photos into stencil art through the ChromaStudio image-effects API.
//!
//! The service does the heavy lifting remotely; this crate is the client
//! side of the contract: it places the input image in the service's storage,
//! submits a transformation job against it, polls the job to completion, and
//! retrieves the generated asset through a fallback cascade that keeps
//! working even when the storage CDN is being difficult about direct fetches.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Upload    signed-URL fetch + PUT to CDN storage
//!  ├─ 2. Submit    POST the transformation job (no retry)
//!  ├─ 3. Poll      bounded status loop (2 s × 60 by default)
//!  ├─ 4. Extract   result URL from the completed payload
//!  └─ 5. Download  proxy → direct → re-encode → navigation cascade
//! ```
//!
//! One linear chain of suspend points per run — no fan-out, no cancellation,
//! a single current asset at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2stencil::{stencilize_to_file, StencilConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StencilConfig::default();
//!     let output = stencilize_to_file("cat.png", "stencil.png", &config).await?;
//!     println!("{} → {}", output.job_id, output.result_url);
//!     eprintln!("{} polls, {}ms", output.stats.poll_attempts, output.stats.total_ms);
//!     Ok(())
//! }
//! ```
//!
//! For interactive use (select / generate / reset / download as separate user
//! actions, with presentation events) drive a [`Workflow`] directly and
//! inject a [`WorkflowCallback`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2stencil` binary (clap + anyhow + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2stencil = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod ident;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stencilize;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{
    EffectsApi, FetchedAsset, HttpEffectsApi, JobReceipt, JobStatus, ResultItem, ResultPayload,
    StatusResponse, SubmitRequest,
};
pub use config::{StencilConfig, StencilConfigBuilder};
pub use error::StencilError;
pub use output::{
    DownloadPayload, DownloadedAsset, GenerateReport, StageFailure, StencilOutput, StencilStats,
    Strategy,
};
pub use progress::{NoopWorkflowCallback, WorkflowCallback, WorkflowHooks, WorkflowPhase};
pub use stencilize::{stencilize, stencilize_sync, stencilize_to_file};
pub use workflow::{Workflow, WorkflowState};
