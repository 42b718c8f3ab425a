//! The workflow controller: explicit state, four user actions.
//!
//! [`Workflow`] owns everything that was ambient page state in the product
//! this client fronts: the single current asset reference, the in-memory
//! copy of the last result bytes (feeding the download cascade's re-encode
//! stage), and a run-in-flight guard. Presentation is reached only through
//! the injected [`crate::progress::WorkflowCallback`] hooks, so the
//! controller is fully testable without any rendering environment.
//!
//! The asset reference is overwritten only on confirmed success — a failed
//! run leaves the previous reference intact, which is what makes the `Error`
//! state recoverable: the user simply retries.
//!
//! At most one action runs at a time. The guard makes overlapping triggers
//! explicit no-ops (`Ok(None)`) rather than silent races; `reset` clears it,
//! which is also the escape hatch if a run's future was dropped mid-await.

use crate::api::{EffectsApi, HttpEffectsApi, StatusResponse};
use crate::config::StencilConfig;
use crate::error::StencilError;
use crate::output::{DownloadPayload, DownloadedAsset, GenerateReport};
use crate::pipeline::{download, poll, submit, upload};
use crate::progress::WorkflowPhase;
use std::sync::Arc;
use tracing::debug;

/// Where a workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// No asset selected yet (or reset).
    Idle,
    /// An input asset is uploaded; generate may run.
    Ready,
    /// An upload or generate chain is in flight.
    Running,
    /// The last generate produced an output asset.
    Complete,
    /// The last action failed; recoverable by retrying.
    Error,
}

/// A single-user, single-asset workflow over the effects service.
pub struct Workflow {
    config: StencilConfig,
    api: Arc<dyn EffectsApi>,
    state: WorkflowState,
    /// The one current asset: last uploaded input, superseded by the last
    /// generated output.
    current_asset: Option<String>,
    /// In-memory copy of the result bytes, for the cascade's re-encode stage.
    result_bytes: Option<Vec<u8>>,
    in_flight: bool,
}

impl Workflow {
    /// Build a workflow, resolving the API transport from the config
    /// (a pre-injected [`EffectsApi`] wins over `api_base`).
    pub fn new(config: StencilConfig) -> Result<Self, StencilError> {
        let api = resolve_api(&config)?;
        Ok(Self {
            config,
            api,
            state: WorkflowState::Idle,
            current_asset: None,
            result_bytes: None,
            in_flight: false,
        })
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The current asset reference: the uploaded input, or the generated
    /// output once a run completed.
    pub fn current_asset(&self) -> Option<&str> {
        self.current_asset.as_deref()
    }

    /// Seed the re-encode download stage with result bytes a presentation
    /// layer already fetched for display.
    pub fn cache_result_bytes(&mut self, bytes: Vec<u8>) {
        self.result_bytes = Some(bytes);
    }

    /// Upload a newly selected file and make it the current asset.
    ///
    /// Returns `Ok(None)` when another action is in flight. On failure the
    /// previous asset (if any) is kept and the workflow enters `Error`.
    pub async fn select_file(
        &mut self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<Option<String>, StencilError> {
        if self.in_flight {
            debug!("select_file ignored: action in flight");
            return Ok(None);
        }
        self.in_flight = true;
        self.busy(true);
        self.phase(WorkflowPhase::Uploading);

        let outcome = upload::upload(&self.api, bytes, file_name, &self.config).await;
        self.in_flight = false;

        match outcome {
            Ok(url) => {
                self.current_asset = Some(url.clone());
                self.result_bytes = None;
                if let Some(ref cb) = self.config.hooks {
                    cb.on_preview(&url);
                    cb.on_phase(&WorkflowPhase::Ready);
                    cb.on_busy(false);
                }
                self.state = WorkflowState::Ready;
                Ok(Some(url))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run the submit → poll → extract chain against the current asset.
    ///
    /// A no-op (`Ok(None)`) without a current asset or while another action
    /// is in flight. On success the output URL supersedes the current asset,
    /// so a further generate re-runs the effect on the output.
    pub async fn generate(&mut self) -> Result<Option<GenerateReport>, StencilError> {
        let Some(asset) = self.current_asset.clone() else {
            debug!("generate ignored: no current asset");
            return Ok(None);
        };
        if self.in_flight {
            debug!("generate ignored: action in flight");
            return Ok(None);
        }
        self.in_flight = true;
        self.state = WorkflowState::Running;
        self.busy(true);
        self.phase(WorkflowPhase::Submitting);

        let outcome = self.run_generate(&asset).await;
        self.in_flight = false;

        match outcome {
            Ok(report) => {
                self.current_asset = Some(report.result_url.clone());
                self.result_bytes = None;
                if let Some(ref cb) = self.config.hooks {
                    cb.on_result(&report.result_url);
                    cb.on_phase(&WorkflowPhase::Complete);
                    cb.on_busy(false);
                    cb.on_download_ready(&report.result_url);
                }
                self.state = WorkflowState::Complete;
                Ok(Some(report))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Discard the current asset and return to the initial state.
    pub fn reset(&mut self) {
        self.current_asset = None;
        self.result_bytes = None;
        self.in_flight = false;
        self.state = WorkflowState::Idle;
        if let Some(ref cb) = self.config.hooks {
            cb.on_reset();
            cb.on_busy(false);
        }
    }

    /// Retrieve the current asset through the download cascade.
    ///
    /// Returns `Ok(None)` while another action is in flight (the
    /// disabled-control analog); errs with [`StencilError::Download`] when
    /// there is no asset to download.
    pub async fn download(&mut self) -> Result<Option<DownloadedAsset>, StencilError> {
        let Some(url) = self.current_asset.clone() else {
            return Err(StencilError::Download {
                detail: "no asset has been uploaded or generated yet".into(),
            });
        };
        if self.in_flight {
            debug!("download ignored: action in flight");
            return Ok(None);
        }
        self.in_flight = true;

        let outcome = download::resolve(&self.api, &url, self.result_bytes.as_deref()).await;
        self.in_flight = false;

        match outcome {
            Ok(asset) => {
                if let DownloadPayload::Bytes(ref bytes) = asset.payload {
                    self.result_bytes = Some(bytes.clone());
                }
                Ok(Some(asset))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_generate(&self, asset: &str) -> Result<GenerateReport, StencilError> {
        let receipt = submit::submit(&self.api, asset, &self.config).await?;
        self.phase(WorkflowPhase::Processing { attempt: 0 });
        let outcome = poll::poll(&self.api, &receipt.job_id, &self.config).await?;
        let result_url = extract_result_url(&outcome.response)?;
        debug!("result URL: {}", result_url);
        Ok(GenerateReport {
            job_id: receipt.job_id,
            result_url,
            poll_attempts: outcome.attempts,
        })
    }

    /// Error boundary: surface the message, enter `Error`, hand the error on.
    fn fail(&mut self, e: StencilError) -> StencilError {
        if let Some(ref cb) = self.config.hooks {
            cb.on_busy(false);
            cb.on_phase(&WorkflowPhase::Error);
            cb.on_error(&e.to_string());
        }
        self.state = WorkflowState::Error;
        e
    }

    fn busy(&self, busy: bool) {
        if let Some(ref cb) = self.config.hooks {
            cb.on_busy(busy);
        }
    }

    fn phase(&self, phase: WorkflowPhase) {
        if let Some(ref cb) = self.config.hooks {
            cb.on_phase(&phase);
        }
    }
}

fn resolve_api(config: &StencilConfig) -> Result<Arc<dyn EffectsApi>, StencilError> {
    if let Some(ref api) = config.api {
        return Ok(Arc::clone(api));
    }
    Ok(Arc::new(HttpEffectsApi::new(config)?))
}

/// Pull the media URL out of a completed payload: single object or first
/// list element, `mediaUrl` or `image` field.
fn extract_result_url(response: &StatusResponse) -> Result<String, StencilError> {
    response
        .result
        .as_ref()
        .and_then(|payload| payload.first())
        .and_then(|item| item.url())
        .map(str::to_owned)
        .ok_or(StencilError::NoResultUrl)
}
