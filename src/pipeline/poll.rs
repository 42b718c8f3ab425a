//! Poll stage: bounded status loop until the job reaches a terminal state.
//!
//! The loop is a small state machine over the remote status vocabulary:
//! `completed` returns the payload, `failed`/`error` raises with the remote
//! message, anything else counts as "still working" and waits out the poll
//! interval. The wait is a passive `tokio::time::sleep` — the runtime is free
//! for other work between attempts.
//!
//! Transport failures on a status query abort the loop immediately; the
//! attempt budget only covers responses that actually arrived.

use crate::api::{EffectsApi, JobStatus, StatusResponse};
use crate::config::StencilConfig;
use crate::error::StencilError;
use crate::progress::WorkflowPhase;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// A completed poll: the terminal payload and how many queries it took.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub response: StatusResponse,
    /// Status queries issued, including the one that returned `completed`.
    pub attempts: u32,
}

/// Poll the job until completion, failure, or attempt-budget exhaustion.
///
/// Fires `Processing { attempt }` through the configured hooks after each
/// non-terminal response, before the inter-attempt sleep.
pub async fn poll(
    api: &Arc<dyn EffectsApi>,
    job_id: &str,
    config: &StencilConfig,
) -> Result<PollOutcome, StencilError> {
    let interval = Duration::from_millis(config.poll_interval_ms);

    for attempt in 1..=config.max_polls {
        let response = api.job_status(&config.user_id, job_id).await?;
        debug!("poll {} - status {:?}", attempt, response.status);

        if response.status == JobStatus::Completed {
            info!("job {} completed after {} polls", job_id, attempt);
            return Ok(PollOutcome { response, attempts: attempt });
        }

        if response.status.is_failure() {
            return Err(StencilError::JobFailed {
                message: response
                    .error
                    .unwrap_or_else(|| "Job processing failed".to_string()),
            });
        }

        if let Some(ref cb) = config.hooks {
            cb.on_phase(&WorkflowPhase::Processing { attempt });
        }
        sleep(interval).await;
    }

    Err(StencilError::JobTimeout {
        attempts: config.max_polls,
        waited_secs: u64::from(config.max_polls) * config.poll_interval_ms / 1000,
    })
}
