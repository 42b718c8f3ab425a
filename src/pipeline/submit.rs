//! Submission stage: one POST describing the transformation job.
//!
//! This stage is deliberately thin — the whole profile (effect, owner,
//! watermark and privacy flags) lives in [`crate::config::StencilConfig`].
//! A submission is never retried: if it fails, the run is over and the
//! caller decides whether to start a new one.

use crate::api::{EffectsApi, JobReceipt, SubmitRequest};
use crate::config::StencilConfig;
use crate::error::StencilError;
use std::sync::Arc;
use tracing::info;

/// Submit a transformation job against an uploaded asset.
pub async fn submit(
    api: &Arc<dyn EffectsApi>,
    asset_url: &str,
    config: &StencilConfig,
) -> Result<JobReceipt, StencilError> {
    let request = SubmitRequest {
        model: config.model.clone(),
        tool_type: config.tool_type.clone(),
        effect_id: config.effect_id.clone(),
        image_url: asset_url.to_string(),
        user_id: config.user_id.clone(),
        remove_watermark: config.remove_watermark,
        is_private: config.is_private,
    };

    let receipt = api.submit_job(&request).await?;
    info!("job submitted: {} status {:?}", receipt.job_id, receipt.status);
    Ok(receipt)
}
