//! One-shot entry points: run the whole chain against a local file.
//!
//! These are the convenience APIs for callers that don't need the
//! interactive [`crate::workflow::Workflow`] surface — read the file, upload,
//! generate, download, done. The workflow's guarded actions are driven in
//! order; every suspend point belongs to exactly one stage, so the per-stage
//! timings in [`StencilStats`] add up to the wall clock.

use crate::config::StencilConfig;
use crate::error::StencilError;
use crate::output::{DownloadPayload, StencilOutput, StencilStats};
use crate::workflow::Workflow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the full upload → submit → poll → download chain for one image file.
///
/// # Errors
/// Any stage failure aborts the run with the corresponding
/// [`StencilError`] variant; nothing is retried beyond the poll loop's own
/// attempt budget.
pub async fn stencilize(
    input: impl AsRef<Path>,
    config: &StencilConfig,
) -> Result<StencilOutput, StencilError> {
    let total_start = Instant::now();
    let path = input.as_ref();
    info!("starting stencil run: {}", path.display());

    let bytes = read_input(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.jpg");

    let mut workflow = Workflow::new(config.clone())?;

    // ── Stage 1: upload ──────────────────────────────────────────────────
    let upload_start = Instant::now();
    let uploaded = workflow
        .select_file(&bytes, file_name)
        .await?
        .ok_or_else(|| StencilError::Internal("workflow refused the upload".into()))?;
    let upload_ms = upload_start.elapsed().as_millis() as u64;
    debug!("input asset: {}", uploaded);

    // ── Stage 2+3: submit and poll ───────────────────────────────────────
    let generate_start = Instant::now();
    let report = workflow
        .generate()
        .await?
        .ok_or_else(|| StencilError::Internal("workflow refused the generate".into()))?;
    let generate_ms = generate_start.elapsed().as_millis() as u64;

    // ── Stage 4: download ────────────────────────────────────────────────
    let download_start = Instant::now();
    let asset = workflow
        .download()
        .await?
        .ok_or_else(|| StencilError::Internal("workflow refused the download".into()))?;
    let download_ms = download_start.elapsed().as_millis() as u64;

    let stats = StencilStats {
        upload_ms,
        generate_ms,
        download_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        poll_attempts: report.poll_attempts,
    };

    info!(
        "run complete: job {} in {} polls, {}ms total via {}",
        report.job_id, stats.poll_attempts, stats.total_ms, asset.strategy
    );

    Ok(StencilOutput {
        job_id: report.job_id,
        result_url: report.result_url,
        file_name: asset.file_name,
        strategy: asset.strategy,
        download_failures: asset.failures,
        payload: asset.payload,
        stats,
    })
}

/// Like [`stencilize`], writing the downloaded bytes to `output_path`.
///
/// The write is atomic (temp file + rename) so a crash never leaves a
/// partial image behind. When the cascade ends in the navigate stage there
/// are no bytes to write; the hand-off URL stays in the returned output and
/// a warning is logged.
pub async fn stencilize_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &StencilConfig,
) -> Result<StencilOutput, StencilError> {
    let output = stencilize(input, config).await?;
    let path = output_path.as_ref();

    match output.payload {
        DownloadPayload::Bytes(ref bytes) => {
            write_atomic(path, bytes).await?;
            info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        DownloadPayload::Navigate { ref url } => {
            warn!(
                "no bytes in hand ({} stage); open {} to download manually",
                output.strategy, url
            );
        }
    }

    Ok(output)
}

/// Synchronous wrapper around [`stencilize`].
///
/// Creates a temporary tokio runtime internally.
pub fn stencilize_sync(
    input: impl AsRef<Path>,
    config: &StencilConfig,
) -> Result<StencilOutput, StencilError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StencilError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(stencilize(input, config))
}

async fn read_input(path: &Path) -> Result<Vec<u8>, StencilError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(StencilError::PermissionDenied {
            path: path.to_path_buf(),
        }),
        Err(_) => Err(StencilError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StencilError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StencilError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| StencilError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| StencilError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_file_is_reported() {
        let err = stencilize("/no/such/image.png", &StencilConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StencilError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_atomic(&path, b"pngbytes").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"pngbytes");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temp file should have been renamed away");
    }
}
