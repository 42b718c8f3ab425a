//! Upload stage: place the input image in remote storage.
//!
//! Storage keys are `<21-char-id>.<ext>` — the random identifier avoids
//! collisions in the shared bucket, the extension is carried over from the
//! user's file so the storage CDN serves a sensible content type. The
//! returned asset URL is derived deterministically from the key; nothing
//! verifies the asset is actually retrievable there. Success of the PUT is
//! trusted.

use crate::api::EffectsApi;
use crate::config::StencilConfig;
use crate::error::StencilError;
use crate::ident;
use std::sync::Arc;
use tracing::{debug, info};

/// Upload `bytes` under a fresh storage key and return the asset URL.
///
/// 1. Extension from `original_name` (default `jpg` when there is none)
/// 2. `GET /get-emd-upload-url` for a write-once target
/// 3. `PUT` the raw bytes with the matching content type
/// 4. Return `<contents_base>/<key>`
pub async fn upload(
    api: &Arc<dyn EffectsApi>,
    bytes: &[u8],
    original_name: &str,
    config: &StencilConfig,
) -> Result<String, StencilError> {
    let ext = file_extension(original_name);
    let key = format!("{}.{}", ident::generate(ident::STORAGE_KEY_LEN), ext);
    debug!("uploading {} ({} bytes) as {}", original_name, bytes.len(), key);

    let target = api.fetch_upload_target(&key).await?;
    api.put_object(&target, bytes, content_type_for(ext)).await?;

    let url = format!("{}/{}", config.contents_base.trim_end_matches('/'), key);
    info!("uploaded to {}", url);
    Ok(url)
}

/// The extension of `name`, or `jpg` when it has none.
fn file_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "jpg",
    }
}

/// Content type declared on the PUT, from the storage-key extension.
fn content_type_for(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
