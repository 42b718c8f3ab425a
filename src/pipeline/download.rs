//! Download stage: retrieve the result asset through a fallback cascade.
//!
//! The stages run strictly in order, each attempted only after the one
//! before it failed:
//!
//! 1. proxy fetch through the effects API (sidesteps origin restrictions)
//! 2. direct fetch of the raw URL, cache-busted
//! 3. PNG re-encode of result bytes the caller already holds in memory
//! 4. fresh fetch of the URL, then PNG re-encode
//! 5. forced navigation — hand the raw URL back, no bytes, no confirmation
//!
//! Stage failures are recorded as [`StageFailure`] diagnostics on the result
//! and logged, never surfaced individually. Stage 5 cannot fail, so the only
//! error out of [`resolve`] is the guard case: being called with no URL.
//!
//! Filenames are `stencil_art_<8-char-id>.<ext>` with the extension taken
//! from the response content type when present, else sniffed from the URL
//! path, else `png`.

use crate::api::{EffectsApi, FetchedAsset};
use crate::error::StencilError;
use crate::ident;
use crate::output::{DownloadPayload, DownloadedAsset, StageFailure, Strategy};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

static URL_EXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpe?g|png|webp)").expect("valid extension regex")
});

/// Resolve `url` to a downloaded asset via the fallback cascade.
///
/// `cached` is the in-memory copy of the result bytes, when the caller has
/// one from an earlier fetch — it feeds stage 3.
pub async fn resolve(
    api: &Arc<dyn EffectsApi>,
    url: &str,
    cached: Option<&[u8]>,
) -> Result<DownloadedAsset, StencilError> {
    if url.is_empty() {
        return Err(StencilError::Download {
            detail: "no asset URL to download".into(),
        });
    }

    let mut failures: Vec<StageFailure> = Vec::new();

    // Stage 1: proxy fetch.
    match api.proxy_fetch(url).await {
        Ok(asset) => return Ok(fetched(asset, url, Strategy::Proxy, failures)),
        Err(e) => record(&mut failures, Strategy::Proxy, e),
    }

    // Stage 2: direct fetch, cache-busted.
    match api.direct_fetch(url, "t").await {
        Ok(asset) => return Ok(fetched(asset, url, Strategy::Direct, failures)),
        Err(e) => record(&mut failures, Strategy::Direct, e),
    }

    // Stage 3: re-encode bytes already in memory.
    let cached_png = cached
        .ok_or_else(|| {
            StencilError::Internal("no previously fetched copy of the asset in memory".into())
        })
        .and_then(reencode_png);
    match cached_png {
        Ok(png) => return Ok(reencoded(png, Strategy::CachedReencode, failures)),
        Err(e) => record(&mut failures, Strategy::CachedReencode, e),
    }

    // Stage 4: fresh fetch, then re-encode.
    let fetched_png = match api.direct_fetch(url, "crossorigin").await {
        Ok(asset) => reencode_png(&asset.bytes),
        Err(e) => Err(e),
    };
    match fetched_png {
        Ok(png) => return Ok(reencoded(png, Strategy::FetchReencode, failures)),
        Err(e) => record(&mut failures, Strategy::FetchReencode, e),
    }

    // Stage 5: forced navigation. Best effort — the caller opens the URL
    // itself; there is no way to observe whether that works.
    debug!("all byte-yielding stages failed for {}; handing back the raw URL", url);
    Ok(DownloadedAsset {
        file_name: download_file_name("png"),
        payload: DownloadPayload::Navigate {
            url: url.to_string(),
        },
        strategy: Strategy::Navigate,
        failures,
    })
}

fn record(failures: &mut Vec<StageFailure>, strategy: Strategy, error: StencilError) {
    warn!("{} download stage failed: {}", strategy, error);
    failures.push(StageFailure {
        strategy,
        reason: error.to_string(),
    });
}

fn fetched(
    asset: FetchedAsset,
    url: &str,
    strategy: Strategy,
    failures: Vec<StageFailure>,
) -> DownloadedAsset {
    let ext = derive_extension(url, asset.content_type.as_deref());
    DownloadedAsset {
        file_name: download_file_name(&ext),
        payload: DownloadPayload::Bytes(asset.bytes),
        strategy,
        failures,
    }
}

fn reencoded(png: Vec<u8>, strategy: Strategy, failures: Vec<StageFailure>) -> DownloadedAsset {
    DownloadedAsset {
        file_name: download_file_name("png"),
        payload: DownloadPayload::Bytes(png),
        strategy,
        failures,
    }
}

/// `stencil_art_<8-char-id>.<ext>`.
fn download_file_name(ext: &str) -> String {
    format!("stencil_art_{}.{}", ident::generate(ident::DOWNLOAD_TAG_LEN), ext)
}

/// Decode whatever image format `bytes` holds and re-encode it as PNG.
///
/// The canvas-redraw analog: it normalises any fetched asset to a lossless
/// format we can always write out.
fn reencode_png(bytes: &[u8]) -> Result<Vec<u8>, StencilError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| StencilError::Internal(format!("image decode failed: {e}")))?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| StencilError::Internal(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

/// Pick a file extension: content type first (jpeg/jpg, png, webp in that
/// priority), then a suffix sniffed from the URL path, then `png`.
fn derive_extension(url: &str, content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if ct.contains("jpeg") || ct.contains("jpg") {
            return "jpg".into();
        }
        if ct.contains("png") {
            return "png".into();
        }
        if ct.contains("webp") {
            return "webp".into();
        }
    }
    URL_EXT_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase().replace("jpeg", "jpg"))
        .unwrap_or_else(|| "png".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn extension_from_content_type() {
        assert_eq!(derive_extension("https://x/a", Some("image/png")), "png");
        assert_eq!(derive_extension("https://x/a", Some("image/jpeg")), "jpg");
        assert_eq!(derive_extension("https://x/a", Some("image/webp")), "webp");
    }

    #[test]
    fn content_type_outranks_url_suffix() {
        assert_eq!(
            derive_extension("https://x/a.webp", Some("image/jpeg")),
            "jpg"
        );
    }

    #[test]
    fn extension_sniffed_from_url() {
        assert_eq!(derive_extension("https://x/photo.JPG", None), "jpg");
        assert_eq!(derive_extension("https://x/photo.jpeg?w=2", None), "jpg");
        assert_eq!(derive_extension("https://x/a.webp", None), "webp");
    }

    #[test]
    fn unmatched_content_type_falls_back_to_url() {
        assert_eq!(
            derive_extension("https://x/a.png", Some("application/octet-stream")),
            "png"
        );
    }

    #[test]
    fn extension_defaults_to_png() {
        assert_eq!(derive_extension("https://x/asset", None), "png");
        assert_eq!(derive_extension("https://x/asset.gif", None), "png");
    }

    #[test]
    fn file_name_shape() {
        let name = download_file_name("webp");
        let tag = name
            .strip_prefix("stencil_art_")
            .and_then(|s| s.strip_suffix(".webp"))
            .expect("stencil_art_<tag>.webp");
        assert_eq!(tag.len(), 8);
        assert!(tag.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn reencode_produces_png() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 128, 255, 255]));
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let png = reencode_png(&jpeg).expect("re-encode should succeed");
        assert_eq!(&png[..4], b"\x89PNG".as_slice());
    }

    #[test]
    fn reencode_rejects_garbage() {
        assert!(reencode_png(b"definitely not an image").is_err());
    }
}
