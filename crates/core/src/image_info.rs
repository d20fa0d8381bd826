//! Decoding check for upscaled results.
//!
//! The upscaler is trusted to write *a* file at the agreed path, not
//! necessarily a valid image. Before a result is reported as ready it is
//! fully decoded here, so a truncated or mislabelled file surfaces as a
//! decode failure rather than a broken image in the browser.

use image::ImageFormat;
use serde::Serialize;

/// Format and dimensions of a successfully decoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Detected container format, as its usual extension (`png`, `jpg`, `webp`).
    pub format: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to decode image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// Fully decode `bytes` and report what they contain.
///
/// This is CPU-bound; async callers should run it on the blocking pool.
pub fn inspect(bytes: &[u8]) -> Result<ImageInfo, DecodeError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;

    Ok(ImageInfo {
        format: format_name(format),
        width: decoded.width(),
        height: decoded.height(),
    })
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| (*ext).to_string())
        .unwrap_or_else(|| format!("{format:?}").to_lowercase())
}
