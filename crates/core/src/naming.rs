//! File naming conventions shared with the external upscaler.
//!
//! The upscaler never tells us where it wrote its output. Instead both sides
//! agree on a convention: the result for an upload named `<base>.<ext>` is
//! written as `<base>.png`, whatever the upload's own extension was.

use std::path::Path;

use crate::error::CoreError;

/// Extensions accepted by the upload control (compared case-insensitively).
pub const SUPPORTED_UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extension the upscaler is expected to write its result with.
pub const RESULT_EXTENSION: &str = "png";

/// Prefix added to the file name offered for download.
pub const DOWNLOAD_PREFIX: &str = "upscaled_";

/// Reduce a client-supplied file name to a single safe path component.
///
/// Only the final component survives (`/` and `\` are both treated as
/// separators), so `../../evil.png` becomes `evil.png`. Empty names, `.`,
/// `..` and names containing control characters are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String, CoreError> {
    let last = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        return Err(CoreError::Validation(format!(
            "Invalid file name '{raw}'"
        )));
    }

    if last.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "File name must not contain control characters".into(),
        ));
    }

    Ok(last.to_string())
}

/// Lowercased extension of `name`, if it has one.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// File name with its final extension removed (`archive.tar.gz` -> `archive.tar`).
///
/// Dot-files without a further extension are returned unchanged.
pub fn base_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}

/// Sanitize an upload name and check its extension against
/// [`SUPPORTED_UPLOAD_EXTENSIONS`].
pub fn validate_upload_name(raw: &str) -> Result<String, CoreError> {
    let name = sanitize_file_name(raw)?;

    match extension(&name) {
        Some(ext) if SUPPORTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) => Ok(name),
        Some(ext) => Err(CoreError::Validation(format!(
            "Unsupported image format '.{ext}'. Supported: .jpg, .jpeg, .png"
        ))),
        None => Err(CoreError::Validation(format!(
            "File name '{name}' has no extension. Supported: .jpg, .jpeg, .png"
        ))),
    }
}

/// Name of the file the upscaler is expected to produce for `upload_name`.
///
/// ```
/// use upscale_core::naming::result_file_name;
///
/// assert_eq!(result_file_name("cat.jpg"), "cat.png");
/// assert_eq!(result_file_name("cat.png"), "cat.png");
/// ```
pub fn result_file_name(upload_name: &str) -> String {
    format!("{}.{RESULT_EXTENSION}", base_name(upload_name))
}

/// Name offered to the browser when the result is downloaded.
///
/// The bytes are always PNG, so the extension is always `.png` regardless of
/// what was uploaded.
pub fn download_file_name(upload_name: &str) -> String {
    format!("{DOWNLOAD_PREFIX}{}", result_file_name(upload_name))
}
