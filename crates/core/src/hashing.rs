//! SHA-256 content digests.
//!
//! Uploads and results are fingerprinted so the page can tell whether the
//! bytes it downloaded are the bytes the server reported, and so downloads can
//! carry a strong `ETag`.

use sha2::{Digest, Sha256};

/// Compute a lowercase SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Format a digest as a quoted strong entity tag.
pub fn etag_for(data: &[u8]) -> String {
    format!("\"{}\"", sha256_hex(data))
}
