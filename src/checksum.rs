//! Content digests for change detection.

use sha2::{Digest, Sha256};

/// Compute the upper-case hex SHA-256 digest of a file's bytes.
///
/// Equal digests mean a reload would write nothing new.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode_upper(hasher.finalize())
}
