//! Content digests over response sets.
//!
//! A results summary is keyed by the digest of the responses it was computed
//! from; any change to the recorded responses changes the digest and marks
//! the summary stale.

use sha2::{Digest, Sha256};

use super::error::Result;
use super::response::Response;

/// SHA256 hex digest of compact JSON with object keys in sorted order.
///
/// `serde_json::Map` is ordered by key, so round-tripping through `Value`
/// gives a canonical key order.
pub fn compute_digest<T: serde::Serialize>(value: &T) -> Result<String> {
    let canonical = serde_json::to_string(&serde_json::to_value(value)?)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Order-insensitive digest of a response set.
pub fn responses_digest(responses: &[Response]) -> Result<String> {
    let mut sorted: Vec<&Response> = responses.iter().collect();
    sorted.sort_by(|a, b| a.task_id.cmp(&b.task_id));
    compute_digest(&sorted)
}
