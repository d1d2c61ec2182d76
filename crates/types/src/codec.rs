//! Canonical serialization for world-state storage.
//!
//! Every stored value goes through [`encode`]/[`decode`] so that independent
//! execution nodes computing the same update produce byte-identical output.
//! Canonical form is JSON with all object keys sorted recursively; arrays
//! keep their semantic order. This relies on `serde_json`'s default
//! BTreeMap-backed object representation — the `preserve_order` feature must
//! stay disabled, or byte stability breaks.

use serde::{Serialize, de::DeserializeOwned};
use snafu::Snafu;

/// Error type for codec operations.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Encoding failed.
    #[snafu(display("encoding failed: {source}"))]
    Encode {
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// Decoding failed. Never silently coerced.
    #[snafu(display("decoding failed: {source}"))]
    Decode {
        /// The underlying deserialization error.
        source: serde_json::Error,
    },
}

/// Encodes a value to canonical key-sorted JSON bytes.
///
/// The value is first converted to a `serde_json::Value` so that object keys
/// are held in sorted order regardless of struct field declaration order,
/// then serialized compactly. Identical field values yield identical bytes.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let canonical = serde_json::to_value(value).map_err(|source| CodecError::Encode { source })?;
    serde_json::to_vec(&canonical).map_err(|source| CodecError::Encode { source })
}

/// Decodes canonical JSON bytes back to a value.
///
/// # Errors
///
/// Returns `CodecError::Decode` if the bytes are not valid JSON or do not
/// match the target shape.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode { source })
}
