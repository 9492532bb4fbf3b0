//! Error types for the AniAPI client.
//!
//! # Design
//! Only pre-flight validation, transport and decoding can fail. A response
//! whose envelope carries a non-200 `status_code` is not an error: it comes
//! back as a `Context` so the caller can branch on it.

use crate::http::TransportError;

/// Errors returned by `AniApiClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more query keys are not accepted by the endpoint. No request
    /// was sent.
    #[error("invalid parameters for {endpoint}: {}", .names.join(", "))]
    InvalidParameters {
        endpoint: &'static str,
        names: Vec<String>,
    },

    /// A count argument was outside `1..=50`. No request was sent.
    #[error("count must be between 1 and 50, got {count}")]
    Range { count: u32 },

    /// The response body was not a JSON object, or a known field had the
    /// wrong type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ApiError>;
