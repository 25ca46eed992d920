//! Error types for the Pushwoosh client.
//!
//! # Design
//! Local validation failures get their own `Precondition` enum so callers can
//! match on the missing field without string comparison. The two variants
//! that come from a completed HTTP exchange (`Http` and `Provider`) carry the
//! decoded envelope, including the raw transport response, so callers can
//! inspect status and message without re-parsing.

use thiserror::Error;

use crate::types::Response;

/// A required input was missing. Raised before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("Application token is required")]
    Application,

    #[error("Device Hardware ID is required")]
    HardwareId,

    #[error("Device Push Token is required")]
    PushToken,

    #[error("Device Type is required")]
    DeviceType,

    #[error("Hash is required")]
    Hash,
}

/// Errors returned by `Client` and the device operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The base URL or the joined request path is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP exchange itself failed (DNS, connect, I/O, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// HTTP 200, but the body is not a valid response envelope.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The transport reported a non-200 status. `response` holds the body's
    /// envelope when it parsed, otherwise the transport status code and line.
    #[error("{status_line}")]
    Http {
        status_line: String,
        response: Box<Response>,
    },

    /// HTTP 200, but the provider's embedded status code is not 200.
    #[error("(Code: {}) {}", .0.status, .0.message)]
    Provider(Box<Response>),
}

impl ApiError {
    /// The envelope attached to `Http` and `Provider` errors.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ApiError::Http { response, .. } | ApiError::Provider(response) => Some(response),
            _ => None,
        }
    }

    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            ApiError::Precondition(p) => Some(*p),
            _ => None,
        }
    }
}
