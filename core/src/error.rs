//! Error types for the petstore client.
//!
//! # Design
//! `BadRequest`, `NotFound` and `GatewayTimeout` get dedicated variants
//! because callers branch on them: the reconciler turns `NotFound` into an
//! absent resource and the transport retries `GatewayTimeout` once. Any other
//! non-2xx status lands in `Remote` with the server's joined error messages,
//! or the raw status line when the server sent none.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by the petstore client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server returned 400.
    #[error("bad request")]
    BadRequest,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 504, twice.
    #[error("gateway timeout")]
    GatewayTimeout,

    /// Any other non-2xx status.
    #[error("{0}")]
    Remote(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The caller cancelled the request while it was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// The configured address does not form a valid base URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// Only a gateway timeout earns a resend.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::GatewayTimeout)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
