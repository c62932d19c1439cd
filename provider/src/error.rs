//! Errors reported to the orchestrator.
//!
//! Client errors pass through untouched so the orchestrator shows the API's
//! message verbatim.

use petstore_sdk::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Neither the configuration nor the environment named an address.
    #[error("address is required: set it in the provider configuration or via {0}")]
    MissingAddress(&'static str),

    /// An in-place update was asked to change a force-new attribute.
    #[error("changing {attribute} of pet {id} requires replacement")]
    ReplacementRequired { id: String, attribute: &'static str },

    /// The resource configuration could not be decoded.
    #[error("invalid resource configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("invalid schema: {0}")]
    Schema(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Api(err) if err.is_not_found())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
