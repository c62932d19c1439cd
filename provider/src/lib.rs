//! Reconciler for `petstore_pet` resources.
//!
//! # Overview
//! The orchestrator hands over provider configuration plus prior and desired
//! resource state; this crate turns that into calls on the petstore client
//! and reports the state observed afterwards.
//!
//! # Design
//! - `ProviderConfig` resolves the API address and builds a `PetResource`.
//! - `PetResource` plans attribute-level changes and applies them, reading
//!   the pet back after every mutation.
//! - Client errors pass through unchanged; only a `NotFound` on read is
//!   absorbed, as the transition to `Absent`.

pub mod config;
pub mod error;
pub mod logging;
pub mod resource;
pub mod schema;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use logging::{init_logging, try_init_logging};
pub use resource::{PetConfig, PetResource, Plan, ResourceState};
pub use schema::{pet_schema, ResourceSchema, RESOURCE_TYPE};
