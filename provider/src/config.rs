//! Provider-level configuration supplied by the orchestrator.

use petstore_sdk::client::ADDRESS_ENV;
use petstore_sdk::{Client, Config};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::resource::PetResource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base address of the petstore API. Falls back to `PETSTORE_ADDRESS`.
    #[serde(default)]
    pub address: Option<String>,
}

impl ProviderConfig {
    pub fn from_value(value: serde_json::Value) -> ProviderResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The configured address, or the environment's.
    pub fn address(&self) -> ProviderResult<String> {
        resolve_address(self.address.as_deref(), std::env::var(ADDRESS_ENV).ok())
    }

    pub fn client(&self) -> ProviderResult<Client> {
        let address = self.address()?;
        debug!(%address, "configuring petstore client");
        Ok(Client::new(Config::default().with_address(address))?)
    }

    /// Build the pet reconciler for this configuration.
    pub fn configure(&self) -> ProviderResult<PetResource> {
        let client = self.client()?;
        let resource = PetResource::new(client.pets());
        resource.schema().validate()?;
        Ok(resource)
    }
}

fn resolve_address(configured: Option<&str>, env: Option<String>) -> ProviderResult<String> {
    configured
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .or_else(|| env.filter(|address| !address.trim().is_empty()))
        .ok_or(ProviderError::MissingAddress(ADDRESS_ENV))
}
