//! Reconciler for the `petstore_pet` resource.
//!
//! # Design
//! A pet resource is either `Absent` or `Present` with the attributes last
//! read from the API. Every mutation is followed by a read so the stored
//! state is the server's copy, never the request echo. A read that finds
//! nothing moves the resource to `Absent` instead of failing; that is how
//! out-of-band deletion shows up as drift.
//!
//! `species` is force-new: a change to it is planned as `Replace` (delete,
//! then create) and is never sent as part of an update.

use petstore_sdk::{ApiError, Pet, PetCreateOptions, PetUpdateOptions, Pets};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::schema::{pet_schema, ResourceSchema, RESOURCE_TYPE};

/// Desired attributes of a pet, as configured in the orchestrator.
///
/// Missing fields decode to their zero value; the client's validation then
/// rejects a missing `species` or `age` before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub age: i64,
}

impl PetConfig {
    pub fn from_value(value: serde_json::Value) -> ProviderResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn create_options(&self) -> PetCreateOptions {
        PetCreateOptions {
            name: self.name.clone(),
            species: self.species.clone(),
            age: self.age,
        }
    }
}

/// Observed state of a pet resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "pet", rename_all = "snake_case")]
pub enum ResourceState {
    #[default]
    Absent,
    Present(Pet),
}

impl ResourceState {
    pub fn pet(&self) -> Option<&Pet> {
        match self {
            ResourceState::Present(pet) => Some(pet),
            ResourceState::Absent => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.pet().map(|pet| pet.id.as_str())
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ResourceState::Present(_))
    }
}

/// What `apply` will do to move from the prior state to the desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    NoOp,
    Create,
    Update(PetUpdateOptions),
    Replace { attribute: &'static str },
    Delete,
}

impl Plan {
    pub fn requires_replace(&self) -> bool {
        matches!(self, Plan::Replace { .. })
    }
}

/// Drives the pet client through create/read/update/delete.
#[derive(Debug, Clone)]
pub struct PetResource {
    pets: Pets,
    schema: ResourceSchema,
}

impl PetResource {
    pub fn new(pets: Pets) -> Self {
        Self {
            pets,
            schema: pet_schema(),
        }
    }

    /// Bind every subsequent API call to `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.pets = self.pets.with_cancellation(cancel);
        self
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Compare prior and desired state attribute by attribute.
    pub fn plan(&self, prior: &ResourceState, desired: Option<&PetConfig>) -> Plan {
        let (pet, desired) = match (prior, desired) {
            (ResourceState::Absent, None) => return Plan::NoOp,
            (ResourceState::Absent, Some(_)) => return Plan::Create,
            (ResourceState::Present(_), None) => return Plan::Delete,
            (ResourceState::Present(pet), Some(desired)) => (pet, desired),
        };

        if let Some(attribute) = self.replaced_attribute(pet, desired) {
            return Plan::Replace { attribute };
        }

        let options = changed_attributes(pet, desired);
        if options.is_empty() {
            Plan::NoOp
        } else {
            Plan::Update(options)
        }
    }

    /// Create the pet, then read it back to populate every attribute.
    pub async fn create(&self, desired: &PetConfig) -> ProviderResult<ResourceState> {
        let created = self.pets.create(&desired.create_options()).await?;
        info!(resource = RESOURCE_TYPE, id = %created.id, "created pet");
        self.refresh(&created.id).await
    }

    /// Refresh observed attributes. A pet that no longer exists becomes
    /// `Absent`.
    pub async fn read(&self, prior: &ResourceState) -> ProviderResult<ResourceState> {
        let Some(id) = prior.id() else {
            return Ok(ResourceState::Absent);
        };
        match self.pets.read(id).await {
            Ok(pet) => {
                debug!(resource = RESOURCE_TYPE, id, "read pet");
                Ok(ResourceState::Present(pet))
            }
            Err(ApiError::NotFound) => {
                warn!(resource = RESOURCE_TYPE, id, "pet no longer exists, removing from state");
                Ok(ResourceState::Absent)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Apply in-place changes to `name` and `age`, then read back.
    ///
    /// Fails with `ReplacementRequired` without calling the API if a
    /// force-new attribute differs.
    pub async fn update(&self, prior: &Pet, desired: &PetConfig) -> ProviderResult<ResourceState> {
        if let Some(attribute) = self.replaced_attribute(prior, desired) {
            return Err(ProviderError::ReplacementRequired {
                id: prior.id.clone(),
                attribute,
            });
        }

        let options = changed_attributes(prior, desired);
        if options.is_empty() {
            debug!(resource = RESOURCE_TYPE, id = %prior.id, "no in-place changes");
        } else {
            self.pets.update(&prior.id, &options).await?;
            info!(resource = RESOURCE_TYPE, id = %prior.id, ?options, "updated pet");
        }
        self.refresh(&prior.id).await
    }

    /// Delete the pet. Success always leaves the resource `Absent`.
    pub async fn delete(&self, prior: &ResourceState) -> ProviderResult<ResourceState> {
        if let Some(id) = prior.id() {
            self.pets.delete(id).await?;
            info!(resource = RESOURCE_TYPE, id, "deleted pet");
        }
        Ok(ResourceState::Absent)
    }

    /// Converge `prior` to `desired` (`None` meaning the pet should not
    /// exist) and return the new observed state.
    ///
    /// A replacement validates the desired attributes before deleting the
    /// old pet. `prior` should come from a fresh [`read`](Self::read): a pet
    /// deleted out-of-band makes the replacement's delete fail with
    /// `NotFound`, and nothing is created.
    pub async fn apply(
        &self,
        prior: &ResourceState,
        desired: Option<&PetConfig>,
    ) -> ProviderResult<ResourceState> {
        let plan = self.plan(prior, desired);
        match (plan, prior, desired) {
            (Plan::Create, _, Some(desired)) => self.create(desired).await,
            (Plan::Update(_), ResourceState::Present(pet), Some(desired)) => {
                self.update(pet, desired).await
            }
            (Plan::Replace { attribute }, _, Some(desired)) => {
                desired
                    .create_options()
                    .validate()
                    .map_err(ApiError::from)?;
                info!(resource = RESOURCE_TYPE, id = ?prior.id(), attribute, "replacing pet");
                self.delete(prior).await?;
                self.create(desired).await
            }
            (Plan::Delete, _, _) => self.delete(prior).await,
            _ => self.read(prior).await,
        }
    }

    fn replaced_attribute(&self, prior: &Pet, desired: &PetConfig) -> Option<&'static str> {
        (prior.species != desired.species && self.schema.forces_new("species")).then_some("species")
    }

    async fn refresh(&self, id: &str) -> ProviderResult<ResourceState> {
        let pet = self.pets.read(id).await?;
        Ok(ResourceState::Present(pet))
    }
}

fn changed_attributes(prior: &Pet, desired: &PetConfig) -> PetUpdateOptions {
    PetUpdateOptions {
        name: (prior.name != desired.name).then(|| desired.name.clone()),
        age: (prior.age != desired.age).then_some(desired.age),
    }
}
