//! Validated CRUD over the `pets` collection.
//!
//! Pets are addressed with the `id` query parameter: `GET`, `PATCH` and
//! `DELETE` all go to `pets?id=<id>`. Every verb validates its input before
//! building a request, so a rejected call never reaches the sender.

use tokio_util::sync::CancellationToken;

use crate::client::{parse_json, Client};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;
use crate::types::{Pet, PetCreateOptions, PetQuery, PetUpdateOptions};
use crate::validation::require_id;

const COLLECTION: &str = "pets";

/// Pet operations bound to a client and a cancellation token.
#[derive(Debug, Clone)]
pub struct Pets {
    client: Client,
    path: &'static str,
    cancel: CancellationToken,
}

impl Pets {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            path: COLLECTION,
            cancel: CancellationToken::new(),
        }
    }

    /// Bind subsequent calls to `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create a new pet with the given options.
    pub async fn create(&self, options: &PetCreateOptions) -> ApiResult<Pet> {
        options.validate()?;
        let req = self
            .client
            .new_request(HttpMethod::Post, self.path, Some(options))?;
        self.client.execute_json(&req, &self.cancel).await
    }

    /// Read a pet by id.
    pub async fn read(&self, id: &str) -> ApiResult<Pet> {
        require_id(id)?;
        let req = self
            .client
            .new_request(HttpMethod::Get, self.path, Some(&PetQuery { id }))?;
        self.client.execute_json(&req, &self.cancel).await
    }

    /// Update the populated attributes of an existing pet.
    ///
    /// Returns the updated pet when the server echoes it, `None` when it
    /// answers without a body (`204 No Content`).
    pub async fn update(&self, id: &str, options: &PetUpdateOptions) -> ApiResult<Option<Pet>> {
        require_id(id)?;
        options.validate()?;
        let path = self.addressed(id)?;
        let req = self
            .client
            .new_request(HttpMethod::Patch, &path, Some(options))?;
        let response = self.client.execute(&req, &self.cancel).await?;
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        parse_json(&response).map(Some)
    }

    /// Delete a pet by id. A pet that is already gone surfaces as `NotFound`.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id)?;
        let req = self
            .client
            .new_request(HttpMethod::Delete, self.path, Some(&PetQuery { id }))?;
        self.client.execute(&req, &self.cancel).await?;
        Ok(())
    }

    /// Collection path with the id query baked in, for write-style verbs
    /// whose payload goes to the body.
    fn addressed(&self, id: &str) -> ApiResult<String> {
        let query = serde_urlencoded::to_string(PetQuery { id })
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(format!("{}?{query}", self.path))
    }
}
