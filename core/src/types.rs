//! Domain DTOs for the petstore API.
//!
//! # Design
//! Pets travel as named-field JSON objects. The server may send `id` as a
//! string or a number; it is always held as a string so identity stays
//! opaque to callers. `species` is absent from [`PetUpdateOptions`] because
//! it cannot change in place.

use serde::{Deserialize, Deserializer, Serialize};

use crate::validation::{valid_int, valid_string, ValidationError};

/// A pet as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub species: String,
    pub age: i64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Payload for creating a pet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetCreateOptions {
    #[serde(default)]
    pub name: String,
    pub species: String,
    pub age: i64,
}

impl PetCreateOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !valid_string(&self.species) {
            return Err(ValidationError::Missing("species"));
        }
        if !valid_int(self.age) {
            return Err(ValidationError::NotPositive("age"));
        }
        Ok(())
    }
}

/// Sparse payload for updating a pet. Only fields that are `Some` go on the
/// wire; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl PetUpdateOptions {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.age {
            Some(age) if !valid_int(age) => Err(ValidationError::NotPositive("age")),
            _ => Ok(()),
        }
    }
}

/// Query string addressing a single pet.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct PetQuery<'a> {
    pub id: &'a str,
}
