//! Attribute schema of the `petstore_pet` resource.
//!
//! The reconciler consults the schema to decide which attribute changes can
//! be applied in place and which force a new pet.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{ProviderError, ProviderResult};

pub const RESOURCE_TYPE: &str = "petstore_pet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int,
}

/// One attribute of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub required: bool,
    pub computed: bool,
    pub force_new: bool,
    pub default: Option<Value>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            kind,
            required: false,
            computed: false,
            force_new: false,
            default: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn forces_new(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.force_new)
    }

    /// Structural checks: unique names, a force-new attribute must be
    /// user-settable and either required or defaulted, a computed attribute
    /// cannot also be required, and a default only makes sense on an
    /// optional attribute.
    pub fn validate(&self) -> ProviderResult<()> {
        let mut seen = HashSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.name) {
                return Err(ProviderError::Schema(format!(
                    "attribute {} is declared twice",
                    attr.name
                )));
            }
            if attr.computed && attr.required {
                return Err(ProviderError::Schema(format!(
                    "attribute {} cannot be both computed and required",
                    attr.name
                )));
            }
            if attr.force_new && attr.computed {
                return Err(ProviderError::Schema(format!(
                    "attribute {} is computed and cannot force replacement",
                    attr.name
                )));
            }
            if attr.force_new && !attr.required && attr.default.is_none() {
                return Err(ProviderError::Schema(format!(
                    "force-new attribute {} must be required or have a default",
                    attr.name
                )));
            }
            if attr.required && attr.default.is_some() {
                return Err(ProviderError::Schema(format!(
                    "required attribute {} cannot have a default",
                    attr.name
                )));
            }
        }
        Ok(())
    }
}

/// Schema of the pet resource: `id` computed, `name` optional defaulting to
/// `""`, `species` required and force-new, `age` required.
pub fn pet_schema() -> ResourceSchema {
    ResourceSchema {
        attributes: vec![
            Attribute::new("id", AttributeType::String).computed(),
            Attribute::new("name", AttributeType::String).default_value(""),
            Attribute::new("species", AttributeType::String)
                .required()
                .force_new(),
            Attribute::new("age", AttributeType::Int).required(),
        ],
    }
}
