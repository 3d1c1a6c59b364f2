//! Deferred resource outputs

use crate::error::{FleetformError, Result};
use crate::resource::{PropertyMap, ResourceType, Urn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;

/// A resource after the runtime has provisioned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub urn: Urn,
    pub id: String,
    pub resource_type: ResourceType,
    pub outputs: PropertyMap,
}

/// Resolved resources indexed by URN
#[derive(Debug, Clone, Default)]
pub struct ResolvedResources {
    resources: HashMap<Urn, ResolvedResource>,
}

impl ResolvedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResolvedResource) {
        self.resources.insert(resource.urn.clone(), resource);
    }

    pub fn get(&self, urn: &Urn) -> Option<&ResolvedResource> {
        self.resources.get(urn)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up one output property; `id` resolves to the resource id
    pub fn property(&self, urn: &Urn, property: &str) -> Result<serde_json::Value> {
        let unresolved = || FleetformError::UnresolvedOutput {
            urn: urn.to_string(),
            property: property.to_string(),
        };
        let resource = self.get(urn).ok_or_else(unresolved)?;
        if property == "id" {
            return Ok(serde_json::Value::String(resource.id.clone()));
        }
        resource.outputs.get(property).cloned().ok_or_else(unresolved)
    }
}

impl FromIterator<ResolvedResource> for ResolvedResources {
    fn from_iter<I: IntoIterator<Item = ResolvedResource>>(iter: I) -> Self {
        let mut resolved = Self::new();
        for resource in iter {
            resolved.insert(resource);
        }
        resolved
    }
}

/// Typed handle to a property that is only known once the runtime has
/// resolved the owning resource
#[derive(Debug)]
pub struct Output<T> {
    urn: Urn,
    property: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            urn: self.urn.clone(),
            property: self.property.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Output<T> {
    pub(crate) fn new(urn: Urn, property: impl Into<String>) -> Self {
        Self {
            urn,
            property: property.into(),
            _marker: PhantomData,
        }
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl<T: DeserializeOwned> Output<T> {
    pub fn resolve(&self, resources: &ResolvedResources) -> Result<T> {
        let value = resources.property(&self.urn, &self.property)?;
        Ok(serde_json::from_value(value)?)
    }
}
