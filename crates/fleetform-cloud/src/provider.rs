//! Resource provider trait definition

use crate::error::{CheckFailure, CloudError, Result};
use async_trait::async_trait;
use fleetform_core::{PropertyMap, ResourceType};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Resource provider abstraction trait
///
/// A provider owns one package (e.g. "random") and performs the CRUD
/// operations for every resource type in it.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Returns the package name (e.g., "random")
    fn name(&self) -> &str;

    /// Returns the provider version
    fn version(&self) -> &str;

    /// Validate and normalize inputs before planning
    async fn check(&self, resource_type: &ResourceType, inputs: &PropertyMap)
    -> Result<CheckResult>;

    /// Compare old and new inputs of an existing resource
    async fn diff(
        &self,
        _resource_type: &ResourceType,
        _id: &str,
        olds: &PropertyMap,
        news: &PropertyMap,
    ) -> Result<DiffResult> {
        Ok(DiffResult::update(changed_keys(olds, news)))
    }

    /// Provision a new resource
    async fn create(&self, resource_type: &ResourceType, inputs: &PropertyMap)
    -> Result<CreateResult>;

    /// Read the live outputs of a resource; `None` means it no longer exists
    async fn read(
        &self,
        _resource_type: &ResourceType,
        _id: &str,
        outputs: &PropertyMap,
    ) -> Result<Option<PropertyMap>> {
        Ok(Some(outputs.clone()))
    }

    /// Update a resource in place
    async fn update(
        &self,
        resource_type: &ResourceType,
        _id: &str,
        _olds: &PropertyMap,
        _news: &PropertyMap,
    ) -> Result<PropertyMap> {
        Err(CloudError::Unsupported(format!("update {}", resource_type)))
    }

    /// Delete a resource
    async fn delete(&self, resource_type: &ResourceType, id: &str, outputs: &PropertyMap)
    -> Result<()>;
}

/// Checked inputs plus any validation failures
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub inputs: PropertyMap,
    pub failures: Vec<CheckFailure>,
}

impl CheckResult {
    pub fn ok(inputs: PropertyMap) -> Self {
        Self {
            inputs,
            failures: Vec::new(),
        }
    }

    pub fn fail(&mut self, property: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(CheckFailure {
            property: property.into(),
            reason: reason.into(),
        });
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of comparing old and new inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Properties whose value changed
    pub changes: Vec<String>,

    /// Changed properties that force a replacement
    pub replace_keys: Vec<String>,
}

impl DiffResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn update(changes: Vec<String>) -> Self {
        Self {
            changes,
            replace_keys: Vec::new(),
        }
    }

    pub fn replace(changes: Vec<String>) -> Self {
        Self {
            replace_keys: changes.clone(),
            changes,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        !self.replace_keys.is_empty()
    }

    /// Drop properties the caller asked to ignore
    pub fn without(mut self, ignored: &[String]) -> Self {
        self.changes.retain(|k| !ignored.contains(k));
        self.replace_keys.retain(|k| !ignored.contains(k));
        self
    }
}

/// Provider-assigned id and outputs of a new resource
#[derive(Debug, Clone)]
pub struct CreateResult {
    pub id: String,
    pub outputs: PropertyMap,
}

/// Top-level keys whose values differ between two property maps, sorted
pub fn changed_keys(olds: &PropertyMap, news: &PropertyMap) -> Vec<String> {
    olds.keys()
        .chain(news.keys())
        .filter(|k| olds.get(*k) != news.get(*k))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Providers indexed by package name
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ResourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ResourceProvider>) {
        tracing::debug!("Registered provider {} {}", provider.name(), provider.version());
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Provider responsible for `resource_type`
    pub fn for_type(&self, resource_type: &ResourceType) -> Result<Arc<dyn ResourceProvider>> {
        self.providers
            .get(resource_type.package())
            .cloned()
            .ok_or_else(|| CloudError::ProviderNotFound(resource_type.package().to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
