//! Program evaluation context
//!
//! A program receives a [`Context`], declares resources and exports on it,
//! and the collected [`Deployment`] is handed to a runtime.

use crate::error::{FleetformError, Result};
use crate::output::{Output, ResolvedResources};
use crate::resource::{
    ResourceDeclaration, ResourceOptions, ResourceType, StackRef, Urn, check_resource_name,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an exported value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportSource {
    /// A property of a declared resource
    Output { urn: Urn, property: String },
    /// A value known at declaration time
    Value { value: serde_json::Value },
}

/// Handle to a declared resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    urn: Urn,
}

impl ResourceRef {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn name(&self) -> &str {
        self.urn.name()
    }

    /// Typed handle to one of the resource's output properties
    pub fn output<T>(&self, property: &str) -> Output<T> {
        Output::new(self.urn.clone(), property)
    }

    /// Handle to the provider-assigned id
    pub fn id(&self) -> Output<String> {
        self.output("id")
    }
}

/// Declarations collected from one program run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub stack: StackRef,
    /// Resources in declaration order
    pub resources: Vec<ResourceDeclaration>,
    pub exports: BTreeMap<String, ExportSource>,
}

impl Deployment {
    pub fn resource(&self, urn: &Urn) -> Option<&ResourceDeclaration> {
        self.resources.iter().find(|r| &r.urn == urn)
    }

    pub fn by_type(&self, resource_type: &ResourceType) -> Vec<&ResourceDeclaration> {
        self.resources
            .iter()
            .filter(|r| &r.resource_type == resource_type)
            .collect()
    }

    /// Map every export to its value
    pub fn resolve_exports(
        &self,
        resources: &ResolvedResources,
    ) -> Result<BTreeMap<String, serde_json::Value>> {
        self.exports
            .iter()
            .map(|(key, source)| {
                let value = match source {
                    ExportSource::Output { urn, property } => resources.property(urn, property)?,
                    ExportSource::Value { value } => value.clone(),
                };
                Ok((key.clone(), value))
            })
            .collect()
    }
}

/// Declaration context passed to a program
#[derive(Debug)]
pub struct Context {
    stack: StackRef,
    resources: Vec<ResourceDeclaration>,
    exports: BTreeMap<String, ExportSource>,
}

impl Context {
    pub fn new(stack: StackRef) -> Self {
        Self {
            stack,
            resources: Vec::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn stack(&self) -> &StackRef {
        &self.stack
    }

    /// Declare a resource of `resource_type` named `name`
    pub fn register_resource<A: Serialize>(
        &mut self,
        resource_type: &ResourceType,
        name: &str,
        args: &A,
        options: ResourceOptions,
    ) -> Result<ResourceRef> {
        check_resource_name(name)?;
        let urn = self.stack.urn(resource_type, name);
        if self.resources.iter().any(|r| r.urn == urn) {
            return Err(FleetformError::DuplicateResource(urn.to_string()));
        }

        let inputs = match serde_json::to_value(args)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(FleetformError::InvalidArguments(urn.to_string())),
        };

        tracing::debug!("Declared {}", urn);
        self.resources.push(ResourceDeclaration {
            urn: urn.clone(),
            name: name.to_string(),
            resource_type: resource_type.clone(),
            inputs,
            options,
        });

        Ok(ResourceRef { urn })
    }

    /// Export a resource output under `key`
    pub fn export<T>(&mut self, key: impl Into<String>, output: &Output<T>) -> Result<()> {
        self.insert_export(
            key.into(),
            ExportSource::Output {
                urn: output.urn().clone(),
                property: output.property().to_string(),
            },
        )
    }

    /// Export a plain value under `key`
    pub fn export_value<V: Serialize>(&mut self, key: impl Into<String>, value: &V) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.insert_export(key.into(), ExportSource::Value { value })
    }

    fn insert_export(&mut self, key: String, source: ExportSource) -> Result<()> {
        if self.exports.contains_key(&key) {
            return Err(FleetformError::DuplicateExport(key));
        }
        self.exports.insert(key, source);
        Ok(())
    }

    pub fn into_deployment(self) -> Deployment {
        Deployment {
            stack: self.stack,
            resources: self.resources,
            exports: self.exports,
        }
    }
}
