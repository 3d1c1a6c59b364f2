//! Deterministic runtime for unit tests
//!
//! [`MockRuntime`] never provisions anything. Every declaration is recorded
//! and answered by a hook, so the same program always produces the same
//! result.

use crate::context::Deployment;
use crate::error::{FleetformError, Result};
use crate::output::{ResolvedResource, ResolvedResources};
use crate::resource::{PropertyMap, ResourceDeclaration, StackRef};
use crate::runtime::{DeploymentResult, Runtime};
use crate::summary::{ChangeSummary, OpType};
use async_trait::async_trait;
use std::sync::Mutex;

/// State returned by the mock for one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockResourceState {
    pub id: String,
    pub outputs: PropertyMap,
}

type NewResourceHook = Box<dyn Fn(&ResourceDeclaration) -> Result<MockResourceState> + Send + Sync>;

pub struct MockRuntime {
    stack: StackRef,
    new_resource: Option<NewResourceHook>,
    registered: Mutex<Vec<ResourceDeclaration>>,
}

impl MockRuntime {
    pub fn new(stack: StackRef) -> Self {
        Self {
            stack,
            new_resource: None,
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Override how resources are answered
    pub fn with_new_resource<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ResourceDeclaration) -> Result<MockResourceState> + Send + Sync + 'static,
    {
        self.new_resource = Some(Box::new(hook));
        self
    }

    /// Every declaration received so far, in order
    pub fn registered(&self) -> Result<Vec<ResourceDeclaration>> {
        self.registered
            .lock()
            .map(|r| r.clone())
            .map_err(|e| FleetformError::Runtime(e.to_string()))
    }

    fn answer(&self, declaration: &ResourceDeclaration) -> Result<MockResourceState> {
        match &self.new_resource {
            Some(hook) => hook(declaration),
            None => Ok(MockResourceState {
                id: format!("{}_id", declaration.name),
                outputs: declaration.inputs.clone(),
            }),
        }
    }
}

#[async_trait]
impl Runtime for MockRuntime {
    fn stack(&self) -> &StackRef {
        &self.stack
    }

    async fn deploy(&self, deployment: &Deployment) -> Result<DeploymentResult> {
        let mut resources = Vec::with_capacity(deployment.resources.len());
        let mut summary = ChangeSummary::new();

        for declaration in &deployment.resources {
            self.registered
                .lock()
                .map_err(|e| FleetformError::Runtime(e.to_string()))?
                .push(declaration.clone());

            let state = self.answer(declaration)?;
            resources.push(ResolvedResource {
                urn: declaration.urn.clone(),
                id: state.id,
                resource_type: declaration.resource_type.clone(),
                outputs: state.outputs,
            });
            summary.record(OpType::Create);
        }

        let resolved: ResolvedResources = resources.iter().cloned().collect();
        let exports = deployment.resolve_exports(&resolved)?;

        Ok(DeploymentResult {
            resources,
            exports,
            summary,
        })
    }
}
