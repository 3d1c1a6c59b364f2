//! Runtime contract and program entry point

use crate::context::{Context, Deployment};
use crate::error::Result;
use crate::output::{ResolvedResource, ResolvedResources};
use crate::resource::StackRef;
use crate::summary::ChangeSummary;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of handing a deployment to a runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Resolved resources in declaration order
    pub resources: Vec<ResolvedResource>,

    /// Exported values by key
    pub exports: BTreeMap<String, serde_json::Value>,

    /// Operations the runtime performed
    pub summary: ChangeSummary,
}

impl DeploymentResult {
    pub fn export(&self, key: &str) -> Option<&serde_json::Value> {
        self.exports.get(key)
    }

    pub fn resolved(&self) -> ResolvedResources {
        self.resources.iter().cloned().collect()
    }
}

/// Orchestration runtime that provisions declared resources
///
/// The engine in `fleetform-cloud` and [`crate::MockRuntime`] implement
/// this trait.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Project and stack this runtime manages
    fn stack(&self) -> &StackRef;

    /// Provision the deployment and resolve its exports
    async fn deploy(&self, deployment: &Deployment) -> Result<DeploymentResult>;
}

/// Run a program's declarations without any runtime
pub fn evaluate<F>(stack: StackRef, program: F) -> Result<Deployment>
where
    F: FnOnce(&mut Context) -> Result<()>,
{
    let mut ctx = Context::new(stack);
    program(&mut ctx)?;
    let deployment = ctx.into_deployment();
    tracing::debug!(
        "Evaluated {} resource(s) and {} export(s)",
        deployment.resources.len(),
        deployment.exports.len()
    );
    Ok(deployment)
}

/// Program entry point: evaluate `program` and deploy it with `runtime`
pub async fn run<R, F>(runtime: &R, program: F) -> Result<DeploymentResult>
where
    R: Runtime + ?Sized,
    F: FnOnce(&mut Context) -> Result<()>,
{
    let deployment = evaluate(runtime.stack().clone(), program)?;
    runtime.deploy(&deployment).await
}
