//! Fleetform Core
//!
//! Declaration SDK for Fleetform programs. A program is a callback that
//! receives a [`Context`], declares resources on it and exports outputs.
//! The collected [`Deployment`] is handed to a [`Runtime`], which owns
//! provisioning, state and validation.
//!
//! ```text
//! program(&mut Context) ──► Deployment ──► Runtime::deploy ──► DeploymentResult
//!                                            │
//!                              ┌─────────────┴─────────────┐
//!                              │                           │
//!                      fleetform-cloud::Engine       MockRuntime
//!                      (providers + state file)     (deterministic)
//! ```

pub mod context;
pub mod error;
pub mod mock;
pub mod output;
pub mod resource;
pub mod runtime;
pub mod summary;

// Re-exports
pub use context::{Context, Deployment, ExportSource, ResourceRef};
pub use error::{FleetformError, Result};
pub use mock::{MockResourceState, MockRuntime};
pub use output::{Output, ResolvedResource, ResolvedResources};
pub use resource::{
    PropertyMap, ResourceDeclaration, ResourceOptions, ResourceType, StackRef, Urn,
};
pub use runtime::{DeploymentResult, Runtime, evaluate, run};
pub use summary::{ChangeSummary, OpType};
