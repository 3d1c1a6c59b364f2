//! Fleetform Cloud
//!
//! This crate provides the resource provider abstraction and the local
//! deployment engine that implements [`fleetform_core::Runtime`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Fleetform program                   │
//! │        (declares resources and exports)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Deployment
//! ┌─────────────────▼───────────────────────────────┐
//! │               fleetform-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │                 Engine                   │   │
//! │  │  preview / up / refresh / destroy        │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Plan/Apply  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait ResourceProvider
//! ┌───────▼───────┐
//! │    random     │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ApplyResult, Plan};
pub use engine::Engine;
pub use error::{CheckFailure, CloudError, Result};
pub use provider::{
    CheckResult, CreateResult, DiffResult, ProviderRegistry, ResourceProvider, changed_keys,
};
pub use state::{ResourceState, STATE_VERSION, StackState, StateLock, StateManager};
