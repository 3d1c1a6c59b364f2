//! Planned actions for a stack update

use crate::state::ResourceState;
use fleetform_core::{ChangeSummary, OpType, PropertyMap, ResourceDeclaration, ResourceType, Urn};
use serde::{Deserialize, Serialize};

/// Represents a planned action for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Operation to perform
    pub op: OpType,

    /// Target resource
    pub urn: Urn,

    /// Resource type token
    pub resource_type: ResourceType,

    /// Checked inputs; empty for deletes
    pub inputs: PropertyMap,

    /// Changed input properties (update/replace only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,

    /// Refuse deletes and replacements
    #[serde(default)]
    pub protect: bool,

    /// Prior state, if the resource already exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior: Option<ResourceState>,
}

impl Action {
    pub fn for_declaration(
        op: OpType,
        declaration: &ResourceDeclaration,
        inputs: PropertyMap,
        prior: Option<ResourceState>,
    ) -> Self {
        Self {
            op,
            urn: declaration.urn.clone(),
            resource_type: declaration.resource_type.clone(),
            inputs,
            changes: Vec::new(),
            protect: declaration.options.protect,
            prior,
        }
    }

    pub fn delete(prior: ResourceState) -> Self {
        Self {
            op: OpType::Delete,
            urn: prior.urn.clone(),
            resource_type: prior.resource_type.clone(),
            inputs: PropertyMap::new(),
            changes: Vec::new(),
            protect: prior.protect,
            prior: Some(prior),
        }
    }

    pub fn with_changes(mut self, changes: Vec<String>) -> Self {
        self.changes = changes;
        self
    }

    /// Human readable line for previews
    pub fn describe(&self) -> String {
        if self.changes.is_empty() {
            format!("{} {}", self.op, self.urn.name())
        } else {
            format!("{} {} [{}]", self.op, self.urn.name(), self.changes.join(", "))
        }
    }
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in apply order
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the plan has any changes
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(|a| a.op != OpType::Same)
    }

    /// Get actions by type
    pub fn actions_by_op(&self, op: OpType) -> Vec<&Action> {
        self.actions.iter().filter(|a| a.op == op).collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::new();
        for action in &self.actions {
            summary.record(action.op);
        }
        summary
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, urn: &Urn, op: OpType) {
        self.succeeded.push(ActionResult {
            urn: urn.to_string(),
            op,
            error: None,
        });
    }

    pub fn add_failure(&mut self, urn: &Urn, op: OpType, error: String) {
        self.failed.push(ActionResult {
            urn: urn.to_string(),
            op,
            error: Some(error),
        });
    }

    /// Summary of the operations that succeeded
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::new();
        for result in &self.succeeded {
            summary.record(result.op);
        }
        summary
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub urn: String,
    pub op: OpType,
    pub error: Option<String>,
}
