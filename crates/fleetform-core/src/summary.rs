//! Operation counts reported by a runtime

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Operation applied to a resource
///
/// Variants are declared alphabetically so that the derived ordering
/// matches the rendered names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    /// Create a new resource
    Create,
    /// Delete a resource no longer declared
    Delete,
    /// Delete and recreate a resource
    Replace,
    /// No changes needed
    Same,
    /// Update a resource in place
    Update,
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpType::Create => write!(f, "create"),
            OpType::Delete => write!(f, "delete"),
            OpType::Replace => write!(f, "replace"),
            OpType::Same => write!(f, "same"),
            OpType::Update => write!(f, "update"),
        }
    }
}

/// Number of resources per operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSummary(BTreeMap<OpType, usize>);

impl ChangeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op: OpType) {
        *self.0.entry(op).or_insert(0) += 1;
    }

    pub fn count(&self, op: OpType) -> usize {
        self.0.get(&op).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpType, usize)> + '_ {
        self.0.iter().map(|(op, count)| (*op, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|count| *count == 0)
    }

    /// Non-zero entries whose op is one of `ops`
    pub fn where_op_equals(&self, ops: &[OpType]) -> Self {
        Self(
            self.iter()
                .filter(|(op, count)| *count > 0 && ops.contains(op))
                .collect(),
        )
    }

    /// Non-zero entries whose op is none of `ops`
    pub fn where_op_not_equals(&self, ops: &[OpType]) -> Self {
        Self(
            self.iter()
                .filter(|(op, count)| *count > 0 && !ops.contains(op))
                .collect(),
        )
    }

    /// Entries outside `allowed`, rendered as `"<count> <op>"`
    pub fn unexpected_ops(&self, allowed: &[OpType]) -> Vec<String> {
        self.where_op_not_equals(allowed)
            .iter()
            .map(|(op, count)| format!("{} {}", count, op))
            .collect()
    }

    /// Only `same` operations
    pub fn has_no_changes(&self) -> bool {
        self.unexpected_ops(&[OpType::Same]).is_empty()
    }

    /// No `delete` or `replace` operations
    pub fn has_no_deletes(&self) -> bool {
        self.where_op_equals(&[OpType::Delete, OpType::Replace])
            .is_empty()
    }
}

impl FromIterator<(OpType, usize)> for ChangeSummary {
    fn from_iter<I: IntoIterator<Item = (OpType, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted: Vec<String> = self
            .iter()
            .map(|(op, count)| {
                let suffix = if count > 1 { "s" } else { "" };
                format!("{} {}{}", count, op, suffix)
            })
            .collect();
        write!(f, "{}", formatted.join(", "))
    }
}
