//! Resource declaration types

use crate::error::{FleetformError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input and output properties of a resource
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

const URN_PREFIX: &str = "urn:fleetform:";

/// Resource type token in the form `package:module:Name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(FleetformError::InvalidResourceType(token));
        }
        Ok(Self(token))
    }

    /// Package that owns this type (routes to a provider)
    pub fn package(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceType {
    type Err = FleetformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceType {
    type Error = FleetformError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.0
    }
}

/// Project and stack a program is evaluated for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRef {
    pub project: String,
    pub stack: String,
}

impl StackRef {
    /// Both names end up inside URNs and the stack name also names the
    /// state file, so neither may be empty or contain `:` or a path
    /// separator.
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Result<Self> {
        let project = project.into();
        let stack = stack.into();
        check_name("project", &project)?;
        check_name("stack", &stack)?;
        Ok(Self { project, stack })
    }

    pub fn urn(&self, resource_type: &ResourceType, name: &str) -> Urn {
        Urn {
            stack: self.stack.clone(),
            project: self.project.clone(),
            resource_type: resource_type.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for StackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.stack)
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains(':') {
        "must not contain `:`"
    } else if name.contains(['/', '\\']) || name == "." || name == ".." {
        "must not be a path"
    } else {
        return Ok(());
    };
    Err(FleetformError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    })
}

/// Logical resource names only need to be non-empty; the name is the last
/// URN segment so it may contain `::`.
pub(crate) fn check_resource_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FleetformError::InvalidName {
            kind: "resource",
            name: String::new(),
            reason: "must not be empty",
        });
    }
    Ok(())
}

/// Unique resource name within a stack:
/// `urn:fleetform:<stack>::<project>::<type>::<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    stack: String,
    project: String,
    resource_type: ResourceType,
    name: String,
}

impl Urn {
    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}::{}::{}::{}",
            URN_PREFIX, self.stack, self.project, self.resource_type, self.name
        )
    }
}

impl FromStr for Urn {
    type Err = FleetformError;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| FleetformError::InvalidUrn(s.to_string()))?;
        let parts: Vec<&str> = rest.splitn(4, "::").collect();
        let [stack, project, resource_type, name] = parts.as_slice() else {
            return Err(FleetformError::InvalidUrn(s.to_string()));
        };
        if stack.is_empty() || project.is_empty() || name.is_empty() {
            return Err(FleetformError::InvalidUrn(s.to_string()));
        }
        Ok(Self {
            stack: stack.to_string(),
            project: project.to_string(),
            resource_type: ResourceType::new(*resource_type)?,
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for Urn {
    type Error = FleetformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Urn> for String {
    fn from(value: Urn) -> Self {
        value.to_string()
    }
}

/// Per-resource options honoured by the runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOptions {
    /// Refuse to delete or replace this resource
    #[serde(default)]
    pub protect: bool,

    /// Input properties excluded from change detection
    #[serde(default)]
    pub ignore_changes: Vec<String>,
}

impl ResourceOptions {
    pub fn protected() -> Self {
        Self {
            protect: true,
            ..Self::default()
        }
    }

    pub fn with_ignore_changes<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_changes = properties.into_iter().map(Into::into).collect();
        self
    }
}

/// A request to the runtime to manage one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    pub urn: Urn,
    pub name: String,
    pub resource_type: ResourceType,
    pub inputs: PropertyMap,
    #[serde(default)]
    pub options: ResourceOptions,
}

impl ResourceDeclaration {
    /// Get an input value as a specific type
    pub fn get_input<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inputs
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
