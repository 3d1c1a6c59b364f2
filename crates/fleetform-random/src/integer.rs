//! `RandomInteger` resource

use fleetform_core::{
    Context, FleetformError, Output, ResourceOptions, ResourceRef, ResourceType, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type token of the random integer resource
pub const RANDOM_INTEGER: &str = "random:index/randomInteger:RandomInteger";

/// Arguments of a random integer, bounds inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomIntegerArgs {
    pub min: i64,

    pub max: i64,

    /// Makes the result deterministic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    /// Arbitrary values that force a new result when they change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepers: Option<BTreeMap<String, String>>,
}

impl RandomIntegerArgs {
    pub fn builder() -> RandomIntegerArgsBuilder {
        RandomIntegerArgsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RandomIntegerArgsBuilder {
    min: Option<i64>,
    max: Option<i64>,
    seed: Option<String>,
    keepers: Option<BTreeMap<String, String>>,
}

impl RandomIntegerArgsBuilder {
    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn keeper(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keepers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<RandomIntegerArgs> {
        Ok(RandomIntegerArgs {
            min: self
                .min
                .ok_or_else(|| FleetformError::MissingArgument("min".to_string()))?,
            max: self
                .max
                .ok_or_else(|| FleetformError::MissingArgument("max".to_string()))?,
            seed: self.seed,
            keepers: self.keepers,
        })
    }
}

/// A random integer in `[min, max]`, chosen once at creation
#[derive(Debug, Clone)]
pub struct RandomInteger {
    resource: ResourceRef,

    /// The generated integer
    pub result: Output<i64>,

    /// Provider id (the decimal result)
    pub id: Output<String>,
}

impl RandomInteger {
    pub fn resource_type() -> Result<ResourceType> {
        ResourceType::new(RANDOM_INTEGER)
    }

    pub fn new(ctx: &mut Context, name: &str, args: RandomIntegerArgs) -> Result<Self> {
        Self::new_with_options(ctx, name, args, ResourceOptions::default())
    }

    pub fn new_with_options(
        ctx: &mut Context,
        name: &str,
        args: RandomIntegerArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let resource = ctx.register_resource(&Self::resource_type()?, name, &args, options)?;
        Ok(Self {
            result: resource.output("result"),
            id: resource.id(),
            resource,
        })
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }
}
