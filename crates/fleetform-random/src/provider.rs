//! Provider for the `random` package

use crate::integer::RANDOM_INTEGER;
use async_trait::async_trait;
use fleetform_cloud::{
    CheckResult, CloudError, CreateResult, DiffResult, ResourceProvider, Result, changed_keys,
};
use fleetform_core::{PropertyMap, ResourceType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Random provider
///
/// Values are generated once at creation and never read back from
/// anywhere, so `read` keeps the stored outputs. Every input change forces
/// a replacement.
#[derive(Debug, Default)]
pub struct RandomProvider;

impl RandomProvider {
    pub fn new() -> Self {
        Self
    }

    fn rng(seed: Option<&str>) -> StdRng {
        match seed {
            Some(seed) => StdRng::from_seed(Sha256::digest(seed.as_bytes()).into()),
            None => StdRng::from_entropy(),
        }
    }

    fn ensure_supported(resource_type: &ResourceType) -> Result<()> {
        if resource_type.as_str() != RANDOM_INTEGER {
            return Err(CloudError::UnsupportedType(resource_type.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceProvider for RandomProvider {
    fn name(&self) -> &str {
        "random"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn check(
        &self,
        resource_type: &ResourceType,
        inputs: &PropertyMap,
    ) -> Result<CheckResult> {
        Self::ensure_supported(resource_type)?;
        let mut result = CheckResult::ok(inputs.clone());

        let min = inputs.get("min").and_then(|v| v.as_i64());
        let max = inputs.get("max").and_then(|v| v.as_i64());
        if min.is_none() {
            result.fail("min", "required integer");
        }
        if max.is_none() {
            result.fail("max", "required integer");
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                result.fail("max", format!("must be at least min ({})", min));
            }
        }

        if inputs.get("seed").is_some_and(|v| !v.is_string()) {
            result.fail("seed", "must be a string");
        }
        if let Some(keepers) = inputs.get("keepers") {
            let all_strings = keepers
                .as_object()
                .is_some_and(|m| m.values().all(|v| v.is_string()));
            if !all_strings {
                result.fail("keepers", "must be a map of strings");
            }
        }

        Ok(result)
    }

    async fn diff(
        &self,
        _resource_type: &ResourceType,
        _id: &str,
        olds: &PropertyMap,
        news: &PropertyMap,
    ) -> Result<DiffResult> {
        let changes = changed_keys(olds, news);
        if changes.is_empty() {
            return Ok(DiffResult::none());
        }
        Ok(DiffResult::replace(changes))
    }

    async fn create(
        &self,
        resource_type: &ResourceType,
        inputs: &PropertyMap,
    ) -> Result<CreateResult> {
        Self::ensure_supported(resource_type)?;
        let (Some(min), Some(max)) = (
            inputs.get("min").and_then(|v| v.as_i64()),
            inputs.get("max").and_then(|v| v.as_i64()),
        ) else {
            return Err(CloudError::ProviderError(
                "min and max must be integers".to_string(),
            ));
        };
        if min > max {
            return Err(CloudError::ProviderError(format!(
                "min ({}) is greater than max ({})",
                min, max
            )));
        }

        let seed = inputs.get("seed").and_then(|v| v.as_str());
        let value = Self::rng(seed).gen_range(min..=max);
        tracing::debug!("Generated random integer in [{}, {}]", min, max);

        let mut outputs = inputs.clone();
        outputs.insert("result".to_string(), serde_json::json!(value));
        Ok(CreateResult {
            id: value.to_string(),
            outputs,
        })
    }

    async fn delete(
        &self,
        resource_type: &ResourceType,
        _id: &str,
        _outputs: &PropertyMap,
    ) -> Result<()> {
        // Nothing exists outside the state file
        Self::ensure_supported(resource_type)
    }
}
