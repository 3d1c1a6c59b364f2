//! Deployment engine
//!
//! Plans a [`Deployment`] against the persisted [`StackState`], applies the
//! plan through the registered providers and writes the new state back.

use crate::action::{Action, ApplyResult, Plan};
use crate::error::{CloudError, Result};
use crate::provider::ProviderRegistry;
use crate::state::{ResourceState, STATE_VERSION, StackState, StateManager};
use async_trait::async_trait;
use fleetform_core::{
    ChangeSummary, Deployment, DeploymentResult, FleetformError, OpType, PropertyMap,
    ResolvedResource, ResolvedResources, Runtime, StackRef,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Local orchestration runtime backed by a state directory
pub struct Engine {
    stack: StackRef,
    providers: ProviderRegistry,
    state: StateManager,
}

impl Engine {
    pub fn new(stack: StackRef, providers: ProviderRegistry, state_dir: impl AsRef<Path>) -> Self {
        Self {
            stack,
            providers,
            state: StateManager::new(state_dir),
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    async fn load(&self) -> Result<StackState> {
        self.state.load(&self.stack.project, &self.stack.stack).await
    }

    fn ensure_same_stack(&self, deployment: &Deployment) -> Result<()> {
        if deployment.stack != self.stack {
            return Err(CloudError::InvalidState(format!(
                "deployment targets {} but engine manages {}",
                deployment.stack, self.stack
            )));
        }
        Ok(())
    }

    /// Compute the actions needed to move `current` to `deployment`
    async fn plan_against(&self, deployment: &Deployment, current: &StackState) -> Result<Plan> {
        let mut actions = Vec::new();

        for declaration in &deployment.resources {
            let provider = self.providers.for_type(&declaration.resource_type)?;
            let checked = provider
                .check(&declaration.resource_type, &declaration.inputs)
                .await?;
            if !checked.is_ok() {
                return Err(CloudError::CheckFailed {
                    urn: declaration.urn.to_string(),
                    failures: checked.failures,
                });
            }

            let Some(prior) = current.get_resource(&declaration.urn) else {
                actions.push(Action::for_declaration(
                    OpType::Create,
                    declaration,
                    checked.inputs,
                    None,
                ));
                continue;
            };

            let ignored = &declaration.options.ignore_changes;
            let diff = provider
                .diff(
                    &declaration.resource_type,
                    &prior.id,
                    &prior.inputs,
                    &checked.inputs,
                )
                .await?
                .without(ignored);

            let op = if !diff.has_changes() {
                OpType::Same
            } else if diff.requires_replace() {
                OpType::Replace
            } else {
                OpType::Update
            };
            if op == OpType::Replace && prior.protect {
                return Err(CloudError::ProtectedResource(declaration.urn.to_string()));
            }

            let inputs = keep_ignored(&prior.inputs, checked.inputs, ignored);
            actions.push(
                Action::for_declaration(op, declaration, inputs, Some(prior.clone()))
                    .with_changes(diff.changes),
            );
        }

        for prior in current.resources.iter().rev() {
            if deployment.resource(&prior.urn).is_some() {
                continue;
            }
            if prior.protect {
                return Err(CloudError::ProtectedResource(prior.urn.to_string()));
            }
            actions.push(Action::delete(prior.clone()));
        }

        Ok(Plan::new(actions))
    }

    /// Plan without touching any resource or state
    pub async fn preview(&self, deployment: &Deployment) -> Result<Plan> {
        self.ensure_same_stack(deployment)?;
        let current = self.load().await?;
        let plan = self.plan_against(deployment, &current).await?;
        tracing::info!("Preview of {}: {}", self.stack, plan.summary());
        Ok(plan)
    }

    /// Apply `deployment` and persist the resulting state and exports
    pub async fn up(&self, deployment: &Deployment) -> Result<DeploymentResult> {
        self.ensure_same_stack(deployment)?;
        let lock = self.state.acquire_lock(&self.stack.stack).await?;
        let outcome = self.up_locked(deployment).await;
        lock.release().await?;
        outcome
    }

    async fn up_locked(&self, deployment: &Deployment) -> Result<DeploymentResult> {
        let mut state = self.load().await?;
        let plan = self.plan_against(deployment, &state).await?;

        let applied = self.apply(&plan, &mut state).await;
        if !applied.is_success() {
            for failure in &applied.failed {
                tracing::error!(
                    "Failed to {} {}: {}",
                    failure.op,
                    failure.urn,
                    failure.error.as_deref().unwrap_or_default()
                );
            }
            self.state.save(&state).await?;
            return Err(CloudError::UpdateFailed {
                stack: self.stack.to_string(),
                failed: applied.failed,
            });
        }

        let resources: Vec<ResolvedResource> = deployment
            .resources
            .iter()
            .filter_map(|d| state.get_resource(&d.urn))
            .map(|r| ResolvedResource {
                urn: r.urn.clone(),
                id: r.id.clone(),
                resource_type: r.resource_type.clone(),
                outputs: r.outputs.clone(),
            })
            .collect();
        let resolved: ResolvedResources = resources.iter().cloned().collect();
        let exports = deployment.resolve_exports(&resolved)?;

        state.outputs = exports.clone();
        self.state.save(&state).await?;

        tracing::info!(
            "Updated {} in {}ms: {}",
            self.stack,
            applied.duration_ms,
            applied.summary()
        );
        Ok(DeploymentResult {
            resources,
            exports,
            summary: applied.summary(),
        })
    }

    /// Execute actions in order, recording progress in `state`.
    /// Stops at the first failing action.
    async fn apply(&self, plan: &Plan, state: &mut StackState) -> ApplyResult {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            match self.apply_action(action, state).await {
                Ok(()) => result.add_success(&action.urn, action.op),
                Err(e) => {
                    result.add_failure(&action.urn, action.op, e.to_string());
                    break;
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn apply_action(&self, action: &Action, state: &mut StackState) -> Result<()> {
        let provider = self.providers.for_type(&action.resource_type)?;
        let ty = &action.resource_type;

        match (action.op, action.prior.as_ref()) {
            (OpType::Create, _) => {
                tracing::info!("Creating {}", action.urn);
                let created = provider.create(ty, &action.inputs).await?;
                state.set_resource(
                    ResourceState::new(action.urn.clone(), created.id, ty.clone())
                        .with_inputs(action.inputs.clone())
                        .with_outputs(created.outputs)
                        .with_protect(action.protect),
                );
            }
            (OpType::Update, Some(prior)) => {
                tracing::info!("Updating {} [{}]", action.urn, action.changes.join(", "));
                let outputs = provider
                    .update(ty, &prior.id, &prior.inputs, &action.inputs)
                    .await?;
                let mut next = prior.clone().with_inputs(action.inputs.clone());
                next.protect = action.protect;
                next.set_outputs(outputs);
                state.set_resource(next);
            }
            (OpType::Replace, Some(prior)) => {
                tracing::info!("Replacing {} [{}]", action.urn, action.changes.join(", "));
                let created = provider.create(ty, &action.inputs).await?;
                state.set_resource(
                    ResourceState::new(action.urn.clone(), created.id, ty.clone())
                        .with_inputs(action.inputs.clone())
                        .with_outputs(created.outputs)
                        .with_protect(action.protect),
                );
                if let Err(e) = provider.delete(ty, &prior.id, &prior.outputs).await {
                    tracing::warn!("Replaced {} but {} was not deleted", action.urn, prior.id);
                    return Err(e);
                }
            }
            (OpType::Same, Some(prior)) => {
                if prior.protect != action.protect {
                    state.set_resource(prior.clone().with_protect(action.protect));
                }
            }
            (OpType::Delete, Some(prior)) => {
                tracing::info!("Deleting {}", action.urn);
                provider.delete(ty, &prior.id, &prior.outputs).await?;
                state.remove_resource(&action.urn);
            }
            (op, None) => {
                return Err(CloudError::ResourceNotFound(format!(
                    "{} requires prior state for {}",
                    op, action.urn
                )));
            }
        }
        Ok(())
    }

    /// Reconcile the stored state with what the providers report
    pub async fn refresh(&self) -> Result<ChangeSummary> {
        let lock = self.state.acquire_lock(&self.stack.stack).await?;
        let outcome = self.refresh_locked().await;
        lock.release().await?;
        outcome
    }

    async fn refresh_locked(&self) -> Result<ChangeSummary> {
        let mut state = self.load().await?;
        let mut summary = ChangeSummary::new();

        for resource in state.resources.clone() {
            let provider = self.providers.for_type(&resource.resource_type)?;
            let live = provider
                .read(&resource.resource_type, &resource.id, &resource.outputs)
                .await?;
            match live {
                None => {
                    tracing::warn!("{} no longer exists", resource.urn);
                    state.remove_resource(&resource.urn);
                    summary.record(OpType::Delete);
                }
                Some(outputs) if outputs != resource.outputs => {
                    let mut next = resource.clone();
                    next.set_outputs(outputs);
                    state.set_resource(next);
                    summary.record(OpType::Update);
                }
                Some(_) => summary.record(OpType::Same),
            }
        }

        self.state.save(&state).await?;
        tracing::info!("Refreshed {}: {}", self.stack, summary);
        Ok(summary)
    }

    /// Delete every resource of the stack
    pub async fn destroy(&self) -> Result<ChangeSummary> {
        let lock = self.state.acquire_lock(&self.stack.stack).await?;
        let outcome = self.destroy_locked().await;
        lock.release().await?;
        outcome
    }

    async fn destroy_locked(&self) -> Result<ChangeSummary> {
        let mut state = self.load().await?;
        if let Some(protected) = state.resources.iter().find(|r| r.protect) {
            return Err(CloudError::ProtectedResource(protected.urn.to_string()));
        }

        let mut summary = ChangeSummary::new();
        for resource in state.resources.clone().into_iter().rev() {
            let provider = self.providers.for_type(&resource.resource_type)?;
            tracing::info!("Deleting {}", resource.urn);
            if let Err(e) = provider
                .delete(&resource.resource_type, &resource.id, &resource.outputs)
                .await
            {
                self.state.save(&state).await?;
                return Err(e);
            }
            state.remove_resource(&resource.urn);
            summary.record(OpType::Delete);
        }
        state.outputs.clear();

        self.state.save(&state).await?;
        tracing::info!("Destroyed {}: {}", self.stack, summary);
        Ok(summary)
    }

    /// Exports persisted by the last update
    pub async fn outputs(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        Ok(self.load().await?.outputs)
    }

    /// Raw stack state
    pub async fn export_stack(&self) -> Result<StackState> {
        self.load().await
    }

    /// Replace the stack state wholesale
    pub async fn import_stack(&self, state: StackState) -> Result<()> {
        if state.project != self.stack.project || state.stack != self.stack.stack {
            return Err(CloudError::InvalidState(format!(
                "state belongs to {}/{} but engine manages {}",
                state.project, state.stack, self.stack
            )));
        }
        if state.version > STATE_VERSION {
            return Err(CloudError::InvalidState(format!(
                "state version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        let lock = self.state.acquire_lock(&self.stack.stack).await?;
        let outcome = self.state.save(&state).await;
        lock.release().await?;
        outcome?;
        tracing::info!("Imported {} resources into {}", state.resources.len(), self.stack);
        Ok(())
    }
}

/// Keep prior values for properties excluded from change detection
fn keep_ignored(prior: &PropertyMap, mut inputs: PropertyMap, ignored: &[String]) -> PropertyMap {
    for key in ignored {
        match prior.get(key) {
            Some(value) => {
                inputs.insert(key.clone(), value.clone());
            }
            None => {
                inputs.remove(key);
            }
        }
    }
    inputs
}

#[async_trait]
impl Runtime for Engine {
    fn stack(&self) -> &StackRef {
        &self.stack
    }

    async fn deploy(&self, deployment: &Deployment) -> fleetform_core::Result<DeploymentResult> {
        self.up(deployment).await.map_err(FleetformError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CheckResult, CreateResult, DiffResult, ResourceProvider, changed_keys};
    use fleetform_core::{Context, ResourceOptions, ResourceType, evaluate, run};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Value the test provider refuses to create
    const UNLUCKY: i64 = 13;

    /// In-memory provider for the "test" package. Changing `label`
    /// replaces a thing; other changes update it in place.
    #[derive(Default)]
    struct TestProvider {
        next_id: AtomicU64,
        live: Mutex<HashMap<String, PropertyMap>>,
        fail_deletes: AtomicBool,
    }

    impl TestProvider {
        fn live_count(&self) -> usize {
            self.live.lock().unwrap().len()
        }

        fn read_sync(&self, id: &str) -> Option<PropertyMap> {
            self.live.lock().unwrap().get(id).cloned()
        }

        fn vanish(&self, id: &str) {
            self.live.lock().unwrap().remove(id);
        }
    }

    #[async_trait]
    impl ResourceProvider for TestProvider {
        fn name(&self) -> &str {
            "test"
        }

        fn version(&self) -> &str {
            "0.0.0"
        }

        async fn check(&self, _ty: &ResourceType, inputs: &PropertyMap) -> Result<CheckResult> {
            let mut result = CheckResult::ok(inputs.clone());
            if !inputs.get("value").is_some_and(|v| v.is_i64()) {
                result.fail("value", "must be an integer");
            }
            Ok(result)
        }

        async fn diff(
            &self,
            _ty: &ResourceType,
            _id: &str,
            olds: &PropertyMap,
            news: &PropertyMap,
        ) -> Result<DiffResult> {
            let changes = changed_keys(olds, news);
            if changes.iter().any(|k| k == "label") {
                return Ok(DiffResult::replace(changes));
            }
            Ok(DiffResult::update(changes))
        }

        async fn create(&self, _ty: &ResourceType, inputs: &PropertyMap) -> Result<CreateResult> {
            if inputs.get("value").and_then(|v| v.as_i64()) == Some(UNLUCKY) {
                return Err(CloudError::ProviderError("unlucky value".to_string()));
            }
            let id = format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.live.lock().unwrap().insert(id.clone(), inputs.clone());
            Ok(CreateResult {
                id,
                outputs: inputs.clone(),
            })
        }

        async fn read(
            &self,
            _ty: &ResourceType,
            id: &str,
            _outputs: &PropertyMap,
        ) -> Result<Option<PropertyMap>> {
            Ok(self.live.lock().unwrap().get(id).cloned())
        }

        async fn update(
            &self,
            _ty: &ResourceType,
            id: &str,
            _olds: &PropertyMap,
            news: &PropertyMap,
        ) -> Result<PropertyMap> {
            self.live
                .lock()
                .unwrap()
                .insert(id.to_string(), news.clone());
            Ok(news.clone())
        }

        async fn delete(&self, _ty: &ResourceType, id: &str, _outputs: &PropertyMap) -> Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(CloudError::ProviderError(format!("cannot delete {id}")));
            }
            self.live.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn thing() -> ResourceType {
        ResourceType::new("test:index:Thing").unwrap()
    }

    fn stack() -> StackRef {
        StackRef::new("proj", "dev").unwrap()
    }

    fn engine(dir: &Path) -> (Engine, Arc<TestProvider>) {
        let provider = Arc::new(TestProvider::default());
        let registry = ProviderRegistry::new().with(provider.clone());
        (Engine::new(stack(), registry, dir), provider)
    }

    fn things(values: &[(&str, i64)], options: ResourceOptions) -> Deployment {
        labelled_things(values, "x", options)
    }

    fn labelled_things(
        values: &[(&str, i64)],
        label: &str,
        options: ResourceOptions,
    ) -> Deployment {
        evaluate(stack(), |ctx: &mut Context| {
            for (name, value) in values {
                let r = ctx.register_resource(
                    &thing(),
                    name,
                    &json!({ "value": value, "label": label }),
                    options.clone(),
                )?;
                ctx.export(*name, &r.output::<i64>("value"))?;
            }
            Ok(())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_up_creates_and_exports() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let result = engine
            .up(&things(&[("a", 1), ("b", 2)], ResourceOptions::default()))
            .await
            .unwrap();

        assert_eq!(result.summary.count(OpType::Create), 2);
        assert_eq!(result.export("a"), Some(&json!(1)));
        assert_eq!(result.export("b"), Some(&json!(2)));
        assert_eq!(provider.live_count(), 2);
        assert_eq!(engine.outputs().await.unwrap()["b"], json!(2));
    }

    #[tokio::test]
    async fn test_second_up_has_no_changes() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        let deployment = things(&[("a", 1)], ResourceOptions::default());

        let first = engine.up(&deployment).await.unwrap();
        let preview = engine.preview(&deployment).await.unwrap();
        assert!(preview.summary().has_no_changes());
        assert!(!preview.has_changes());

        let second = engine.up(&deployment).await.unwrap();
        assert!(second.summary.has_no_changes());
        assert_eq!(first.resources[0].id, second.resources[0].id);
    }

    #[tokio::test]
    async fn test_changed_input_updates_in_place() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();
        let changed = things(&[("a", 5)], ResourceOptions::default());

        let plan = engine.preview(&changed).await.unwrap();
        let updates = plan.actions_by_op(OpType::Update);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].changes, vec!["value"]);
        assert_eq!(updates[0].describe(), "update a [value]");

        let result = engine.up(&changed).await.unwrap();
        assert_eq!(result.summary.count(OpType::Update), 1);
        assert_eq!(result.export("a"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_replace_creates_before_deleting() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let first = engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();
        let relabelled = labelled_things(&[("a", 1)], "y", ResourceOptions::default());

        let plan = engine.preview(&relabelled).await.unwrap();
        assert_eq!(plan.actions_by_op(OpType::Replace)[0].describe(), "replace a [label]");

        let result = engine.up(&relabelled).await.unwrap();
        assert_eq!(result.summary.to_string(), "1 replace");
        assert_ne!(result.resources[0].id, first.resources[0].id);
        assert_eq!(provider.live_count(), 1);
        assert!(provider.read_sync(&result.resources[0].id).is_some());
    }

    #[tokio::test]
    async fn test_protected_resource_blocks_replace() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let first = engine
            .up(&things(&[("a", 1)], ResourceOptions::protected()))
            .await
            .unwrap();

        let err = engine
            .up(&labelled_things(&[("a", 1)], "y", ResourceOptions::protected()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ProtectedResource(_)));
        assert_eq!(provider.live_count(), 1);
        assert_eq!(
            engine.export_stack().await.unwrap().resources[0].id,
            first.resources[0].id
        );
    }

    #[tokio::test]
    async fn test_failed_old_delete_keeps_replacement() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let first = engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();
        provider.fail_deletes.store(true, Ordering::SeqCst);

        let err = engine
            .up(&labelled_things(&[("a", 1)], "y", ResourceOptions::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::UpdateFailed { .. }));

        let state = engine.export_stack().await.unwrap();
        assert_eq!(state.resources.len(), 1);
        let kept = &state.resources[0];
        assert_ne!(kept.id, first.resources[0].id);
        assert_eq!(kept.inputs["label"], json!("y"));
        assert!(provider.read_sync(&kept.id).is_some());
    }

    #[tokio::test]
    async fn test_failed_action_is_reported_and_progress_saved() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let err = engine
            .up(&things(
                &[("a", 1), ("b", UNLUCKY), ("c", 3)],
                ResourceOptions::default(),
            ))
            .await
            .unwrap_err();
        match &err {
            CloudError::UpdateFailed { stack, failed } => {
                assert_eq!(stack, "proj/dev");
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].op, OpType::Create);
                assert!(failed[0].urn.ends_with("::b"));
                assert_eq!(failed[0].error.as_deref(), Some("Provider error: unlucky value"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("create urn:fleetform:dev::proj::test:index:Thing::b"));

        // Apply stopped at the failure; the created resource was persisted
        assert_eq!(provider.live_count(), 1);
        let state = engine.export_stack().await.unwrap();
        assert_eq!(state.resources.len(), 1);
        assert_eq!(state.resources[0].urn.name(), "a");

        let result = engine
            .up(&things(&[("a", 1), ("c", 3)], ResourceOptions::default()))
            .await
            .unwrap();
        assert_eq!(result.summary.to_string(), "1 create, 1 same");
    }

    #[tokio::test]
    async fn test_ignored_changes_are_same() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        let options = ResourceOptions::default().with_ignore_changes(["value"]);

        engine.up(&things(&[("a", 1)], options.clone())).await.unwrap();
        let result = engine.up(&things(&[("a", 9)], options)).await.unwrap();

        assert!(result.summary.has_no_changes());
        assert_eq!(result.export("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_removed_declaration_is_deleted() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        engine
            .up(&things(&[("a", 1), ("b", 2)], ResourceOptions::default()))
            .await
            .unwrap();
        let result = engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();

        assert_eq!(result.summary.to_string(), "1 delete, 1 same");
        assert!(!result.summary.has_no_deletes());
        assert_eq!(provider.live_count(), 1);
        assert_eq!(engine.export_stack().await.unwrap().resources.len(), 1);
    }

    #[tokio::test]
    async fn test_protected_resource_blocks_delete() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        engine
            .up(&things(&[("a", 1)], ResourceOptions::protected()))
            .await
            .unwrap();

        let err = engine
            .up(&things(&[], ResourceOptions::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ProtectedResource(_)));

        let err = engine.destroy().await.unwrap_err();
        assert!(matches!(err, CloudError::ProtectedResource(_)));

        // Lock was released despite the failures
        engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn test_check_failure() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        let deployment = evaluate(stack(), |ctx| {
            ctx.register_resource(
                &thing(),
                "bad",
                &json!({ "value": "nope" }),
                ResourceOptions::default(),
            )?;
            Ok(())
        })
        .unwrap();

        let err = engine.up(&deployment).await.unwrap_err();
        match err {
            CloudError::CheckFailed { failures, .. } => {
                assert_eq!(failures[0].property, "value");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        let deployment = evaluate(stack(), |ctx| {
            ctx.register_resource(
                &ResourceType::new("aws:s3:Bucket").unwrap(),
                "b",
                &json!({}),
                ResourceOptions::default(),
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(
            engine.preview(&deployment).await,
            Err(CloudError::ProviderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_drops_vanished_resources() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        let result = engine
            .up(&things(&[("a", 1), ("b", 2)], ResourceOptions::default()))
            .await
            .unwrap();
        provider.vanish(&result.resources[0].id);

        let summary = engine.refresh().await.unwrap();
        assert_eq!(summary.count(OpType::Delete), 1);
        assert_eq!(summary.count(OpType::Same), 1);
        assert_eq!(engine.export_stack().await.unwrap().resources.len(), 1);
    }

    #[tokio::test]
    async fn test_destroy_empties_stack() {
        let dir = tempdir().unwrap();
        let (engine, provider) = engine(dir.path());

        engine
            .up(&things(&[("a", 1), ("b", 2)], ResourceOptions::default()))
            .await
            .unwrap();
        let summary = engine.destroy().await.unwrap();

        assert_eq!(summary.count(OpType::Delete), 2);
        assert_eq!(provider.live_count(), 0);
        assert!(engine.export_stack().await.unwrap().is_empty());
        assert!(engine.outputs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_other_stack() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        let err = engine
            .import_stack(StackState::new("proj", "prod"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        engine
            .up(&things(&[("a", 1)], ResourceOptions::default()))
            .await
            .unwrap();
        let exported = engine.export_stack().await.unwrap();

        let other_dir = tempdir().unwrap();
        let (other, _) = self::engine(other_dir.path());
        other.import_stack(exported).await.unwrap();
        assert_eq!(other.outputs().await.unwrap()["a"], json!(1));
    }

    #[tokio::test]
    async fn test_engine_as_runtime() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine(dir.path());

        let result = run(&engine, |ctx| {
            let r = ctx.register_resource(
                &thing(),
                "a",
                &json!({ "value": 3 }),
                ResourceOptions::default(),
            )?;
            ctx.export("a", &r.output::<i64>("value"))
        })
        .await
        .unwrap();
        assert_eq!(result.export("a"), Some(&json!(3)));

        let other_stack = evaluate(StackRef::new("proj", "prod").unwrap(), |_| Ok(())).unwrap();
        assert!(matches!(
            engine.deploy(&other_stack).await,
            Err(FleetformError::Runtime(_))
        ));
    }
}
