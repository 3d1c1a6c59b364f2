//! Structural checks of the sample program against the mock runtime

use fleetform_core::{
    ExportSource, MockResourceState, MockRuntime, OpType, StackRef, evaluate, run,
};
use fleetform_random::RANDOM_INTEGER;
use random_number::{EXPORT_KEY, MAX, MIN, PROJECT_NAME, RESOURCE_NAME, program};
use serde_json::json;

fn stack() -> StackRef {
    StackRef::new(PROJECT_NAME, "test").unwrap()
}

/// Answers every resource with a fixed `result` so exports resolve
fn mock_runtime() -> MockRuntime {
    MockRuntime::new(stack()).with_new_resource(|decl| {
        let min = decl.get_input::<i64>("min").unwrap_or_default();
        let mut outputs = decl.inputs.clone();
        outputs.insert("result".to_string(), json!(min));
        Ok(MockResourceState {
            id: min.to_string(),
            outputs,
        })
    })
}

/// Exactly one resource of the expected type and name is declared
#[test]
fn test_declares_single_random_integer() {
    let deployment = evaluate(stack(), program).unwrap();

    assert_eq!(deployment.resources.len(), 1);
    let resource = &deployment.resources[0];
    assert_eq!(resource.name, RESOURCE_NAME);
    assert_eq!(resource.name, "randomNumber");
    assert_eq!(resource.resource_type.as_str(), RANDOM_INTEGER);
    assert_eq!(resource.urn.name(), "randomNumber");
}

/// The declared bounds are 1 and 100 and min does not exceed max
#[test]
fn test_bounds_are_ordered() {
    let deployment = evaluate(stack(), program).unwrap();
    let resource = &deployment.resources[0];

    let min: i64 = resource.get_input("min").unwrap();
    let max: i64 = resource.get_input("max").unwrap();
    assert_eq!((min, max), (MIN, MAX));
    assert_eq!((min, max), (1, 100));
    assert!(min <= max);
    assert!(resource.inputs.get("seed").is_none());
}

/// Exactly one export, bound to the resource's `result` output
#[test]
fn test_single_export_bound_to_result() {
    let deployment = evaluate(stack(), program).unwrap();

    assert_eq!(deployment.exports.len(), 1);
    match &deployment.exports[EXPORT_KEY] {
        ExportSource::Output { urn, property } => {
            assert_eq!(urn, &deployment.resources[0].urn);
            assert_eq!(property, "result");
        }
        other => panic!("export is not bound to an output: {:?}", other),
    }
}

/// Running twice against the mock runtime yields identical declarations
#[tokio::test]
async fn test_declarations_are_idempotent() {
    let runtime = mock_runtime();

    run(&runtime, program).await.unwrap();
    run(&runtime, program).await.unwrap();

    let registered = runtime.registered().unwrap();
    assert_eq!(registered.len(), 2);
    assert_eq!(registered[0], registered[1]);
}

#[tokio::test]
async fn test_export_resolves_through_runtime() {
    let runtime = mock_runtime();
    let result = run(&runtime, program).await.unwrap();

    assert_eq!(result.export(EXPORT_KEY), Some(&json!(1)));
    assert_eq!(result.summary.count(OpType::Create), 1);
    assert_eq!(result.summary.to_string(), "1 create");
}

/// The default mock echoes inputs, so `result` is never produced
#[tokio::test]
async fn test_default_mock_cannot_resolve_result() {
    let runtime = MockRuntime::new(stack());
    let err = run(&runtime, program).await.unwrap_err();
    assert!(err.to_string().contains("result"));
}
