// tests/workflow_tests.rs
mod common;

use canteen_core::{ContextData, StepControl, Workflow, WorkflowOutcome, Workflows};
use common::*;
use serial_test::serial;

#[derive(Clone, Debug, Default)]
struct Trail {
  steps: Vec<&'static str>,
  stop_at: Option<&'static str>,
}

fn record(step: &'static str) -> impl Fn(ContextData<Trail>) -> std::future::Ready<Result<StepControl, TestError>> {
  move |ctx: ContextData<Trail>| {
    let mut guard = ctx.write();
    guard.steps.push(step);
    let control = if guard.stop_at == Some(step) {
      StepControl::Stop
    } else {
      StepControl::Continue
    };
    std::future::ready(Ok(control))
  }
}

fn three_steps() -> Workflow<Trail, TestError> {
  let mut wf = Workflow::<Trail, TestError>::new("three_steps", &[("first", false), ("second", true), ("third", false)]);
  wf.on("first", record("first")).on("second", record("second")).on("third", record("third"));
  wf
}

#[tokio::test]
#[serial]
async fn test_steps_run_in_declaration_order() {
  setup_tracing();
  let ctx = ContextData::new(Trail::default());

  let outcome = three_steps().run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, WorkflowOutcome::Completed);
  assert_eq!(ctx.read().steps, vec!["first", "second", "third"]);
}

#[tokio::test]
#[serial]
async fn test_stop_ends_the_run() {
  setup_tracing();
  let ctx = ContextData::new(Trail {
    stop_at: Some("second"),
    ..Trail::default()
  });

  let outcome = three_steps().run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, WorkflowOutcome::Stopped { at_step: "second" });
  assert!(!outcome.is_completed());
  assert_eq!(ctx.read().steps, vec!["first", "second"]);
}

#[tokio::test]
#[serial]
async fn test_failing_step_aborts_with_its_error() {
  setup_tracing();
  let mut wf = Workflow::<Trail, TestError>::new("failing", &[("ok", false), ("boom", false), ("never", false)]);
  wf.on("ok", record("ok"))
    .on("boom", |_ctx: ContextData<Trail>| async move { Err(TestError::Step("boom".to_string())) })
    .on("never", record("never"));
  let ctx = ContextData::new(Trail::default());

  let result = wf.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Step("boom".to_string())));
  assert_eq!(ctx.read().steps, vec!["ok"]);
}

#[tokio::test]
#[serial]
async fn test_missing_required_handler_fails_before_any_step_runs() {
  setup_tracing();
  let mut wf = Workflow::<Trail, TestError>::new("incomplete", &[("first", false), ("unwired", false)]);
  wf.on("first", record("first"));
  let ctx = ContextData::new(Trail::default());

  let result = wf.run(ctx.clone()).await;

  match result {
    Err(TestError::Core(message)) => {
      assert!(message.contains("StepHandlerMissing"));
      assert!(message.contains("unwired"));
    }
    other => panic!("Expected StepHandlerMissing, got {:?}", other),
  }
  assert!(ctx.read().steps.is_empty());
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut wf = Workflow::<Trail, TestError>::new("optional", &[("first", false), ("maybe", true)]);
  wf.on("first", record("first"));
  let ctx = ContextData::new(Trail::default());

  assert_eq!(wf.run(ctx.clone()).await, Ok(WorkflowOutcome::Completed));
  assert_eq!(ctx.read().steps, vec!["first"]);
  assert_eq!(wf.step_names(), vec!["first", "maybe"]);
}

#[test]
#[should_panic(expected = "no step named 'ghost'")]
fn test_wiring_unknown_step_panics() {
  let mut wf = Workflow::<Trail, TestError>::new("wiring", &[("first", false)]);
  wf.on("ghost", record("ghost"));
}

#[derive(Debug, Default)]
struct Counter {
  value: i32,
}

#[tokio::test]
#[serial]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let workflows = Workflows::<TestError>::new();
  workflows.register(three_steps());
  let mut counting = Workflow::<Counter, TestError>::new("counting", &[("bump", false)]);
  counting.on("bump", |ctx: ContextData<Counter>| async move {
    ctx.write().value += 41;
    Ok(StepControl::Continue)
  });
  workflows.register(counting);

  assert!(workflows.contains::<Trail>());
  assert!(workflows.contains::<Counter>());

  let trail = ContextData::new(Trail::default());
  let counter = ContextData::new(Counter { value: 1 });
  assert_eq!(workflows.run(trail.clone()).await, Ok(WorkflowOutcome::Completed));
  assert_eq!(workflows.run(counter.clone()).await, Ok(WorkflowOutcome::Completed));

  assert_eq!(trail.read().steps.len(), 3);
  assert_eq!(counter.into_inner().unwrap().value, 42);
}

#[tokio::test]
#[serial]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let workflows = Workflows::<TestError>::default();

  let result = workflows.run(ContextData::new(Counter::default())).await;

  match result {
    Err(TestError::Core(message)) => {
      assert!(message.contains("WorkflowNotRegistered"));
      assert!(message.contains("Counter"));
    }
    other => panic!("Expected WorkflowNotRegistered, got {:?}", other),
  }
}
