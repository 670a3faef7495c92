// core/src/workflow/definition.rs

//! `Workflow<T, E>`: construction and execution.

use super::context_data::ContextData;
use super::control::{StepControl, WorkflowOutcome};
use crate::error::CoreError;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

pub type StepFuture<E> = Pin<Box<dyn Future<Output = Result<StepControl, E>> + Send>>;

/// A step handler: takes a clone of the run's context, resolves to a control signal.
pub type StepHandler<T, E> = Box<dyn Fn(ContextData<T>) -> StepFuture<E> + Send + Sync>;

struct Step<T: Send + Sync + 'static, E> {
  name: &'static str,
  optional: bool,
  handler: Option<StepHandler<T, E>>,
}

pub struct Workflow<T: Send + Sync + 'static, E> {
  name: &'static str,
  steps: Vec<Step<T, E>>,
}

impl<T, E> Workflow<T, E>
where
  T: Send + Sync + 'static,
  E: From<CoreError> + Display + Send + 'static,
{
  /// Declares the steps in execution order as `(name, optional)` pairs.
  pub fn new(name: &'static str, steps: &[(&'static str, bool)]) -> Self {
    Self {
      name,
      steps: steps
        .iter()
        .map(|&(name, optional)| Step {
          name,
          optional,
          handler: None,
        })
        .collect(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&'static str> {
    self.steps.iter().map(|s| s.name).collect()
  }

  /// Sets the handler of `step`, replacing any previous one.
  ///
  /// Panics if `step` was not declared: that is a wiring mistake, not a runtime condition.
  pub fn on<F, Fut>(&mut self, step: &str, handler: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, E>> + Send + 'static,
  {
    let workflow_name = self.name;
    let slot = self
      .steps
      .iter_mut()
      .find(|s| s.name == step)
      .unwrap_or_else(|| panic!("Workflow '{}' has no step named '{}'.", workflow_name, step));
    slot.handler = Some(Box::new(move |ctx| -> StepFuture<E> { Box::pin(handler(ctx)) }));
    self
  }

  /// Runs every step in order against `ctx`.
  ///
  /// Required steps without a handler are reported before anything runs.
  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(workflow = self.name, steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: ContextData<T>) -> Result<WorkflowOutcome, E> {
    if let Some(step) = self.steps.iter().find(|s| !s.optional && s.handler.is_none()) {
      error!(step = step.name, "Required step has no handler.");
      return Err(E::from(CoreError::StepHandlerMissing {
        workflow: self.name.to_string(),
        step: step.name.to_string(),
      }));
    }

    for (index, step) in self.steps.iter().enumerate() {
      let Some(handler) = &step.handler else {
        debug!(step = step.name, "Optional step has no handler, skipping.");
        continue;
      };

      let span = info_span!("workflow_step", step = step.name, index);
      match handler(ctx.clone()).instrument(span).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Stop) => {
          info!(step = step.name, "Workflow stopped by step.");
          return Ok(WorkflowOutcome::Stopped { at_step: step.name });
        }
        Err(e) => {
          warn!(step = step.name, error = %e, "Workflow step failed.");
          return Err(e);
        }
      }
    }

    debug!("Workflow completed.");
    Ok(WorkflowOutcome::Completed)
  }
}
