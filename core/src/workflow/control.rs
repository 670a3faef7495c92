// core/src/workflow/control.rs

/// Returned by a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Go on with the next step.
  Continue,
  /// End the run here; remaining steps are not executed.
  Stop,
}

/// How a workflow run ended when no step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
  Completed,
  Stopped { at_step: &'static str },
}

impl WorkflowOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, WorkflowOutcome::Completed)
  }
}
