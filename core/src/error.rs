// core/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("Workflow '{workflow}' has no handler for required step '{step}'")]
  StepHandlerMissing { workflow: String, step: String },

  #[error("No workflow registered for context type {context_type}")]
  WorkflowNotRegistered { context_type: String },
}

pub type CoreResult<T, E = CoreError> = std::result::Result<T, E>;
