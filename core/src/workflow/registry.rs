// core/src/workflow/registry.rs

//! `Workflows<E>`: one registered workflow per context type.

use super::context_data::ContextData;
use super::control::WorkflowOutcome;
use super::definition::Workflow;
use crate::error::CoreError;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

pub struct Workflows<E> {
  by_context: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
  _error: PhantomData<fn() -> E>,
}

impl<E> Workflows<E>
where
  E: From<CoreError> + Display + Send + 'static,
{
  pub fn new() -> Self {
    Self {
      by_context: RwLock::new(HashMap::new()),
      _error: PhantomData,
    }
  }

  /// Registers `workflow` for its context type `T`, replacing an earlier registration.
  pub fn register<T: Send + Sync + 'static>(&self, workflow: Workflow<T, E>) {
    debug!(workflow = workflow.name(), context_type = %type_name::<T>(), "Registering workflow.");
    self.by_context.write().insert(TypeId::of::<T>(), Arc::new(workflow));
  }

  pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
    self.by_context.read().contains_key(&TypeId::of::<T>())
  }

  /// Runs the workflow registered for `T`.
  pub async fn run<T: Send + Sync + 'static>(&self, ctx: ContextData<T>) -> Result<WorkflowOutcome, E> {
    let registered = self.by_context.read().get(&TypeId::of::<T>()).cloned();
    let workflow = registered
      .and_then(|entry| entry.downcast::<Workflow<T, E>>().ok())
      .ok_or_else(|| {
        error!(context_type = %type_name::<T>(), "No workflow registered for context type.");
        E::from(CoreError::WorkflowNotRegistered {
          context_type: type_name::<T>().to_string(),
        })
      })?;
    workflow.run(ctx).await
  }
}

impl<E> Default for Workflows<E>
where
  E: From<CoreError> + Display + Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
