// core/src/workflow/mod.rs

//! Named async steps over shared context data.
//!
//! A `Workflow<T, E>` is an ordered list of steps, each with at most one handler.
//! Handlers receive a clone of `ContextData<T>` and return `StepControl` or the
//! workflow's error type `E`. `Workflows<E>` keeps one workflow per context type
//! so HTTP handlers only need to build the context and call `run`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod registry;

pub use context_data::ContextData;
pub use control::{StepControl, WorkflowOutcome};
pub use definition::{StepHandler, Workflow};
pub use registry::Workflows;
