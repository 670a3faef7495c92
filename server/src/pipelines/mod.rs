// server/src/pipelines/mod.rs

//! Workflows behind the order, caloric tracker entry and payment endpoints.

use crate::errors::AppError;
use canteen_core::Workflows;

pub mod common_steps;
pub mod contexts;

pub mod order_pipeline;
pub mod payment_pipeline;
pub mod tracker_entry_pipeline;

/// Registers every workflow once, at startup.
pub fn register_all_workflows(workflows: &Workflows<AppError>) {
  tracing::info!("Registering workflows...");

  order_pipeline::register_order_workflows(workflows);
  tracker_entry_pipeline::register_tracker_entry_workflows(workflows);
  payment_pipeline::register_payment_workflows(workflows);

  tracing::info!("All application workflows registered.");
}
