// server/src/pipelines/payment_pipeline.rs

//! Payment sheet creation and the payment processor's webhook.

use crate::db::{orders, users};
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::{PaymentSheetCtxData, PaymentWebhookCtxData};
use crate::services::payment_gateway::{charge_amount_cents, PaymentEvent, PaymentIntentRequest, PAYMENT_INTENT_SUCCEEDED};
use crate::services::webhook_signature;
use canteen_core::{ContextData, StepControl, Workflow, Workflows};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

pub fn register_payment_workflows(workflows: &Workflows<AppError>) {
  let mut sheet = Workflow::<PaymentSheetCtxData, AppError>::new(
    "payment_sheet",
    &[
      ("load_unpaid_order", false),
      ("resolve_payment_account", false),
      ("compute_amount", false),
      ("create_payment_intent", false),
    ],
  );
  sheet
    .on("load_unpaid_order", load_unpaid_order)
    .on("resolve_payment_account", resolve_payment_account)
    .on("compute_amount", compute_amount)
    .on("create_payment_intent", create_payment_intent);
  workflows.register(sheet);

  let mut webhook = Workflow::<PaymentWebhookCtxData, AppError>::new(
    "payment_webhook",
    &[
      ("verify_signature", false),
      ("parse_event", false),
      ("mark_order_paid", false),
    ],
  );
  webhook
    .on("verify_signature", verify_signature)
    .on("parse_event", parse_event)
    .on("mark_order_paid", mark_order_paid);
  workflows.register(webhook);
}

// --- payment_sheet ---

#[instrument(name = "payment_step::load_unpaid_order", skip(ctx), err(Display))]
async fn load_unpaid_order(ctx: ContextData<PaymentSheetCtxData>) -> AppResult<StepControl> {
  let (order_id, user, pool) = {
    let guard = ctx.read();
    (guard.order_id, guard.user.clone(), guard.app_state.db_pool.clone())
  };
  let order = orders::find_order(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if !user.may_act_for(Some(order.user_id)) {
    return Err(AppError::unauthorized());
  }
  // Paid orders are reported as not found, which mobile clients already handle.
  if order.paid {
    return Err(AppError::NotFound("Order has already been paid".to_string()));
  }
  let view = orders::load_order_view(&pool, order).await?;
  ctx.write().order = Some(view);
  Ok(StepControl::Continue)
}

#[instrument(name = "payment_step::resolve_payment_account", skip(ctx), err(Display))]
async fn resolve_payment_account(ctx: ContextData<PaymentSheetCtxData>) -> AppResult<StepControl> {
  let (stall_id, pool) = {
    let guard = ctx.read();
    (guard.order.as_ref().map(|o| o.order.stall_id), guard.app_state.db_pool.clone())
  };
  let stall_id = stall_id.ok_or_else(|| AppError::Internal("Order was not loaded.".to_string()))?;

  let owner = users::stall_owner(&pool, stall_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Stall owner not found".to_string()))?;
  let account_id = owner
    .payment_account_id
    .ok_or_else(|| AppError::NotFound("Stall owner has not connected a payment account".to_string()))?;
  ctx.write().account_id = Some(account_id);
  Ok(StepControl::Continue)
}

#[instrument(name = "payment_step::compute_amount", skip(ctx), err(Display))]
async fn compute_amount(ctx: ContextData<PaymentSheetCtxData>) -> AppResult<StepControl> {
  let mut guard = ctx.write();
  let total = guard
    .order
    .as_ref()
    .map(|o| o.total_price())
    .ok_or_else(|| AppError::Internal("Order was not loaded.".to_string()))?;
  let amount_cents = charge_amount_cents(total);
  info!(total, amount_cents, "Charge amount computed.");
  guard.amount_cents = Some(amount_cents);
  Ok(StepControl::Continue)
}

#[instrument(name = "payment_step::create_payment_intent", skip(ctx), err(Display))]
async fn create_payment_intent(ctx: ContextData<PaymentSheetCtxData>) -> AppResult<StepControl> {
  let (order_id, account_id, amount_cents, currency, gateway) = {
    let guard = ctx.read();
    (
      guard.order_id,
      guard.account_id.clone(),
      guard.amount_cents,
      guard.app_state.config.payment_currency.clone(),
      guard.app_state.payments.clone(),
    )
  };
  let (Some(account_id), Some(amount_cents)) = (account_id, amount_cents) else {
    return Err(AppError::Internal("Payment account or amount missing.".to_string()));
  };

  let request = PaymentIntentRequest {
    amount_cents,
    currency,
    account_id,
    metadata: HashMap::from([("orderId".to_string(), order_id.to_string())]),
  };
  let intent = gateway
    .create_payment_intent(request)
    .await
    .map_err(|e| AppError::Payment(e.to_string()))?;
  info!(payment_intent_id = %intent.id, currency = %intent.currency, "Payment intent created.");
  ctx.write().intent = Some(intent);
  Ok(StepControl::Continue)
}

// --- payment_webhook ---

#[instrument(name = "payment_step::verify_signature", skip(ctx), err(Display))]
async fn verify_signature(ctx: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let guard = ctx.read();
  let signature = guard
    .signature
    .as_deref()
    .ok_or_else(|| AppError::Validation(format!("Webhook Error: missing {} header", webhook_signature::SIGNATURE_HEADER)))?;
  if !webhook_signature::verify(&guard.app_state.config.payment_webhook_secret, &guard.raw_payload, signature) {
    warn!("Webhook signature mismatch.");
    return Err(AppError::Validation("Webhook Error: signature verification failed".to_string()));
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "payment_step::parse_event", skip(ctx), err(Display))]
async fn parse_event(ctx: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let mut guard = ctx.write();
  let event: PaymentEvent = serde_json::from_slice(&guard.raw_payload)
    .map_err(|e| AppError::Validation(format!("Webhook Error: {}", e)))?;
  info!(event_type = %event.event_type, "Webhook event received.");
  guard.event = Some(event);
  Ok(StepControl::Continue)
}

/// Acts on `payment_intent.succeeded`; every other event type is acknowledged and left alone.
#[instrument(name = "payment_step::mark_order_paid", skip(ctx), err(Display))]
async fn mark_order_paid(ctx: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let (event, pool) = {
    let guard = ctx.read();
    (guard.event.clone(), guard.app_state.db_pool.clone())
  };
  let event = event.ok_or_else(|| AppError::Internal("Webhook event was not parsed.".to_string()))?;

  if event.event_type != PAYMENT_INTENT_SUCCEEDED {
    info!(event_type = %event.event_type, "Unhandled event type.");
    return Ok(StepControl::Stop);
  }
  let Some(order_id) = event.order_id() else {
    warn!("Succeeded payment intent carries no valid orderId.");
    return Ok(StepControl::Stop);
  };

  if orders::mark_paid(&pool, order_id, event.occurred_at()).await? == 0 {
    warn!(%order_id, "Paid order does not exist.");
    return Ok(StepControl::Stop);
  }
  info!(%order_id, payment_intent_id = ?event.data.object.id, "Order marked as paid.");
  ctx.write().paid_order_id = Some(order_id);
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payment_workflows_register_for_their_contexts() {
    let workflows = Workflows::<AppError>::new();
    register_payment_workflows(&workflows);
    assert!(workflows.contains::<PaymentSheetCtxData>());
    assert!(workflows.contains::<PaymentWebhookCtxData>());
  }
}
