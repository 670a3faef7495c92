// server/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use canteen_core::{ContextData, WorkflowOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::users;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::{PaymentSheetCtxData, PaymentWebhookCtxData};
use crate::services::webhook_signature::SIGNATURE_HEADER;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishableKeyQuery {
  // Kept as text so a malformed id gets its own message.
  pub stall_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheetPayload {
  pub order_id: Option<Uuid>,
}

/// The publishable key, plus the stall owner's payment account when `stallId` is given.
#[instrument(name = "handler::publishable_key", skip(app_state, query, user), fields(user_id = %user.id))]
pub async fn publishable_key_handler(
  app_state: web::Data<AppState>,
  query: web::Query<PublishableKeyQuery>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let publishable_key = &app_state.config.payment_publishable_key;
  let Some(raw_stall_id) = query.stall_id.as_deref() else {
    return Ok(HttpResponse::Ok().json(json!({ "publishableKey": publishable_key })));
  };

  let stall_id = Uuid::parse_str(raw_stall_id).map_err(|_| AppError::Validation("Invalid stallId".to_string()))?;
  let owner = users::stall_owner(&app_state.db_pool, stall_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Stall owner not found".to_string()))?;
  let account_id = owner
    .payment_account_id
    .ok_or_else(|| AppError::NotFound("Stall owner has not connected a payment account".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({
    "publishableKey": publishable_key,
    "paymentAccountId": account_id,
  })))
}

#[instrument(name = "handler::payment_sheet", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn payment_sheet_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PaymentSheetPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let Some(order_id) = payload.into_inner().order_id else {
    return Err(AppError::missing_fields(&[("orderId", "Required")]));
  };

  let ctx = ContextData::new(PaymentSheetCtxData {
    app_state: app_state.get_ref().clone(),
    user,
    order_id,
    order: None,
    account_id: None,
    amount_cents: None,
    intent: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      let guard = ctx.read();
      let intent = guard.intent.as_ref().ok_or_else(|| {
        warn!("payment_sheet completed without a payment intent.");
        AppError::Internal("Payment intent is unavailable.".to_string())
      })?;
      info!(%order_id, amount_cents = intent.amount_cents, "Payment sheet prepared.");
      Ok(HttpResponse::Ok().json(json!({
        "paymentIntent": intent.client_secret,
        "paymentAccountId": intent.account_id,
        "publishableKey": app_state.config.payment_publishable_key,
      })))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      warn!(at_step, "payment_sheet was stopped early.");
      Err(AppError::WorkflowHalted)
    }
    Err(e) => Err(e),
  }
}

/// Payment processor callback. Any verified event is acknowledged with 200,
/// including the ones the workflow chose not to act on.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> AppResult<HttpResponse> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|value| value.to_str().ok())
    .map(String::from);

  let ctx = ContextData::new(PaymentWebhookCtxData {
    app_state: app_state.get_ref().clone(),
    raw_payload: body,
    signature,
    event: None,
    paid_order_id: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      info!(paid_order_id = ?ctx.read().paid_order_id, "Webhook processed.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      info!(at_step, "Webhook acknowledged without changes.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    Err(e) => Err(e),
  }
}
