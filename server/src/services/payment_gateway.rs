// server/src/services/payment_gateway.rs

use crate::config::PaymentGatewayKind;
use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Smallest charge the processor accepts, in cents.
pub const MINIMUM_CHARGE_CENTS: i64 = 50;

/// Converts an order total in currency units to the amount to charge, in cents.
pub fn charge_amount_cents(total: f64) -> i64 {
  ((total * 100.0).round() as i64).max(MINIMUM_CHARGE_CENTS)
}

#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
  pub amount_cents: i64,
  pub currency: String,
  /// Connected account that receives the funds (the stall owner's).
  pub account_id: String,
  pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
  pub id: String,
  pub amount_cents: i64,
  pub currency: String,
  /// Handed to the mobile client to present the payment sheet.
  pub client_secret: String,
  pub account_id: String,
  pub metadata: HashMap<String, String>,
}

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// A webhook event from the payment processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
  #[serde(rename = "type")]
  pub event_type: String,
  /// Unix seconds.
  pub created: i64,
  pub data: PaymentEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
  pub object: PaymentEventObject,
}

/// The event's subject. Only the fields the backend reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEventObject {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
}

impl PaymentEvent {
  /// The order a payment intent was created for, if its metadata names a valid one.
  pub fn order_id(&self) -> Option<Uuid> {
    self
      .data
      .object
      .metadata
      .get("orderId")
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
  }

  pub fn occurred_at(&self) -> DateTime<Utc> {
    DateTime::from_timestamp(self.created, 0).unwrap_or_else(Utc::now)
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_payment_intent(&self, request: PaymentIntentRequest) -> anyhow::Result<PaymentIntent>;

  /// Opens a connected account for a business user; returns its id.
  async fn create_connected_account(&self, user_id: Uuid, email: &str) -> anyhow::Result<String>;
}

/// The gateway selected by `PAYMENT_GATEWAY`.
pub fn build_payment_gateway(kind: PaymentGatewayKind) -> Arc<dyn PaymentGateway> {
  match kind {
    PaymentGatewayKind::Mock => {
      warn!("Using the mock payment gateway; no payment will be charged.");
      Arc::new(MockPaymentGateway)
    }
  }
}

/// In-process stand-in for the payment processor. Intents are never charged;
/// completion arrives through the signed webhook.
#[derive(Debug, Default, Clone)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(
    name = "payment_gateway::create_payment_intent",
    skip(self, request),
    fields(amount_cents = request.amount_cents, currency = %request.currency, account_id = %request.account_id),
    err(Display)
  )]
  async fn create_payment_intent(&self, request: PaymentIntentRequest) -> anyhow::Result<PaymentIntent> {
    if request.amount_cents < MINIMUM_CHARGE_CENTS {
      bail!("Amount must be at least {} cents", MINIMUM_CHARGE_CENTS);
    }
    if request.account_id.trim().is_empty() {
      bail!("A connected account is required");
    }

    let intent_id = format!("mock_pi_{}", Uuid::new_v4().simple());
    info!(payment_intent_id = %intent_id, "Created mock payment intent.");
    Ok(PaymentIntent {
      client_secret: format!("{}_secret_{}", intent_id, Uuid::new_v4().simple()),
      id: intent_id,
      amount_cents: request.amount_cents,
      currency: request.currency,
      account_id: request.account_id,
      metadata: request.metadata,
    })
  }

  #[instrument(name = "payment_gateway::create_connected_account", skip(self, email), err(Display))]
  async fn create_connected_account(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    if email.trim().is_empty() {
      bail!("An email is required to open a connected account");
    }
    let account_id = format!("mock_acct_{}", Uuid::new_v4().simple());
    info!(%account_id, "Created mock connected account.");
    Ok(account_id)
  }
}
