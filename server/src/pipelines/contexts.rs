// server/src/pipelines/contexts.rs

//! Data carried through each workflow run. Handlers wrap these in
//! `canteen_core::ContextData` and read the results back once the run completes.

use crate::models::{EntryView, OrderView, SubmittedEntryFood, SubmittedOrderFood};
use crate::services::payment_gateway::{PaymentEvent, PaymentIntent};
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use actix_web::web::Bytes;
use canteen_core::{EditSummary, FoodDraft, NewItem};
use uuid::Uuid;

pub type NewFoodItem = NewItem<Uuid, FoodDraft>;

#[derive(Clone)]
pub struct CreateOrderCtxData {
  pub app_state: AppState,
  pub user: CurrentUser,
  pub stall_id: Uuid,
  pub items: Vec<NewFoodItem>,
  // Set by the workflow:
  pub menu_id: Option<Uuid>,
  pub order_id: Option<Uuid>,
  pub order: Option<OrderView>,
}

#[derive(Clone)]
pub struct UpdateOrderCtxData {
  pub app_state: AppState,
  pub user: CurrentUser,
  pub order_id: Uuid,
  pub submitted: Vec<SubmittedOrderFood>,
  pub new_items: Vec<NewFoodItem>,
  pub menu_id: Option<Uuid>,
  pub summary: Option<EditSummary>,
  pub order: Option<OrderView>,
}

#[derive(Clone)]
pub struct CreateEntryCtxData {
  pub app_state: AppState,
  pub user: CurrentUser,
  pub items: Vec<NewFoodItem>,
  pub tracker_id: Option<Uuid>,
  pub entry_id: Option<Uuid>,
  pub entry: Option<EntryView>,
}

#[derive(Clone)]
pub struct UpdateEntryCtxData {
  pub app_state: AppState,
  pub user: CurrentUser,
  pub entry_id: Uuid,
  pub submitted: Vec<SubmittedEntryFood>,
  pub new_items: Vec<NewFoodItem>,
  pub summary: Option<EditSummary>,
  pub entry: Option<EntryView>,
}

#[derive(Clone)]
pub struct PaymentSheetCtxData {
  pub app_state: AppState,
  pub user: CurrentUser,
  pub order_id: Uuid,
  pub order: Option<OrderView>,
  pub account_id: Option<String>,
  pub amount_cents: Option<i64>,
  pub intent: Option<PaymentIntent>,
}

#[derive(Clone)]
pub struct PaymentWebhookCtxData {
  pub app_state: AppState,
  pub raw_payload: Bytes,
  pub signature: Option<String>,
  pub event: Option<PaymentEvent>,
  pub paid_order_id: Option<Uuid>,
}
