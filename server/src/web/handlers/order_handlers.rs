// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use canteen_core::{ContextData, WorkflowOutcome};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{into_new_items, NewItemPayload};
use crate::db::{orders, stalls};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, Role, SubmittedOrderFood};
use crate::pipelines::contexts::{CreateOrderCtxData, UpdateOrderCtxData};
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::responses::{collection, singleton};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
  pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
  pub stall_id: Option<Uuid>,
  pub items: Option<Vec<NewItemPayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderPayload {
  pub items: Option<Vec<SubmittedOrderFood>>,
  #[serde(default)]
  pub new_items: Option<Vec<NewItemPayload>>,
}

/// Loads an order the caller may act on: 404 when missing, 403 unless owner or admin.
async fn owned_order(app_state: &AppState, user: &CurrentUser, order_id: Uuid) -> AppResult<Order> {
  let order = orders::find_order(&app_state.db_pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if !user.may_act_for(Some(order.user_id)) {
    return Err(AppError::unauthorized());
  }
  Ok(order)
}

#[instrument(name = "handler::list_orders", skip(app_state, query, user), fields(user_id = %user.id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrdersQuery>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let orders = match (user.role, query.user_id) {
    (Role::Admin, Some(user_id)) => orders::orders_of_user(pool, user_id).await?,
    (Role::Business, _) => orders::orders_of_stall_owner(pool, user.id).await?,
    _ => orders::orders_of_user(pool, user.id).await?,
  };
  let views = orders::load_order_views(pool, orders).await?;
  info!(count = views.len(), "Orders listed.");
  Ok(HttpResponse::Ok().json(collection(&views, None)))
}

#[instrument(name = "handler::get_order", skip(app_state, path, user), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let order = owned_order(&app_state, &user, path.into_inner()).await?;
  let view = orders::load_order_view(&app_state.db_pool, order).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::create_order", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateOrderPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let CreateOrderPayload { stall_id, items } = payload.into_inner();
  let (Some(stall_id), Some(items)) = (stall_id, items) else {
    return Err(AppError::missing_fields(&[("items", "Required"), ("stallId", "Required")]));
  };

  let ctx = ContextData::new(CreateOrderCtxData {
    app_state: app_state.get_ref().clone(),
    user,
    stall_id,
    items: into_new_items(items),
    menu_id: None,
    order_id: None,
    order: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      let order = ctx.read().order.clone().ok_or_else(|| {
        warn!("create_order completed but the order was not loaded.");
        AppError::Internal("Order was created, but its details are unavailable.".to_string())
      })?;
      Ok(HttpResponse::Created().json(singleton(&order, Some("Order successfully created"))))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      warn!(at_step, "create_order was stopped early.");
      Err(AppError::WorkflowHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::update_order", skip(app_state, path, payload, user), fields(order_id = %path.as_ref()))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateOrderPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let UpdateOrderPayload { items, new_items } = payload.into_inner();
  let Some(submitted) = items else {
    return Err(AppError::missing_fields(&[("items", "Required"), ("newItems", "Optional")]));
  };

  let ctx = ContextData::new(UpdateOrderCtxData {
    app_state: app_state.get_ref().clone(),
    user,
    order_id: path.into_inner(),
    submitted,
    new_items: into_new_items(new_items.unwrap_or_default()),
    menu_id: None,
    summary: None,
    order: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      let guard = ctx.read();
      let order = guard.order.as_ref().ok_or_else(|| {
        warn!("update_order completed but the order was not reloaded.");
        AppError::Internal("Order was updated, but its details are unavailable.".to_string())
      })?;
      info!(summary = ?guard.summary, "Order updated.");
      Ok(HttpResponse::Ok().json(singleton(order, Some("Order successfully updated"))))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      warn!(at_step, "update_order was stopped early.");
      Err(AppError::WorkflowHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::delete_order", skip(app_state, path, user), fields(order_id = %path.as_ref()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let order = owned_order(&app_state, &user, path.into_inner()).await?;
  if order.paid {
    return Err(AppError::Validation("Cannot delete paid order".to_string()));
  }

  let view = orders::load_order_view(&app_state.db_pool, order).await?;
  orders::delete_order(&app_state.db_pool, view.order.id).await?;
  info!(order_id = %view.order.id, "Order deleted.");
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Order successfully deleted"))))
}

/// Only the stall's owner (or an admin) can mark an order as handed over.
#[instrument(name = "handler::fulfill_order", skip(app_state, path, user), fields(order_id = %path.as_ref()))]
pub async fn fulfill_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let order = orders::find_order(pool, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let stall = stalls::find_stall(pool, order.stall_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Stall not found".to_string()))?;
  if !user.may_act_for(stall.owner_id) {
    return Err(AppError::unauthorized());
  }
  if order.fulfilled {
    return Err(AppError::Validation("Order already fulfilled".to_string()));
  }

  let fulfilled = orders::mark_fulfilled(pool, order.id).await?;
  let view = orders::load_order_view(pool, fulfilled).await?;
  info!(order_id = %view.order.id, "Order fulfilled.");
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Order fulfilled"))))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn update_payload_reads_camel_case_links() {
    let order_id = Uuid::new_v4();
    let food_id = Uuid::new_v4();
    let payload: UpdateOrderPayload = serde_json::from_value(json!({
      "items": [{"orderId": order_id, "foodId": food_id, "count": 3}]
    }))
    .unwrap();

    let items = payload.items.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].order_id, order_id);
    assert_eq!(items[0].food_id, food_id);
    assert_eq!(items[0].count, 3);
    assert!(payload.new_items.is_none());
  }

  #[test]
  fn create_payload_tolerates_missing_fields() {
    let payload: CreateOrderPayload = serde_json::from_value(json!({})).unwrap();
    assert!(payload.stall_id.is_none());
    assert!(payload.items.is_none());
  }
}
