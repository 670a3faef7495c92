// server/src/web/handlers/menu_handlers.rs

use actix_web::{web, HttpResponse};
use canteen_core::{enrich_drafts, FoodDraft};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{self, foods, menus, stalls};
use crate::errors::{AppError, Result as AppResult};
use crate::models::Role;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::responses::singleton;

const CREATE_FORBIDDEN: &str = "Unauthorized. Only business owners and admins can create menus";
const DELETE_FORBIDDEN: &str = "Unauthorized. Only business owners and admins can delete menus";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuPayload {
  pub stall_id: Option<Uuid>,
  pub items: Option<Vec<FoodDraft>>,
}

#[instrument(name = "handler::get_menu", skip(app_state, path), fields(menu_id = %path.as_ref()))]
pub async fn get_menu_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let menu = menus::find_menu(&app_state.db_pool, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))?;
  let view = menus::load_menu_view(&app_state.db_pool, menu).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

/// Creates a stall's menu with all of its foods. Drafts are enriched first; the
/// menu and its foods are then written in one transaction.
#[instrument(name = "handler::create_menu", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn create_menu_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateMenuPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  if !matches!(user.role, Role::Business | Role::Admin) {
    return Err(AppError::Forbidden(CREATE_FORBIDDEN.to_string()));
  }
  let CreateMenuPayload { stall_id, items } = payload.into_inner();
  let (Some(stall_id), Some(drafts)) = (stall_id, items) else {
    return Err(AppError::missing_fields(&[("items", "Required"), ("stallId", "Required")]));
  };
  for draft in &drafts {
    draft.validate_for_create().map_err(AppError::Validation)?;
  }

  let pool = &app_state.db_pool;
  let stall = stalls::find_stall(pool, stall_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Stall not found".to_string()))?;
  if !user.may_act_for(stall.owner_id) {
    return Err(AppError::Forbidden(CREATE_FORBIDDEN.to_string()));
  }

  let drafts = enrich_drafts(app_state.nutrition.as_ref(), drafts).await;

  let mut tx = pool.begin().await?;
  let menu = menus::insert_menu(&mut *tx, stall.id).await.map_err(|e| {
    if db::is_unique_violation(&e) {
      AppError::Conflict("Stall already has a menu".to_string())
    } else {
      AppError::Sqlx(e)
    }
  })?;
  for draft in &drafts {
    foods::insert_food(&mut *tx, Some(menu.id), draft).await?;
  }
  tx.commit().await?;

  info!(menu_id = %menu.id, foods = drafts.len(), "Menu created.");
  let view = menus::load_menu_view(pool, menu).await?;
  Ok(HttpResponse::Created().json(singleton(&view, Some("Menu created successfully"))))
}

#[instrument(name = "handler::delete_menu", skip(app_state, path, user), fields(menu_id = %path.as_ref()))]
pub async fn delete_menu_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let menu = menus::find_menu(pool, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))?;
  let owner_id = stalls::find_stall(pool, menu.stall_id).await?.and_then(|stall| stall.owner_id);
  if !user.may_act_for(owner_id) {
    return Err(AppError::Forbidden(DELETE_FORBIDDEN.to_string()));
  }

  menus::delete_menu(pool, menu.id).await?;
  info!(menu_id = %menu.id, "Menu deleted.");
  Ok(HttpResponse::Ok().json(singleton(&menu, Some("Menu successfully deleted"))))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn menu_items_are_plain_food_drafts() {
    let stall_id = Uuid::new_v4();
    let payload: CreateMenuPayload = serde_json::from_value(json!({
      "stallId": stall_id,
      "items": [{"name": "Nasi Lemak", "price": 4.0, "servingQty": 1.0}]
    }))
    .unwrap();

    assert_eq!(payload.stall_id, Some(stall_id));
    let items = payload.items.unwrap();
    assert_eq!(items[0].name, "Nasi Lemak");
    assert_eq!(items[0].price, Some(4.0));
    assert_eq!(items[0].serving_qty, Some(1.0));
  }
}
