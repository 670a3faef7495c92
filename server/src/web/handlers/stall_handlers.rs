// server/src/web/handlers/stall_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::review_handlers::ReviewPayload;
use super::{present, require_admin};
use crate::db::{self, reviews, stalls};
use crate::errors::{AppError, Result as AppResult};
use crate::models::Stall;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::responses::{collection, singleton};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStallPayload {
  pub name: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  pub canteen_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStallPayload {
  pub name: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  /// Moves the stall to another canteen when given.
  #[serde(default)]
  pub canteen_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOwnerPayload {
  pub owner_id: Option<Uuid>,
}

fn stall_not_found() -> AppError {
  AppError::NotFound("Stall not found".to_string())
}

fn missing_canteen(err: sqlx::Error) -> AppError {
  if db::is_foreign_key_violation(&err) {
    AppError::NotFound("Canteen not found".to_string())
  } else {
    AppError::Sqlx(err)
  }
}

/// Loads a stall the caller may manage: 404 when missing, 403 unless its owner or an admin.
async fn managed_stall(app_state: &AppState, user: &CurrentUser, stall_id: Uuid) -> AppResult<Stall> {
  let stall = stalls::find_stall(&app_state.db_pool, stall_id)
    .await?
    .ok_or_else(stall_not_found)?;
  if !user.may_act_for(stall.owner_id) {
    return Err(AppError::unauthorized());
  }
  Ok(stall)
}

#[instrument(name = "handler::list_stalls", skip(app_state))]
pub async fn list_stalls_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let views = stalls::load_stall_views(pool, stalls::list_stalls(pool).await?).await?;
  Ok(HttpResponse::Ok().json(collection(&views, None)))
}

#[instrument(name = "handler::get_stall", skip(app_state, path), fields(stall_id = %path.as_ref()))]
pub async fn get_stall_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let stall = stalls::find_stall(pool, path.into_inner())
    .await?
    .ok_or_else(stall_not_found)?;
  let view = stalls::load_stall_view(pool, stall).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::create_stall", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn create_stall_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateStallPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  require_admin(&user)?;
  let CreateStallPayload {
    name,
    description,
    canteen_id,
  } = payload.into_inner();
  let (Some(name), Some(canteen_id)) = (present(name), canteen_id) else {
    return Err(AppError::missing_fields(&[
      ("name", "Required"),
      ("canteenId", "Required and must be a number"),
    ]));
  };

  let pool = &app_state.db_pool;
  let stall = stalls::insert_stall(pool, &name, description.as_deref(), canteen_id)
    .await
    .map_err(missing_canteen)?;
  info!(stall_id = %stall.id, %canteen_id, "Stall created.");
  let view = stalls::load_stall_view(pool, stall).await?;
  Ok(HttpResponse::Created().json(singleton(&view, Some("Stall created successfully"))))
}

#[instrument(name = "handler::update_stall", skip(app_state, path, payload, user), fields(stall_id = %path.as_ref()))]
pub async fn update_stall_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateStallPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let stall = managed_stall(&app_state, &user, path.into_inner()).await?;
  let UpdateStallPayload {
    name,
    description,
    canteen_id,
  } = payload.into_inner();
  let Some(name) = present(name) else {
    return Err(AppError::missing_fields(&[("name", "Required")]));
  };

  let pool = &app_state.db_pool;
  let updated = stalls::update_stall(pool, stall.id, &name, description.as_deref(), canteen_id)
    .await
    .map_err(missing_canteen)?
    .ok_or_else(stall_not_found)?;
  info!(stall_id = %updated.id, "Stall updated.");
  let view = stalls::load_stall_view(pool, updated).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Stall updated successfully"))))
}

#[instrument(name = "handler::delete_stall", skip(app_state, path, user), fields(stall_id = %path.as_ref()))]
pub async fn delete_stall_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let stall = managed_stall(&app_state, &user, path.into_inner()).await?;

  stalls::delete_stall(&app_state.db_pool, stall.id).await.map_err(|e| {
    if db::is_foreign_key_violation(&e) {
      AppError::Conflict("Stall still has orders".to_string())
    } else {
      AppError::Sqlx(e)
    }
  })?;
  info!(stall_id = %stall.id, "Stall deleted.");
  Ok(HttpResponse::Ok().json(singleton(&Option::<Stall>::None, Some("Stall deleted successfully"))))
}

/// Admins hand a stall to its owner, usually a business account.
#[instrument(name = "handler::assign_stall_owner", skip(app_state, path, payload, user), fields(stall_id = %path.as_ref()))]
pub async fn assign_owner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<AssignOwnerPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let Some(owner_id) = payload.into_inner().owner_id else {
    return Err(AppError::missing_fields(&[("ownerId", "Required")]));
  };
  require_admin(&user)?;

  let pool = &app_state.db_pool;
  let stall = stalls::assign_owner(pool, path.into_inner(), owner_id)
    .await
    .map_err(|e| {
      if db::is_foreign_key_violation(&e) {
        AppError::NotFound("User not found".to_string())
      } else {
        AppError::Sqlx(e)
      }
    })?
    .ok_or_else(stall_not_found)?;
  info!(stall_id = %stall.id, %owner_id, "Stall owner assigned.");
  let view = stalls::load_stall_view(pool, stall).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Owner assigned successfully"))))
}

#[instrument(name = "handler::create_stall_review", skip(app_state, path, payload, user), fields(stall_id = %path.as_ref()))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let (rating, description) = payload.into_inner().required(&[
    ("rating", "Required: number"),
    ("description", "Optional: string | null"),
  ])?;

  let pool = &app_state.db_pool;
  let stall = stalls::find_stall(pool, path.into_inner())
    .await?
    .ok_or_else(stall_not_found)?;
  let review = reviews::insert_review(pool, stall.id, user.id, rating, description.as_deref()).await?;
  info!(review_id = %review.id, stall_id = %stall.id, rating, "Stall reviewed.");
  let view = reviews::review_view(pool, review).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Stall review successfully created"))))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn create_payload_reads_camel_case_fields() {
    let canteen_id = Uuid::new_v4();
    let payload: CreateStallPayload = serde_json::from_value(json!({
      "name": "Western",
      "canteenId": canteen_id
    }))
    .unwrap();
    assert_eq!(payload.name.as_deref(), Some("Western"));
    assert_eq!(payload.description, None);
    assert_eq!(payload.canteen_id, Some(canteen_id));
  }

  #[test]
  fn missing_owner_id_deserializes_to_none() {
    let payload: AssignOwnerPayload = serde_json::from_value(json!({})).unwrap();
    assert!(payload.owner_id.is_none());
  }

  #[test]
  fn non_constraint_errors_stay_database_errors() {
    let err = missing_canteen(sqlx::Error::RowNotFound);
    assert!(matches!(err, AppError::Sqlx(sqlx::Error::RowNotFound)));
  }
}
