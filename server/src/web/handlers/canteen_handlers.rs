// server/src/web/handlers/canteen_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{self, canteens};
use crate::errors::{AppError, Result as AppResult};
use crate::services::geocoding::{coordinates_or_origin, Coordinates};
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::handlers::{present, require_admin};
use crate::web::responses::{collection, singleton};

#[derive(Debug, Deserialize)]
pub struct CanteenPayload {
  pub name: Option<String>,
  pub address: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

struct CanteenFields {
  name: String,
  address: String,
  description: Option<String>,
}

impl CanteenPayload {
  fn required(self) -> AppResult<CanteenFields> {
    match (present(self.name), present(self.address)) {
      (Some(name), Some(address)) => Ok(CanteenFields {
        name,
        address,
        description: self.description,
      }),
      _ => Err(AppError::missing_fields(&[("name", "Required"), ("address", "Required")])),
    }
  }
}

/// Coordinates for `address`: the stored location when one exists, else the geocoder's answer.
async fn coordinates_for(app_state: &AppState, address: &str) -> AppResult<Coordinates> {
  if let Some(location) = canteens::find_location_by_address(&app_state.db_pool, address).await? {
    debug!(location_id = %location.id, "Reusing stored location.");
    return Ok(Coordinates {
      latitude: location.latitude,
      longitude: location.longitude,
    });
  }
  Ok(coordinates_or_origin(app_state.geocoder.as_ref(), address).await)
}

#[instrument(name = "handler::list_canteens", skip(app_state))]
pub async fn list_canteens_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let canteens = canteens::list_canteens(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(collection(&canteens, None)))
}

#[instrument(name = "handler::get_canteen", skip(app_state, path), fields(canteen_id = %path.as_ref()))]
pub async fn get_canteen_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let canteen = canteens::find_canteen(&app_state.db_pool, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Canteen not found".to_string()))?;
  Ok(HttpResponse::Ok().json(singleton(&canteen, None)))
}

#[instrument(name = "handler::create_canteen", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn create_canteen_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CanteenPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  require_admin(&user)?;
  let fields = payload.into_inner().required()?;
  let coordinates = coordinates_for(&app_state, &fields.address).await?;

  let pool = &app_state.db_pool;
  let mut tx = pool.begin().await?;
  let location =
    canteens::connect_or_create_location(&mut *tx, &fields.address, coordinates.latitude, coordinates.longitude)
      .await?;
  let canteen = canteens::insert_canteen(&mut *tx, &fields.name, fields.description.as_deref(), location.id).await?;
  tx.commit().await?;

  info!(canteen_id = %canteen.id, "Canteen created.");
  let view = canteens::canteen_view(pool, canteen).await?;
  Ok(HttpResponse::Created().json(singleton(&view, Some("Canteen created successfully"))))
}

#[instrument(name = "handler::update_canteen", skip(app_state, path, payload, user), fields(canteen_id = %path.as_ref()))]
pub async fn update_canteen_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CanteenPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  require_admin(&user)?;
  let canteen_id = path.into_inner();
  let fields = payload.into_inner().required()?;
  let coordinates = coordinates_for(&app_state, &fields.address).await?;

  let pool = &app_state.db_pool;
  let mut tx = pool.begin().await?;
  let location =
    canteens::connect_or_create_location(&mut *tx, &fields.address, coordinates.latitude, coordinates.longitude)
      .await?;
  let canteen = canteens::update_canteen(&mut *tx, canteen_id, &fields.name, fields.description.as_deref(), location.id)
    .await?
    .ok_or_else(|| AppError::NotFound("Canteen not found".to_string()))?;
  tx.commit().await?;

  info!(%canteen_id, "Canteen updated.");
  let view = canteens::canteen_view(pool, canteen).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Canteen updated successfully"))))
}

#[instrument(name = "handler::delete_canteen", skip(app_state, path, user), fields(canteen_id = %path.as_ref()))]
pub async fn delete_canteen_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  require_admin(&user)?;
  let pool = &app_state.db_pool;
  let canteen = canteens::find_canteen(pool, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Canteen not found".to_string()))?;

  canteens::delete_canteen(pool, canteen.canteen.id).await.map_err(|e| {
    if db::is_foreign_key_violation(&e) {
      AppError::Conflict("Canteen still has stalls with orders".to_string())
    } else {
      AppError::Sqlx(e)
    }
  })?;
  info!(canteen_id = %canteen.canteen.id, "Canteen deleted.");
  Ok(HttpResponse::Ok().json(singleton(&canteen, Some("Canteen deleted successfully"))))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn payload(name: Option<&str>, address: Option<&str>) -> CanteenPayload {
    CanteenPayload {
      name: name.map(str::to_string),
      address: address.map(str::to_string),
      description: None,
    }
  }

  #[test]
  fn name_and_address_are_both_required() {
    let err = payload(Some("Fine Food"), Some("   ")).required().err().unwrap();
    assert!(matches!(err, AppError::MissingFields(ref f) if f.get("address") == Some(&"Required")));
    assert!(payload(None, Some("1 Campus Road")).required().is_err());

    let fields = payload(Some(" Fine Food "), Some("1 Campus Road")).required().ok().unwrap();
    assert_eq!(fields.name, "Fine Food");
    assert_eq!(fields.address, "1 Campus Road");
  }
}
