// server/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::reviews;
use crate::errors::{AppError, Result as AppResult};
use crate::models::Review;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::responses::singleton;

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
  pub rating: Option<i32>,
  #[serde(default)]
  pub description: Option<String>,
}

impl ReviewPayload {
  /// The rating (present and non-zero) and description; `hints` describe the body on failure.
  pub fn required(self, hints: &[(&'static str, &'static str)]) -> AppResult<(i32, Option<String>)> {
    match self.rating {
      Some(rating) if rating != 0 => Ok((rating, self.description)),
      _ => Err(AppError::missing_fields(hints)),
    }
  }
}

fn review_not_found() -> AppError {
  AppError::NotFound("Review does not exist".to_string())
}

/// Loads a review the caller may change: 404 when missing, 403 unless its author or an admin.
async fn authored_review(app_state: &AppState, user: &CurrentUser, review_id: Uuid) -> AppResult<Review> {
  let review = reviews::find_review(&app_state.db_pool, review_id)
    .await?
    .ok_or_else(review_not_found)?;
  if !user.may_act_for(Some(review.user_id)) {
    return Err(AppError::unauthorized());
  }
  Ok(review)
}

#[instrument(name = "handler::get_review", skip(app_state, path), fields(review_id = %path.as_ref()))]
pub async fn get_review_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let review = reviews::find_review(pool, path.into_inner())
    .await?
    .ok_or_else(review_not_found)?;
  let view = reviews::review_view(pool, review).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::update_review", skip(app_state, path, payload, user), fields(review_id = %path.as_ref()))]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let review = reviews::find_review(pool, path.into_inner())
    .await?
    .ok_or_else(review_not_found)?;
  let (rating, description) = payload
    .into_inner()
    .required(&[("rating", "Required and must be a number")])?;
  if !user.may_act_for(Some(review.user_id)) {
    return Err(AppError::unauthorized());
  }

  let updated = reviews::update_review(pool, review.id, rating, description.as_deref())
    .await?
    .ok_or_else(review_not_found)?;
  info!(review_id = %updated.id, rating, "Review updated.");
  let view = reviews::review_view(pool, updated).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, Some("Review successfully updated"))))
}

#[instrument(name = "handler::delete_review", skip(app_state, path, user), fields(review_id = %path.as_ref()))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let review = authored_review(&app_state, &user, path.into_inner()).await?;
  reviews::delete_review(&app_state.db_pool, review.id).await?;
  info!(review_id = %review.id, "Review deleted.");
  Ok(HttpResponse::Ok().json(singleton(&Option::<Review>::None, Some("Review successfully deleted"))))
}
