// server/src/web/handlers/caloric_tracker_handlers.rs

use actix_web::{web, HttpResponse};
use canteen_core::{ContextData, WorkflowOutcome};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{into_new_items, NewItemPayload};
use crate::db::{self, foods, trackers};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{Food, SubmittedEntryFood};
use crate::pipelines::common_steps::validate_drafts;
use crate::pipelines::contexts::{CreateEntryCtxData, UpdateEntryCtxData};
use crate::state::AppState;
use crate::web::extractors::CurrentUser;
use crate::web::responses::{collection, singleton};

const TRACKER_NOT_FOUND: &str = "Caloric tracker not found";
const ENTRY_NOT_FOUND: &str = "CaloricTrackerEntry not found";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
  pub q: Option<String>,
  pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryPayload {
  pub items: Option<Vec<NewItemPayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryPayload {
  pub caloric_tracker_entry_id: Option<Uuid>,
  pub items: Option<Vec<SubmittedEntryFood>>,
  #[serde(default)]
  pub new_items: Option<Vec<NewItemPayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyEntryPayload {
  pub caloric_tracker_entry_id: Option<Uuid>,
}

#[instrument(name = "handler::search_foods", skip(app_state, query), fields(q = ?query.q, limit = ?query.limit))]
pub async fn search_foods_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
  let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
    return Ok(HttpResponse::Ok().json(collection::<Food>(&[], Some("No search query provided"))));
  };
  if matches!(query.limit, Some(limit) if limit < 0) {
    return Err(AppError::Validation("limit must not be negative".to_string()));
  }

  let results = foods::search_foods(&app_state.db_pool, q, query.limit).await?;
  info!(results = results.len(), "Food search finished.");
  let message = format!("Food search results for {}", q);
  Ok(HttpResponse::Ok().json(collection(&results, Some(&message))))
}

/// The caller's tracker with its entries, or `data: null` when they have none yet.
#[instrument(name = "handler::get_tracker", skip(app_state, user), fields(user_id = %user.id))]
pub async fn get_tracker_handler(app_state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let view = match trackers::find_tracker_of_user(pool, user.id).await? {
    Some(tracker) => Some(trackers::load_tracker_view(pool, tracker).await?),
    None => None,
  };
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::create_tracker", skip(app_state, user), fields(user_id = %user.id))]
pub async fn create_tracker_handler(app_state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
  let tracker = trackers::insert_tracker(&app_state.db_pool, user.id)
    .await
    .map_err(|e| {
      if db::is_unique_violation(&e) {
        AppError::Conflict("Caloric tracker already exists".to_string())
      } else {
        AppError::Sqlx(e)
      }
    })?;
  info!(tracker_id = %tracker.id, "Caloric tracker created.");
  Ok(HttpResponse::Created().json(singleton(&tracker, Some("Caloric tracker created successfully"))))
}

#[instrument(name = "handler::delete_tracker", skip(app_state, user), fields(user_id = %user.id))]
pub async fn delete_tracker_handler(app_state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
  let tracker = trackers::find_tracker_of_user(&app_state.db_pool, user.id)
    .await?
    .ok_or_else(|| AppError::NotFound(TRACKER_NOT_FOUND.to_string()))?;
  trackers::delete_tracker(&app_state.db_pool, tracker.id).await?;
  Ok(HttpResponse::Ok().json(singleton(&tracker, Some("Caloric tracker successfully deleted"))))
}

#[instrument(name = "handler::create_entry", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn create_entry_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateEntryPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let Some(items) = payload.into_inner().items else {
    return Err(AppError::missing_fields(&[("items", "Required")]));
  };
  let items = into_new_items(items);
  validate_drafts(&items)?;

  let ctx = ContextData::new(CreateEntryCtxData {
    app_state: app_state.get_ref().clone(),
    user,
    items,
    tracker_id: None,
    entry_id: None,
    entry: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      let entry = ctx.read().entry.clone().ok_or_else(|| {
        warn!("create_tracker_entry completed but the entry was not loaded.");
        AppError::Internal("Entry was created, but its details are unavailable.".to_string())
      })?;
      Ok(HttpResponse::Created().json(singleton(&entry, Some("CaloricTrackerEntry successfully created"))))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      warn!(at_step, "create_tracker_entry was stopped early.");
      Err(AppError::WorkflowHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::update_entry", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn update_entry_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<UpdateEntryPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let UpdateEntryPayload {
    caloric_tracker_entry_id,
    items,
    new_items,
  } = payload.into_inner();
  let (Some(entry_id), Some(submitted)) = (caloric_tracker_entry_id, items) else {
    return Err(AppError::missing_fields(&[
      ("caloricTrackerEntryId", "Required"),
      ("items", "Required"),
      ("newItems", "Optional"),
    ]));
  };
  let new_items = into_new_items(new_items.unwrap_or_default());
  validate_drafts(&new_items)?;

  let ctx = ContextData::new(UpdateEntryCtxData {
    app_state: app_state.get_ref().clone(),
    user,
    entry_id,
    submitted,
    new_items,
    summary: None,
    entry: None,
  });

  match app_state.workflows.run(ctx.clone()).await {
    Ok(WorkflowOutcome::Completed) => {
      let guard = ctx.read();
      let entry = guard.entry.as_ref().ok_or_else(|| {
        warn!("update_tracker_entry completed but the entry was not reloaded.");
        AppError::Internal("Entry was updated, but its details are unavailable.".to_string())
      })?;
      info!(summary = ?guard.summary, "Caloric tracker entry updated.");
      Ok(HttpResponse::Ok().json(singleton(entry, Some("CaloricTrackerEntry successfully updated"))))
    }
    Ok(WorkflowOutcome::Stopped { at_step }) => {
      warn!(at_step, "update_tracker_entry was stopped early.");
      Err(AppError::WorkflowHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::delete_entry", skip(app_state, payload, user), fields(user_id = %user.id))]
pub async fn delete_entry_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<DestroyEntryPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let Some(entry_id) = payload.into_inner().caloric_tracker_entry_id else {
    return Err(AppError::missing_fields(&[("caloricTrackerEntryId", "Required")]));
  };
  let pool = &app_state.db_pool;

  let entry = trackers::find_entry(pool, entry_id)
    .await?
    .ok_or_else(|| AppError::NotFound(ENTRY_NOT_FOUND.to_string()))?;
  let owner = trackers::entry_owner(pool, entry_id).await?;
  if !user.may_act_for(owner) {
    return Err(AppError::unauthorized());
  }

  let view = trackers::load_entry_view(pool, entry).await?;
  trackers::delete_entry(pool, entry_id).await?;
  info!(%entry_id, "Caloric tracker entry deleted.");
  Ok(HttpResponse::Ok().json(singleton(&view, Some("CaloricTrackerEntry successfully deleted"))))
}
