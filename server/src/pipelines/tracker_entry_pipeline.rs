// server/src/pipelines/tracker_entry_pipeline.rs

//! Caloric tracker entries: create and update, both enriching new food drafts
//! before any write.

use crate::db::trackers;
use crate::errors::{AppError, Result as AppResult};
use crate::models::TrackerEntryFood;
use crate::pipelines::common_steps::{attach_new_items, reconcile_and_apply};
use crate::pipelines::contexts::{CreateEntryCtxData, UpdateEntryCtxData};
use canteen_core::{enrich_new_items, ContextData, StepControl, Workflow, Workflows};
use tracing::{debug, info, instrument, warn};

const ENTRY: &str = "CaloricTrackerEntry";

pub fn register_tracker_entry_workflows(workflows: &Workflows<AppError>) {
  let mut create = Workflow::<CreateEntryCtxData, AppError>::new(
    "create_tracker_entry",
    &[
      ("load_tracker", false),
      ("enrich_new_foods", true),
      ("insert_entry", false),
      ("load_created_entry", false),
    ],
  );
  create
    .on("load_tracker", load_tracker)
    .on("enrich_new_foods", enrich_entry_items)
    .on("insert_entry", insert_entry)
    .on("load_created_entry", load_created_entry);
  workflows.register(create);

  let mut update = Workflow::<UpdateEntryCtxData, AppError>::new(
    "update_tracker_entry",
    &[
      ("authorize_entry_update", false),
      ("enrich_new_foods", true),
      ("reconcile_entry_items", false),
      ("load_updated_entry", false),
    ],
  );
  update
    .on("authorize_entry_update", authorize_entry_update)
    .on("enrich_new_foods", enrich_update_items)
    .on("reconcile_entry_items", reconcile_entry_items)
    .on("load_updated_entry", load_updated_entry);
  workflows.register(update);
}

// --- create_tracker_entry ---

#[instrument(name = "entry_step::load_tracker", skip(ctx), err(Display))]
async fn load_tracker(ctx: ContextData<CreateEntryCtxData>) -> AppResult<StepControl> {
  let (user_id, pool) = {
    let guard = ctx.read();
    (guard.user.id, guard.app_state.db_pool.clone())
  };
  let tracker = trackers::find_tracker_of_user(&pool, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Caloric tracker not found".to_string()))?;
  ctx.write().tracker_id = Some(tracker.id);
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::enrich_entry_items", skip(ctx))]
async fn enrich_entry_items(ctx: ContextData<CreateEntryCtxData>) -> AppResult<StepControl> {
  let (items, lookup) = {
    let guard = ctx.read();
    (guard.items.clone(), guard.app_state.nutrition.clone())
  };
  if !items.iter().any(|item| item.is_create()) {
    debug!("No new food drafts to enrich.");
    return Ok(StepControl::Continue);
  }
  let enriched = enrich_new_items(lookup.as_ref(), items).await;
  ctx.write().items = enriched;
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::insert_entry", skip(ctx), err(Display))]
async fn insert_entry(ctx: ContextData<CreateEntryCtxData>) -> AppResult<StepControl> {
  let (tracker_id, items, pool) = {
    let guard = ctx.read();
    (guard.tracker_id, guard.items.clone(), guard.app_state.db_pool.clone())
  };
  let tracker_id = tracker_id.ok_or_else(|| AppError::Internal("Tracker was not loaded.".to_string()))?;
  let failed = |source| AppError::ApplyFailed {
    parent: ENTRY.to_string(),
    source,
  };

  let mut tx = pool.begin().await.map_err(failed)?;
  let entry = trackers::insert_entry(&mut *tx, tracker_id).await.map_err(failed)?;
  // Foods logged here are not menu items.
  let summary = attach_new_items::<TrackerEntryFood>(&mut *tx, entry.id, None, items)
    .await
    .map_err(failed)?;
  tx.commit().await.map_err(failed)?;

  info!(entry_id = %entry.id, inserted = summary.inserted, "Caloric tracker entry created.");
  ctx.write().entry_id = Some(entry.id);
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::load_created_entry", skip(ctx), err(Display))]
async fn load_created_entry(ctx: ContextData<CreateEntryCtxData>) -> AppResult<StepControl> {
  let (entry_id, pool) = {
    let guard = ctx.read();
    (guard.entry_id, guard.app_state.db_pool.clone())
  };
  let Some(entry_id) = entry_id else {
    warn!("load_created_entry ran without an inserted entry.");
    return Err(AppError::Internal("Created entry is unavailable.".to_string()));
  };

  let entry = trackers::find_entry(&pool, entry_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("{} not found", ENTRY)))?;
  let view = trackers::load_entry_view(&pool, entry).await?;
  ctx.write().entry = Some(view);
  Ok(StepControl::Continue)
}

// --- update_tracker_entry ---

/// Only the tracker's owner may edit its entries.
#[instrument(name = "entry_step::authorize_entry_update", skip(ctx), err(Display))]
async fn authorize_entry_update(ctx: ContextData<UpdateEntryCtxData>) -> AppResult<StepControl> {
  let (entry_id, user_id, pool) = {
    let guard = ctx.read();
    (guard.entry_id, guard.user.id, guard.app_state.db_pool.clone())
  };
  let owner = trackers::entry_owner(&pool, entry_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("{} not found", ENTRY)))?;
  if owner != user_id {
    return Err(AppError::unauthorized());
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::enrich_update_items", skip(ctx))]
async fn enrich_update_items(ctx: ContextData<UpdateEntryCtxData>) -> AppResult<StepControl> {
  let (new_items, lookup) = {
    let guard = ctx.read();
    (guard.new_items.clone(), guard.app_state.nutrition.clone())
  };
  if !new_items.iter().any(|item| item.is_create()) {
    debug!("No new food drafts to enrich.");
    return Ok(StepControl::Continue);
  }
  let enriched = enrich_new_items(lookup.as_ref(), new_items).await;
  ctx.write().new_items = enriched;
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::reconcile_entry_items", skip(ctx), err(Display))]
async fn reconcile_entry_items(ctx: ContextData<UpdateEntryCtxData>) -> AppResult<StepControl> {
  let (entry_id, submitted, new_items, pool) = {
    let guard = ctx.read();
    (
      guard.entry_id,
      guard.submitted.clone(),
      guard.new_items.clone(),
      guard.app_state.db_pool.clone(),
    )
  };
  let summary =
    reconcile_and_apply::<TrackerEntryFood, _>(&pool, ENTRY, entry_id, None, &submitted, new_items).await?;
  ctx.write().summary = Some(summary);
  Ok(StepControl::Continue)
}

#[instrument(name = "entry_step::load_updated_entry", skip(ctx), err(Display))]
async fn load_updated_entry(ctx: ContextData<UpdateEntryCtxData>) -> AppResult<StepControl> {
  let (entry_id, pool) = {
    let guard = ctx.read();
    (guard.entry_id, guard.app_state.db_pool.clone())
  };
  let entry = trackers::find_entry(&pool, entry_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("{} not found", ENTRY)))?;
  let view = trackers::load_entry_view(&pool, entry).await?;
  ctx.write().entry = Some(view);
  Ok(StepControl::Continue)
}
