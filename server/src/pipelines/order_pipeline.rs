// server/src/pipelines/order_pipeline.rs

use crate::db::{menus, orders, stalls};
use crate::errors::{AppError, Result as AppResult};
use crate::models::OrderFood;
use crate::pipelines::common_steps::{attach_new_items, ensure_items_on_menu, reconcile_and_apply};
use crate::pipelines::contexts::{CreateOrderCtxData, UpdateOrderCtxData};
use canteen_core::{ContextData, StepControl, Workflow, Workflows};
use tracing::{info, instrument, warn};

const NOT_ON_MENU: &str = "Items do not belong to the same menu";
const NEW_NOT_ON_MENU: &str = "New items do not belong to the same menu";

pub fn register_order_workflows(workflows: &Workflows<AppError>) {
  let mut create = Workflow::<CreateOrderCtxData, AppError>::new(
    "create_order",
    &[
      ("load_stall", false),
      ("verify_menu_items", false),
      ("insert_order", false),
      ("load_created_order", false),
    ],
  );
  create
    .on("load_stall", load_stall)
    .on("verify_menu_items", verify_menu_items)
    .on("insert_order", insert_order)
    .on("load_created_order", load_created_order);
  workflows.register(create);

  let mut update = Workflow::<UpdateOrderCtxData, AppError>::new(
    "update_order",
    &[
      ("authorize_order_update", false),
      ("verify_new_menu_items", false),
      ("reconcile_order_items", false),
      ("load_updated_order", false),
    ],
  );
  update
    .on("authorize_order_update", authorize_order_update)
    .on("verify_new_menu_items", verify_new_menu_items)
    .on("reconcile_order_items", reconcile_order_items)
    .on("load_updated_order", load_updated_order);
  workflows.register(update);
}

// --- create_order ---

#[instrument(name = "order_step::load_stall", skip(ctx), err(Display))]
async fn load_stall(ctx: ContextData<CreateOrderCtxData>) -> AppResult<StepControl> {
  let (stall_id, pool) = {
    let guard = ctx.read();
    (guard.stall_id, guard.app_state.db_pool.clone())
  };

  if stalls::find_stall(&pool, stall_id).await?.is_none() {
    return Err(AppError::NotFound("Stall not found".to_string()));
  }
  let menu = menus::find_menu_by_stall(&pool, stall_id).await?;
  ctx.write().menu_id = menu.map(|m| m.id);
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::verify_menu_items", skip(ctx), err(Display))]
async fn verify_menu_items(ctx: ContextData<CreateOrderCtxData>) -> AppResult<StepControl> {
  let (items, menu_id, pool) = {
    let guard = ctx.read();
    (guard.items.clone(), guard.menu_id, guard.app_state.db_pool.clone())
  };
  ensure_items_on_menu(&pool, menu_id, &items, NOT_ON_MENU).await?;
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::insert_order", skip(ctx), err(Display))]
async fn insert_order(ctx: ContextData<CreateOrderCtxData>) -> AppResult<StepControl> {
  let (user_id, stall_id, menu_id, items, pool) = {
    let guard = ctx.read();
    (
      guard.user.id,
      guard.stall_id,
      guard.menu_id,
      guard.items.clone(),
      guard.app_state.db_pool.clone(),
    )
  };
  let failed = |source| AppError::ApplyFailed {
    parent: "Order".to_string(),
    source,
  };

  let mut tx = pool.begin().await.map_err(failed)?;
  let order = orders::insert_order(&mut *tx, user_id, stall_id).await.map_err(failed)?;
  let summary = attach_new_items::<OrderFood>(&mut *tx, order.id, menu_id, items)
    .await
    .map_err(failed)?;
  tx.commit().await.map_err(failed)?;

  info!(order_id = %order.id, inserted = summary.inserted, "Order created.");
  ctx.write().order_id = Some(order.id);
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::load_created_order", skip(ctx), err(Display))]
async fn load_created_order(ctx: ContextData<CreateOrderCtxData>) -> AppResult<StepControl> {
  let (order_id, pool) = {
    let guard = ctx.read();
    (guard.order_id, guard.app_state.db_pool.clone())
  };
  let Some(order_id) = order_id else {
    warn!("load_created_order ran without an inserted order.");
    return Err(AppError::Internal("Created order is unavailable.".to_string()));
  };

  let order = orders::find_order(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let view = orders::load_order_view(&pool, order).await?;
  ctx.write().order = Some(view);
  Ok(StepControl::Continue)
}

// --- update_order ---

#[instrument(name = "order_step::authorize_order_update", skip(ctx), err(Display))]
async fn authorize_order_update(ctx: ContextData<UpdateOrderCtxData>) -> AppResult<StepControl> {
  let (order_id, user, pool) = {
    let guard = ctx.read();
    (guard.order_id, guard.user.clone(), guard.app_state.db_pool.clone())
  };

  let order = orders::find_order(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if !user.may_act_for(Some(order.user_id)) {
    return Err(AppError::unauthorized());
  }
  if order.paid {
    return Err(AppError::Validation("Cannot update paid order".to_string()));
  }

  let menu = menus::find_menu_by_stall(&pool, order.stall_id).await?;
  ctx.write().menu_id = menu.map(|m| m.id);
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::verify_new_menu_items", skip(ctx), err(Display))]
async fn verify_new_menu_items(ctx: ContextData<UpdateOrderCtxData>) -> AppResult<StepControl> {
  let (new_items, menu_id, pool) = {
    let guard = ctx.read();
    (guard.new_items.clone(), guard.menu_id, guard.app_state.db_pool.clone())
  };
  ensure_items_on_menu(&pool, menu_id, &new_items, NEW_NOT_ON_MENU).await?;
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::reconcile_order_items", skip(ctx), err(Display))]
async fn reconcile_order_items(ctx: ContextData<UpdateOrderCtxData>) -> AppResult<StepControl> {
  let (order_id, menu_id, submitted, new_items, pool) = {
    let guard = ctx.read();
    (
      guard.order_id,
      guard.menu_id,
      guard.submitted.clone(),
      guard.new_items.clone(),
      guard.app_state.db_pool.clone(),
    )
  };

  let summary =
    reconcile_and_apply::<OrderFood, _>(&pool, "Order", order_id, menu_id, &submitted, new_items).await?;
  ctx.write().summary = Some(summary);
  Ok(StepControl::Continue)
}

#[instrument(name = "order_step::load_updated_order", skip(ctx), err(Display))]
async fn load_updated_order(ctx: ContextData<UpdateOrderCtxData>) -> AppResult<StepControl> {
  let (order_id, pool) = {
    let guard = ctx.read();
    (guard.order_id, guard.app_state.db_pool.clone())
  };
  let order = orders::find_order(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let view = orders::load_order_view(&pool, order).await?;
  ctx.write().order = Some(view);
  Ok(StepControl::Continue)
}
