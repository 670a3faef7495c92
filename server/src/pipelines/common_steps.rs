// server/src/pipelines/common_steps.rs

//! Steps shared by the order and caloric tracker entry workflows.

use crate::db::{self, foods, ParentLock, StoredLink};
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::NewFoodItem;
use canteen_core::{reconcile, EditSummary, FoodDraft, ItemEdits, Link, NewItem};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn apply_failed(parent: &str, source: sqlx::Error) -> AppError {
  AppError::ApplyFailed {
    parent: parent.to_string(),
    source,
  }
}

/// Every draft among `items` must be creatable.
pub fn validate_drafts(items: &[NewFoodItem]) -> AppResult<()> {
  for item in items {
    if let NewItem::Create { draft, .. } = item {
      draft.validate_for_create().map_err(AppError::Validation)?;
    }
  }
  Ok(())
}

/// Orders only ever reference foods of the stall's menu.
#[instrument(name = "common_step::ensure_items_on_menu", skip(pool, items), fields(items = items.len()), err(Display))]
pub async fn ensure_items_on_menu(
  pool: &PgPool,
  menu_id: Option<Uuid>,
  items: &[NewFoodItem],
  message: &str,
) -> AppResult<()> {
  if items.iter().any(NewItem::is_create) {
    return Err(AppError::Validation(
      "Orders can only reference existing menu items".to_string(),
    ));
  }
  let ids: Vec<Uuid> = items
    .iter()
    .filter_map(|item| match item {
      NewItem::Connect { item_id, .. } => Some(*item_id),
      NewItem::Create { .. } => None,
    })
    .collect();
  if ids.is_empty() {
    return Ok(());
  }

  let Some(menu_id) = menu_id else {
    warn!("Stall has no menu; no item can belong to it.");
    return Err(AppError::Validation(message.to_string()));
  };
  let outside = foods::ids_outside_menu(pool, &ids, menu_id).await?;
  if !outside.is_empty() {
    warn!(?outside, "Submitted foods are not on the stall's menu.");
    return Err(AppError::Validation(message.to_string()));
  }
  Ok(())
}

/// Reconcile-and-apply for one parent, in one transaction.
///
/// Locks the parent row, refusing a frozen one such as a paid order. Then
/// reads its links fresh, diffs them against `submitted` and `new_items`,
/// writes the edits and commits. Any storage failure rolls everything back
/// and surfaces as `AppError::ApplyFailed`.
#[instrument(
  name = "common_step::reconcile_and_apply",
  skip(pool, submitted, new_items),
  fields(table = R::TABLE.table, submitted = submitted.len(), new_items = new_items.len()),
  err(Display)
)]
pub async fn reconcile_and_apply<R, S>(
  pool: &PgPool,
  parent: &'static str,
  parent_id: Uuid,
  menu_id: Option<Uuid>,
  submitted: &[S],
  new_items: Vec<NewFoodItem>,
) -> AppResult<EditSummary>
where
  R: StoredLink,
  S: Link<ParentId = Uuid, ItemId = Uuid> + Sync,
{
  let mut tx = pool.begin().await.map_err(|e| apply_failed(parent, e))?;

  match db::lock_parent(&mut *tx, R::TABLE, parent_id)
    .await
    .map_err(|e| apply_failed(parent, e))?
  {
    ParentLock::Missing => return Err(AppError::NotFound(format!("{} not found", parent))),
    ParentLock::Frozen => {
      warn!("Parent was frozen before its lock was taken.");
      return Err(AppError::Validation(format!("Cannot update paid {}", parent.to_lowercase())));
    }
    ParentLock::Held => {}
  }

  let existing: Vec<R> = db::fetch_links(&mut *tx, parent_id)
    .await
    .map_err(|e| apply_failed(parent, e))?;
  let edits: ItemEdits<R, FoodDraft> = reconcile(&existing, submitted, new_items);
  let summary = edits.summary();

  db::apply_item_edits(&mut *tx, parent_id, menu_id, edits)
    .await
    .map_err(|e| apply_failed(parent, e))?;
  tx.commit().await.map_err(|e| apply_failed(parent, e))?;

  info!(?summary, "Item edits applied.");
  Ok(summary)
}

/// Attaches `items` to a parent created in the same transaction.
/// Connect references are deduplicated exactly as on update.
pub async fn attach_new_items<R: StoredLink>(
  conn: &mut sqlx::PgConnection,
  parent_id: Uuid,
  menu_id: Option<Uuid>,
  items: Vec<NewFoodItem>,
) -> Result<EditSummary, sqlx::Error> {
  let no_links: [R; 0] = [];
  let edits: ItemEdits<R, FoodDraft> = reconcile::<R, R, FoodDraft>(&no_links, &no_links, items);
  let summary = edits.summary();
  db::apply_item_edits(conn, parent_id, menu_id, edits).await?;
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{fixtures, orders, trackers};
  use crate::models::{OrderFood, SubmittedEntryFood, SubmittedOrderFood, TrackerEntryFood};
  use chrono::Utc;

  fn submitted(order_id: Uuid, links: &[(Uuid, i32)]) -> Vec<SubmittedOrderFood> {
    links
      .iter()
      .map(|&(food_id, count)| SubmittedOrderFood {
        order_id,
        food_id,
        count,
      })
      .collect()
  }

  fn sorted(mut links: Vec<(Uuid, i32)>) -> Vec<(Uuid, i32)> {
    links.sort();
    links
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn one_pass_updates_deletes_and_inserts(pool: PgPool) {
    let stall = fixtures::stall_with_menu(&pool, &["Chicken Rice", "Laksa", "Teh Tarik"]).await;
    let (f0, f1, f2) = (stall.foods[0].id, stall.foods[1].id, stall.foods[2].id);
    let order = fixtures::order_with_links(&pool, &stall, &[(f0, 2), (f1, 5)]).await;

    let summary = reconcile_and_apply::<OrderFood, _>(
      &pool,
      "Order",
      order.id,
      Some(stall.menu.id),
      &submitted(order.id, &[(f0, 3)]),
      vec![NewItem::Connect { item_id: f2, count: None }],
    )
    .await
    .unwrap();

    assert_eq!(
      summary,
      EditSummary {
        updated: 1,
        deleted: 1,
        inserted: 1
      }
    );
    // f2 was inserted without a count: the column default applies.
    assert_eq!(fixtures::order_counts(&pool, order.id).await, sorted(vec![(f0, 3), (f2, 1)]));

    let touched = orders::find_order(&pool, order.id).await.unwrap().unwrap();
    assert!(touched.updated_at > order.updated_at);
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn resubmitting_the_stored_state_changes_nothing(pool: PgPool) {
    let stall = fixtures::stall_with_menu(&pool, &["Chicken Rice", "Laksa"]).await;
    let (f0, f1) = (stall.foods[0].id, stall.foods[1].id);
    let order = fixtures::order_with_links(&pool, &stall, &[(f0, 3), (f1, 1)]).await;

    let summary = reconcile_and_apply::<OrderFood, _>(
      &pool,
      "Order",
      order.id,
      Some(stall.menu.id),
      &submitted(order.id, &[(f1, 1), (f0, 3)]),
      vec![NewItem::Connect { item_id: f0, count: Some(7) }],
    )
    .await
    .unwrap();

    assert_eq!(summary, EditSummary::default());
    assert_eq!(fixtures::order_counts(&pool, order.id).await, sorted(vec![(f0, 3), (f1, 1)]));
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn a_failing_insert_rolls_back_the_earlier_edits(pool: PgPool) {
    let stall = fixtures::stall_with_menu(&pool, &["Chicken Rice", "Laksa"]).await;
    let (f0, f1) = (stall.foods[0].id, stall.foods[1].id);
    let order = fixtures::order_with_links(&pool, &stall, &[(f0, 2), (f1, 5)]).await;

    let err = reconcile_and_apply::<OrderFood, _>(
      &pool,
      "Order",
      order.id,
      Some(stall.menu.id),
      &submitted(order.id, &[(f0, 4)]),
      vec![NewItem::Connect {
        item_id: Uuid::new_v4(),
        count: Some(1),
      }],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::ApplyFailed { ref parent, .. } if parent == "Order"));
    assert_eq!(fixtures::order_counts(&pool, order.id).await, sorted(vec![(f0, 2), (f1, 5)]));
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn paid_orders_are_refused_once_locked(pool: PgPool) {
    let stall = fixtures::stall_with_menu(&pool, &["Chicken Rice"]).await;
    let f0 = stall.foods[0].id;
    let order = fixtures::order_with_links(&pool, &stall, &[(f0, 2)]).await;
    assert_eq!(orders::mark_paid(&pool, order.id, Utc::now()).await.unwrap(), 1);

    let err = reconcile_and_apply::<OrderFood, _>(
      &pool,
      "Order",
      order.id,
      Some(stall.menu.id),
      &submitted(order.id, &[(f0, 9)]),
      Vec::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(ref m) if m == "Cannot update paid order"));
    assert_eq!(fixtures::order_counts(&pool, order.id).await, vec![(f0, 2)]);
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn missing_parent_is_not_found(pool: PgPool) {
    let err = reconcile_and_apply::<OrderFood, SubmittedOrderFood>(&pool, "Order", Uuid::new_v4(), None, &[], Vec::new())
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == "Order not found"));
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn created_foods_are_stored_before_their_link(pool: PgPool) {
    let owner = fixtures::user(&pool, crate::models::Role::User).await;
    let tracker = trackers::insert_tracker(&pool, owner.id).await.unwrap();
    let entry = trackers::insert_entry(&pool, tracker.id).await.unwrap();

    let draft = FoodDraft {
      name: "Kaya Toast".to_string(),
      calories: Some(300.0),
      ..FoodDraft::default()
    };
    let summary = reconcile_and_apply::<TrackerEntryFood, SubmittedEntryFood>(
      &pool,
      "Caloric tracker entry",
      entry.id,
      None,
      &[],
      vec![NewItem::Create { draft, count: None }],
    )
    .await
    .unwrap();
    assert_eq!(summary.inserted, 1);

    let links: Vec<TrackerEntryFood> = db::fetch_links(&pool, entry.id).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].count, 1);
    let food = foods::foods_by_ids(&pool, &[links[0].food_id]).await.unwrap().remove(&links[0].food_id).unwrap();
    assert_eq!(food.name, "Kaya Toast");
    assert_eq!(food.menu_id, None);
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn new_parents_keep_the_first_of_duplicate_references(pool: PgPool) {
    let stall = fixtures::stall_with_menu(&pool, &["Chicken Rice"]).await;
    let f0 = stall.foods[0].id;

    let mut tx = pool.begin().await.unwrap();
    let order = orders::insert_order(&mut *tx, stall.customer.id, stall.stall.id).await.unwrap();
    let summary = attach_new_items::<OrderFood>(
      &mut *tx,
      order.id,
      Some(stall.menu.id),
      vec![
        NewItem::Connect { item_id: f0, count: Some(2) },
        NewItem::Connect { item_id: f0, count: Some(5) },
      ],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(fixtures::order_counts(&pool, order.id).await, vec![(f0, 2)]);
  }
}
