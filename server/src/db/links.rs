// server/src/db/links.rs

//! Storage of food links (`order_foods`, `caloric_tracker_entry_foods`) and
//! application of reconciled edit sets.

use super::foods;
use crate::models::{OrderFood, TrackerEntryFood};
use canteen_core::{FoodDraft, Insertion, ItemEdits, LinkRecord};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgExecutor};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Where a link type lives: its table, the column holding the parent id, and the parent's table.
#[derive(Debug, Clone, Copy)]
pub struct LinkTable {
  pub table: &'static str,
  pub parent_column: &'static str,
  pub parent_table: &'static str,
  /// Boolean column of the parent that, once true, freezes its links.
  pub frozen_column: Option<&'static str>,
}

pub const ORDER_FOODS: LinkTable = LinkTable {
  table: "order_foods",
  parent_column: "order_id",
  parent_table: "orders",
  frozen_column: Some("paid"),
};

pub const TRACKER_ENTRY_FOODS: LinkTable = LinkTable {
  table: "caloric_tracker_entry_foods",
  parent_column: "caloric_tracker_entry_id",
  parent_table: "caloric_tracker_entries",
  frozen_column: None,
};

/// State of a parent row after `lock_parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLock {
  Missing,
  /// Locked, but its frozen column is set; its links must not change.
  Frozen,
  Held,
}

/// A persisted food link row.
pub trait StoredLink: LinkRecord<ParentId = Uuid, ItemId = Uuid> + for<'r> FromRow<'r, PgRow> + Send + Unpin {
  const TABLE: LinkTable;

  fn created_at(&self) -> DateTime<Utc>;
  fn updated_at(&self) -> DateTime<Utc>;
}

impl StoredLink for OrderFood {
  const TABLE: LinkTable = ORDER_FOODS;

  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }
  fn updated_at(&self) -> DateTime<Utc> {
    self.updated_at
  }
}

impl StoredLink for TrackerEntryFood {
  const TABLE: LinkTable = TRACKER_ENTRY_FOODS;

  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }
  fn updated_at(&self) -> DateTime<Utc> {
    self.updated_at
  }
}

/// Locks the parent row until the transaction ends and reads its frozen flag
/// under that lock.
pub async fn lock_parent(conn: &mut PgConnection, table: LinkTable, parent_id: Uuid) -> Result<ParentLock, sqlx::Error> {
  let frozen = table.frozen_column.unwrap_or("FALSE");
  let sql = format!("SELECT {} FROM {} WHERE id = $1 FOR UPDATE", frozen, table.parent_table);
  let locked = sqlx::query_scalar::<_, bool>(&sql)
    .bind(parent_id)
    .fetch_optional(conn)
    .await?;
  Ok(match locked {
    None => ParentLock::Missing,
    Some(true) => ParentLock::Frozen,
    Some(false) => ParentLock::Held,
  })
}

/// Every link of one parent, oldest first.
pub async fn fetch_links<'e, R, E>(executor: E, parent_id: Uuid) -> Result<Vec<R>, sqlx::Error>
where
  R: StoredLink,
  E: PgExecutor<'e>,
{
  let table = R::TABLE;
  let sql = format!(
    "SELECT * FROM {} WHERE {} = $1 ORDER BY created_at ASC, food_id ASC",
    table.table, table.parent_column
  );
  sqlx::query_as::<_, R>(&sql).bind(parent_id).fetch_all(executor).await
}

/// Links of several parents at once, oldest first.
pub async fn fetch_links_for_parents<'e, R, E>(executor: E, parent_ids: &[Uuid]) -> Result<Vec<R>, sqlx::Error>
where
  R: StoredLink,
  E: PgExecutor<'e>,
{
  let table = R::TABLE;
  let sql = format!(
    "SELECT * FROM {} WHERE {} = ANY($1) ORDER BY created_at ASC, food_id ASC",
    table.table, table.parent_column
  );
  sqlx::query_as::<_, R>(&sql).bind(parent_ids).fetch_all(executor).await
}

async fn insert_link<R: StoredLink>(
  conn: &mut PgConnection,
  parent_id: Uuid,
  food_id: Uuid,
  count: Option<i32>,
) -> Result<(), sqlx::Error> {
  let table = R::TABLE;
  match count {
    Some(count) => {
      let sql = format!(
        "INSERT INTO {} ({}, food_id, count) VALUES ($1, $2, $3)",
        table.table, table.parent_column
      );
      sqlx::query(&sql).bind(parent_id).bind(food_id).bind(count).execute(conn).await?;
    }
    // No count: the column default decides.
    None => {
      let sql = format!("INSERT INTO {} ({}, food_id) VALUES ($1, $2)", table.table, table.parent_column);
      sqlx::query(&sql).bind(parent_id).bind(food_id).execute(conn).await?;
    }
  }
  Ok(())
}

/// Writes an edit set for `parent_id` on the caller's connection.
///
/// Must run in the same transaction that locked the parent and read the links
/// the edits were computed from. Created foods are attached to `menu_id`.
#[instrument(
  name = "db::apply_item_edits",
  skip(conn, edits),
  fields(table = R::TABLE.table, updated = edits.to_update.len(), deleted = edits.to_delete.len(), inserted = edits.to_insert.len())
)]
pub async fn apply_item_edits<R: StoredLink>(
  conn: &mut PgConnection,
  parent_id: Uuid,
  menu_id: Option<Uuid>,
  edits: ItemEdits<R, FoodDraft>,
) -> Result<(), sqlx::Error> {
  if edits.is_empty() {
    debug!("No item edits to apply.");
    return Ok(());
  }
  let table = R::TABLE;

  let update_sql = format!(
    "UPDATE {} SET count = $1, updated_at = NOW() WHERE {} = $2 AND food_id = $3",
    table.table, table.parent_column
  );
  for link in &edits.to_update {
    sqlx::query(&update_sql)
      .bind(link.count())
      .bind(link.parent_id())
      .bind(link.item_id())
      .execute(&mut *conn)
      .await?;
  }

  // Composite key plus the row as it was read.
  let delete_sql = format!(
    "DELETE FROM {} WHERE {} = $1 AND food_id = $2 AND count = $3 AND created_at = $4 AND updated_at = $5",
    table.table, table.parent_column
  );
  for link in &edits.to_delete {
    let result = sqlx::query(&delete_sql)
      .bind(link.parent_id())
      .bind(link.item_id())
      .bind(link.count())
      .bind(link.created_at())
      .bind(link.updated_at())
      .execute(&mut *conn)
      .await?;
    if result.rows_affected() == 0 {
      warn!(food_id = %link.item_id(), "Link to delete no longer matches the row that was read.");
    }
  }

  for insertion in edits.to_insert {
    let (food_id, count) = match insertion {
      Insertion::Connect { item_id, count } => (item_id, count),
      Insertion::Create { draft, count } => {
        let food = foods::insert_food(&mut *conn, menu_id, &draft).await?;
        debug!(food_id = %food.id, food = %food.name, "Created food for new link.");
        (food.id, count)
      }
    };
    insert_link::<R>(&mut *conn, parent_id, food_id, count).await?;
  }

  let touch_sql = format!("UPDATE {} SET updated_at = NOW() WHERE id = $1", table.parent_table);
  sqlx::query(&touch_sql).bind(parent_id).execute(&mut *conn).await?;
  Ok(())
}
