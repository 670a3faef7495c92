// server/src/db/trackers.rs

use super::{foods, links};
use crate::models::{CaloricTracker, CaloricTrackerEntry, EntryFoodView, EntryView, TrackerEntryFood, TrackerView};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

pub async fn find_tracker_of_user(pool: &PgPool, user_id: Uuid) -> Result<Option<CaloricTracker>, sqlx::Error> {
  sqlx::query_as::<_, CaloricTracker>("SELECT * FROM caloric_trackers WHERE user_id = $1")
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_tracker(pool: &PgPool, user_id: Uuid) -> Result<CaloricTracker, sqlx::Error> {
  sqlx::query_as::<_, CaloricTracker>("INSERT INTO caloric_trackers (user_id) VALUES ($1) RETURNING *")
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn delete_tracker(pool: &PgPool, tracker_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM caloric_trackers WHERE id = $1")
    .bind(tracker_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

pub async fn find_entry<'e, E: PgExecutor<'e>>(executor: E, entry_id: Uuid) -> Result<Option<CaloricTrackerEntry>, sqlx::Error> {
  sqlx::query_as::<_, CaloricTrackerEntry>("SELECT * FROM caloric_tracker_entries WHERE id = $1")
    .bind(entry_id)
    .fetch_optional(executor)
    .await
}

/// The user owning the tracker that holds `entry_id`; `None` if the entry does not exist.
pub async fn entry_owner(pool: &PgPool, entry_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
  sqlx::query_scalar::<_, Uuid>(
    r#"
    SELECT t.user_id FROM caloric_tracker_entries e
    JOIN caloric_trackers t ON t.id = e.caloric_tracker_id
    WHERE e.id = $1
    "#,
  )
  .bind(entry_id)
  .fetch_optional(pool)
  .await
}

pub async fn insert_entry<'e, E: PgExecutor<'e>>(executor: E, tracker_id: Uuid) -> Result<CaloricTrackerEntry, sqlx::Error> {
  sqlx::query_as::<_, CaloricTrackerEntry>(
    "INSERT INTO caloric_tracker_entries (caloric_tracker_id) VALUES ($1) RETURNING *",
  )
  .bind(tracker_id)
  .fetch_one(executor)
  .await
}

pub async fn delete_entry(pool: &PgPool, entry_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM caloric_tracker_entries WHERE id = $1")
    .bind(entry_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

pub async fn load_entry_views(pool: &PgPool, entries: Vec<CaloricTrackerEntry>) -> Result<Vec<EntryView>, sqlx::Error> {
  let entry_ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
  let all_links: Vec<TrackerEntryFood> = links::fetch_links_for_parents(pool, &entry_ids).await?;
  let food_ids: Vec<Uuid> = all_links.iter().map(|l| l.food_id).collect();
  let foods_by_id = foods::foods_by_ids(pool, &food_ids).await?;

  let mut by_entry: HashMap<Uuid, Vec<EntryFoodView>> = HashMap::new();
  for link in all_links {
    let Some(food) = foods_by_id.get(&link.food_id).cloned() else {
      warn!(entry_id = %link.caloric_tracker_entry_id, food_id = %link.food_id, "Entry links a food that no longer exists.");
      continue;
    };
    by_entry
      .entry(link.caloric_tracker_entry_id)
      .or_default()
      .push(EntryFoodView { link, food });
  }

  Ok(
    entries
      .into_iter()
      .map(|entry| EntryView {
        foods: by_entry.remove(&entry.id).unwrap_or_default(),
        entry,
      })
      .collect(),
  )
}

pub async fn load_entry_view(pool: &PgPool, entry: CaloricTrackerEntry) -> Result<EntryView, sqlx::Error> {
  let mut views = load_entry_views(pool, vec![entry]).await?;
  views.pop().ok_or(sqlx::Error::RowNotFound)
}

/// The tracker with its entries, newest entry first.
pub async fn load_tracker_view(pool: &PgPool, tracker: CaloricTracker) -> Result<TrackerView, sqlx::Error> {
  let entries = sqlx::query_as::<_, CaloricTrackerEntry>(
    "SELECT * FROM caloric_tracker_entries WHERE caloric_tracker_id = $1 ORDER BY created_at DESC",
  )
  .bind(tracker.id)
  .fetch_all(pool)
  .await?;
  Ok(TrackerView {
    caloric_tracker_entries: load_entry_views(pool, entries).await?,
    tracker,
  })
}
