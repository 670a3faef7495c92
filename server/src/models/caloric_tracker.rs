// server/src/models/caloric_tracker.rs

use super::food::Food;
use canteen_core::{Link, LinkRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaloricTracker {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaloricTrackerEntry {
  pub id: Uuid,
  pub caloric_tracker_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// One `caloric_tracker_entry_foods` row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEntryFood {
  pub caloric_tracker_entry_id: Uuid,
  pub food_id: Uuid,
  pub count: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Link for TrackerEntryFood {
  type ParentId = Uuid;
  type ItemId = Uuid;

  fn parent_id(&self) -> Uuid {
    self.caloric_tracker_entry_id
  }
  fn item_id(&self) -> Uuid {
    self.food_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

impl LinkRecord for TrackerEntryFood {
  fn with_count(&self, count: i32) -> Self {
    Self { count, ..self.clone() }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedEntryFood {
  pub caloric_tracker_entry_id: Uuid,
  pub food_id: Uuid,
  pub count: i32,
}

impl Link for SubmittedEntryFood {
  type ParentId = Uuid;
  type ItemId = Uuid;

  fn parent_id(&self) -> Uuid {
    self.caloric_tracker_entry_id
  }
  fn item_id(&self) -> Uuid {
    self.food_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryFoodView {
  #[serde(flatten)]
  pub link: TrackerEntryFood,
  pub food: Food,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
  #[serde(flatten)]
  pub entry: CaloricTrackerEntry,
  pub foods: Vec<EntryFoodView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerView {
  #[serde(flatten)]
  pub tracker: CaloricTracker,
  /// Newest entry first.
  pub caloric_tracker_entries: Vec<EntryView>,
}
