// server/src/models/stall.rs

use super::canteen::Canteen;
use super::food::Food;
use super::menu::Menu;
use super::review::ReviewView;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stall {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub canteen_id: Uuid,
  pub owner_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StallMenu {
  #[serde(flatten)]
  pub menu: Menu,
  pub items: Vec<Food>,
}

/// A stall with its canteen, its reviews (newest first) and its menu, if any.
#[derive(Debug, Clone, Serialize)]
pub struct StallView {
  #[serde(flatten)]
  pub stall: Stall,
  pub canteen: Canteen,
  pub reviews: Vec<ReviewView>,
  pub menu: Option<StallMenu>,
}
