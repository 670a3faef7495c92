// server/src/models/food.rs

use canteen_core::FoodDraft;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A food row. Menu items carry `menu_id`; foods logged straight into a
/// caloric tracker entry do not.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Food {
  pub id: Uuid,
  pub menu_id: Option<Uuid>,
  pub name: String,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub serving_qty: Option<f64>,
  pub serving_unit: Option<String>,
  pub serving_weight_grams: Option<f64>,
  pub calories: Option<f64>,
  pub total_fat: Option<f64>,
  pub saturated_fat: Option<f64>,
  pub cholesterol: Option<f64>,
  pub sodium: Option<f64>,
  pub total_carbohydrate: Option<f64>,
  pub dietary_fiber: Option<f64>,
  pub sugars: Option<f64>,
  pub protein: Option<f64>,
  pub potassium: Option<f64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The `food` object of a new item: a reference when it has an `id`, a draft otherwise.
///
/// Clients often echo a whole food row back; fields other than `id` are then
/// ignored for references.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodPayload {
  #[serde(default)]
  pub id: Option<Uuid>,
  #[serde(flatten)]
  pub draft: FoodDraft,
}
