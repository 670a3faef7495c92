// server/src/models/order.rs

use super::food::Food;
use canteen_core::{Link, LinkRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub stall_id: Uuid,
  pub paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub fulfilled: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// One `order_foods` row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderFood {
  pub order_id: Uuid,
  pub food_id: Uuid,
  pub count: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Link for OrderFood {
  type ParentId = Uuid;
  type ItemId = Uuid;

  fn parent_id(&self) -> Uuid {
    self.order_id
  }
  fn item_id(&self) -> Uuid {
    self.food_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

impl LinkRecord for OrderFood {
  fn with_count(&self, count: i32) -> Self {
    Self { count, ..self.clone() }
  }
}

/// An order item as the client last saw it, possibly with a new count.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOrderFood {
  pub order_id: Uuid,
  pub food_id: Uuid,
  pub count: i32,
}

impl Link for SubmittedOrderFood {
  type ParentId = Uuid;
  type ItemId = Uuid;

  fn parent_id(&self) -> Uuid {
    self.order_id
  }
  fn item_id(&self) -> Uuid {
    self.food_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderFoodView {
  #[serde(flatten)]
  pub link: OrderFood,
  pub food: Food,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order: Order,
  /// Oldest link first.
  pub foods: Vec<OrderFoodView>,
}

impl OrderView {
  /// Sum of `count * price` in currency units; foods without a price count as free.
  pub fn total_price(&self) -> f64 {
    self
      .foods
      .iter()
      .map(|item| f64::from(item.link.count) * item.food.price.unwrap_or(0.0))
      .sum()
  }
}
