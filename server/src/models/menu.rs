// server/src/models/menu.rs

use super::food::Food;
use super::stall::Stall;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
  pub id: Uuid,
  pub stall_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuView {
  #[serde(flatten)]
  pub menu: Menu,
  pub stall: Stall,
  pub items: Vec<Food>,
}
