// server/src/models/canteen.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Geocoded address. One row per distinct address, shared by canteens.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
  pub id: Uuid,
  pub address: String,
  pub latitude: f64,
  pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Canteen {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub location_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanteenView {
  #[serde(flatten)]
  pub canteen: Canteen,
  pub location: Location,
}
