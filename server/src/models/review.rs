// server/src/models/review.rs

use super::user::PublicUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: Uuid,
  pub stall_id: Uuid,
  pub user_id: Uuid,
  pub rating: i32,
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
  #[serde(flatten)]
  pub review: Review,
  pub user: PublicUser,
}
