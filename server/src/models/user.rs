// server/src/models/user.rs

use super::review::Review;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  User,
  Business,
  Admin,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  #[serde(skip_serializing)]
  pub external_id: String,
  pub email: String,
  pub name: String,
  pub role: Role,
  pub payment_account_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// What other users may see of a user.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
  pub id: Uuid,
  pub name: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

/// A user's own record with the reviews they wrote.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
  #[serde(flatten)]
  pub user: User,
  pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUserView {
  #[serde(flatten)]
  pub user: PublicUser,
  pub reviews: Vec<Review>,
}
