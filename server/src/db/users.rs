// server/src/db/users.rs

use crate::models::{PublicUser, Role, User};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn find_by_external_id(pool: &PgPool, external_id: &str) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
    .bind(external_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_public_user(pool: &PgPool, user_id: Uuid) -> Result<Option<PublicUser>, sqlx::Error> {
  sqlx::query_as::<_, PublicUser>("SELECT id, name, role, created_at FROM users WHERE id = $1")
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn public_users_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, PublicUser>, sqlx::Error> {
  if ids.is_empty() {
    return Ok(HashMap::new());
  }
  let users = sqlx::query_as::<_, PublicUser>("SELECT id, name, role, created_at FROM users WHERE id = ANY($1)")
    .bind(ids)
    .fetch_all(pool)
    .await?;
  Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

/// The owner of `stall_id`, if the stall exists and has one.
pub async fn stall_owner(pool: &PgPool, stall_id: Uuid) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>(
    r#"
    SELECT u.* FROM users u
    JOIN stalls s ON s.owner_id = u.id
    WHERE s.id = $1
    "#,
  )
  .bind(stall_id)
  .fetch_optional(pool)
  .await
}

pub async fn insert_user<'e, E: PgExecutor<'e>>(
  executor: E,
  external_id: &str,
  email: &str,
  name: &str,
  role: Role,
) -> Result<User, sqlx::Error> {
  sqlx::query_as::<_, User>("INSERT INTO users (external_id, email, name, role) VALUES ($1, $2, $3, $4) RETURNING *")
    .bind(external_id)
    .bind(email)
    .bind(name)
    .bind(role)
    .fetch_one(executor)
    .await
}

pub async fn set_payment_account<'e, E: PgExecutor<'e>>(
  executor: E,
  user_id: Uuid,
  account_id: &str,
) -> Result<User, sqlx::Error> {
  sqlx::query_as::<_, User>(
    "UPDATE users SET payment_account_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
  )
  .bind(user_id)
  .bind(account_id)
  .fetch_one(executor)
  .await
}

pub async fn update_user(pool: &PgPool, user_id: Uuid, name: &str, email: &str) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>("UPDATE users SET name = $2, email = $3, updated_at = NOW() WHERE id = $1 RETURNING *")
    .bind(user_id)
    .bind(name)
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM users WHERE id = $1")
    .bind(user_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db;

  #[sqlx::test(migrations = "./migrations")]
  async fn subjects_register_once(pool: PgPool) {
    let user = insert_user(&pool, "subject-1", "diner@campus.test", "Diner", Role::User).await.unwrap();
    assert_eq!(find_by_external_id(&pool, "subject-1").await.unwrap().unwrap().id, user.id);

    let err = insert_user(&pool, "subject-1", "other@campus.test", "Other", Role::User)
      .await
      .unwrap_err();
    assert!(db::is_unique_violation(&err));
  }

  #[sqlx::test(migrations = "./migrations")]
  async fn business_accounts_store_their_payment_account(pool: PgPool) {
    let user = insert_user(&pool, "subject-2", "owner@campus.test", "Owner", Role::Business)
      .await
      .unwrap();
    assert_eq!(user.payment_account_id, None);

    let updated = set_payment_account(&pool, user.id, "acct_123").await.unwrap();
    assert_eq!(updated.payment_account_id.as_deref(), Some("acct_123"));
    let public = find_public_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(public.role, Role::Business);

    let renamed = update_user(&pool, user.id, "New Name", "new@campus.test").await.unwrap().unwrap();
    assert_eq!(renamed.name, "New Name");
    assert_eq!(renamed.payment_account_id.as_deref(), Some("acct_123"));
    assert!(update_user(&pool, Uuid::new_v4(), "x", "y").await.unwrap().is_none());
  }
}
