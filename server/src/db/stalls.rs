// server/src/db/stalls.rs

use super::{foods, reviews};
use crate::models::{Canteen, Menu, Stall, StallMenu, StallView};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub async fn find_stall(pool: &PgPool, stall_id: Uuid) -> Result<Option<Stall>, sqlx::Error> {
  sqlx::query_as::<_, Stall>("SELECT * FROM stalls WHERE id = $1")
    .bind(stall_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_stalls(pool: &PgPool) -> Result<Vec<Stall>, sqlx::Error> {
  sqlx::query_as::<_, Stall>("SELECT * FROM stalls ORDER BY created_at ASC, name ASC")
    .fetch_all(pool)
    .await
}

pub async fn insert_stall(
  pool: &PgPool,
  name: &str,
  description: Option<&str>,
  canteen_id: Uuid,
) -> Result<Stall, sqlx::Error> {
  sqlx::query_as::<_, Stall>("INSERT INTO stalls (name, description, canteen_id) VALUES ($1, $2, $3) RETURNING *")
    .bind(name)
    .bind(description)
    .bind(canteen_id)
    .fetch_one(pool)
    .await
}

/// Renames the stall; moves it to `canteen_id` when one is given.
pub async fn update_stall(
  pool: &PgPool,
  stall_id: Uuid,
  name: &str,
  description: Option<&str>,
  canteen_id: Option<Uuid>,
) -> Result<Option<Stall>, sqlx::Error> {
  sqlx::query_as::<_, Stall>(
    r#"
    UPDATE stalls
    SET name = $2, description = $3, canteen_id = COALESCE($4, canteen_id), updated_at = NOW()
    WHERE id = $1
    RETURNING *
    "#,
  )
  .bind(stall_id)
  .bind(name)
  .bind(description)
  .bind(canteen_id)
  .fetch_optional(pool)
  .await
}

pub async fn assign_owner(pool: &PgPool, stall_id: Uuid, owner_id: Uuid) -> Result<Option<Stall>, sqlx::Error> {
  sqlx::query_as::<_, Stall>("UPDATE stalls SET owner_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
    .bind(stall_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_stall(pool: &PgPool, stall_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM stalls WHERE id = $1")
    .bind(stall_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

/// Attaches canteen, reviews and menu to each stall. Keeps the order of `stalls`.
pub async fn load_stall_views(pool: &PgPool, stalls: Vec<Stall>) -> Result<Vec<StallView>, sqlx::Error> {
  let stall_ids: Vec<Uuid> = stalls.iter().map(|s| s.id).collect();
  let canteen_ids: Vec<Uuid> = stalls.iter().map(|s| s.canteen_id).collect();

  let canteens: HashMap<Uuid, Canteen> = sqlx::query_as::<_, Canteen>("SELECT * FROM canteens WHERE id = ANY($1)")
    .bind(&canteen_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|canteen| (canteen.id, canteen))
    .collect();
  let menus: Vec<Menu> = sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE stall_id = ANY($1)")
    .bind(&stall_ids)
    .fetch_all(pool)
    .await?;
  let menu_ids: Vec<Uuid> = menus.iter().map(|m| m.id).collect();
  let mut items_by_menu = foods::foods_on_menus(pool, &menu_ids).await?;
  let mut menu_by_stall: HashMap<Uuid, StallMenu> = menus
    .into_iter()
    .map(|menu| {
      let items = items_by_menu.remove(&menu.id).unwrap_or_default();
      (menu.stall_id, StallMenu { menu, items })
    })
    .collect();
  let mut reviews_by_stall = reviews::reviews_by_stall(pool, &stall_ids).await?;

  stalls
    .into_iter()
    .map(|stall| {
      let canteen = canteens.get(&stall.canteen_id).cloned().ok_or(sqlx::Error::RowNotFound)?;
      Ok(StallView {
        canteen,
        reviews: reviews_by_stall.remove(&stall.id).unwrap_or_default(),
        menu: menu_by_stall.remove(&stall.id),
        stall,
      })
    })
    .collect()
}

pub async fn load_stall_view(pool: &PgPool, stall: Stall) -> Result<StallView, sqlx::Error> {
  load_stall_views(pool, vec![stall]).await?.pop().ok_or(sqlx::Error::RowNotFound)
}
