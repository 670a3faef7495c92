// server/src/db/menus.rs

use super::{foods, stalls};
use crate::models::{Menu, MenuView};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

pub async fn find_menu(pool: &PgPool, menu_id: Uuid) -> Result<Option<Menu>, sqlx::Error> {
  sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE id = $1")
    .bind(menu_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_menu_by_stall(pool: &PgPool, stall_id: Uuid) -> Result<Option<Menu>, sqlx::Error> {
  sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE stall_id = $1")
    .bind(stall_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_menu<'e, E: PgExecutor<'e>>(executor: E, stall_id: Uuid) -> Result<Menu, sqlx::Error> {
  sqlx::query_as::<_, Menu>("INSERT INTO menus (stall_id) VALUES ($1) RETURNING *")
    .bind(stall_id)
    .fetch_one(executor)
    .await
}

pub async fn delete_menu(pool: &PgPool, menu_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM menus WHERE id = $1")
    .bind(menu_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

pub async fn load_menu_view(pool: &PgPool, menu: Menu) -> Result<MenuView, sqlx::Error> {
  let stall = stalls::find_stall(pool, menu.stall_id)
    .await?
    .ok_or(sqlx::Error::RowNotFound)?;
  let items = foods::foods_on_menu(pool, menu.id).await?;
  Ok(MenuView { menu, stall, items })
}
