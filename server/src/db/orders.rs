// server/src/db/orders.rs

use super::{foods, links};
use crate::models::{Order, OrderFood, OrderFoodView, OrderView};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

pub async fn find_order<'e, E: PgExecutor<'e>>(executor: E, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
    .bind(order_id)
    .fetch_optional(executor)
    .await
}

/// Orders placed by `user_id`, most recently updated first.
pub async fn orders_of_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY updated_at DESC")
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Orders placed at any stall owned by `owner_id`, most recently updated first.
pub async fn orders_of_stall_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>(
    r#"
    SELECT o.* FROM orders o
    JOIN stalls s ON s.id = o.stall_id
    WHERE s.owner_id = $1
    ORDER BY o.updated_at DESC
    "#,
  )
  .bind(owner_id)
  .fetch_all(pool)
  .await
}

pub async fn insert_order<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid, stall_id: Uuid) -> Result<Order, sqlx::Error> {
  sqlx::query_as::<_, Order>("INSERT INTO orders (user_id, stall_id) VALUES ($1, $2) RETURNING *")
    .bind(user_id)
    .bind(stall_id)
    .fetch_one(executor)
    .await
}

pub async fn delete_order(pool: &PgPool, order_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM orders WHERE id = $1")
    .bind(order_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

pub async fn mark_fulfilled(pool: &PgPool, order_id: Uuid) -> Result<Order, sqlx::Error> {
  sqlx::query_as::<_, Order>("UPDATE orders SET fulfilled = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *")
    .bind(order_id)
    .fetch_one(pool)
    .await
}

/// Returns the number of orders updated (0 when the order does not exist).
pub async fn mark_paid(pool: &PgPool, order_id: Uuid, paid_at: DateTime<Utc>) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("UPDATE orders SET paid = TRUE, paid_at = $2, updated_at = NOW() WHERE id = $1")
    .bind(order_id)
    .bind(paid_at)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

/// Attaches each order's links and their foods. Keeps the order of `orders`.
pub async fn load_order_views(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderView>, sqlx::Error> {
  let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
  let all_links: Vec<OrderFood> = links::fetch_links_for_parents(pool, &order_ids).await?;
  let food_ids: Vec<Uuid> = all_links.iter().map(|l| l.food_id).collect();
  let foods_by_id = foods::foods_by_ids(pool, &food_ids).await?;

  let mut by_order: HashMap<Uuid, Vec<OrderFoodView>> = HashMap::new();
  for link in all_links {
    let Some(food) = foods_by_id.get(&link.food_id).cloned() else {
      warn!(order_id = %link.order_id, food_id = %link.food_id, "Order links a food that no longer exists.");
      continue;
    };
    by_order.entry(link.order_id).or_default().push(OrderFoodView { link, food });
  }

  Ok(
    orders
      .into_iter()
      .map(|order| OrderView {
        foods: by_order.remove(&order.id).unwrap_or_default(),
        order,
      })
      .collect(),
  )
}

pub async fn load_order_view(pool: &PgPool, order: Order) -> Result<OrderView, sqlx::Error> {
  let mut views = load_order_views(pool, vec![order]).await?;
  views.pop().ok_or(sqlx::Error::RowNotFound)
}
