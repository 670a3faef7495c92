// server/src/db/foods.rs

use crate::models::Food;
use canteen_core::FoodDraft;
use sqlx::{PgExecutor, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub async fn insert_food<'e, E: PgExecutor<'e>>(
  executor: E,
  menu_id: Option<Uuid>,
  draft: &FoodDraft,
) -> Result<Food, sqlx::Error> {
  sqlx::query_as::<_, Food>(
    r#"
    INSERT INTO foods (
      menu_id, name, description, price, serving_qty, serving_unit, serving_weight_grams,
      calories, total_fat, saturated_fat, cholesterol, sodium, total_carbohydrate,
      dietary_fiber, sugars, protein, potassium
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    RETURNING *
    "#,
  )
  .bind(menu_id)
  .bind(draft.name.trim())
  .bind(&draft.description)
  .bind(draft.price)
  .bind(draft.serving_qty)
  .bind(&draft.serving_unit)
  .bind(draft.serving_weight_grams)
  .bind(draft.calories)
  .bind(draft.total_fat)
  .bind(draft.saturated_fat)
  .bind(draft.cholesterol)
  .bind(draft.sodium)
  .bind(draft.total_carbohydrate)
  .bind(draft.dietary_fiber)
  .bind(draft.sugars)
  .bind(draft.protein)
  .bind(draft.potassium)
  .fetch_one(executor)
  .await
}

pub async fn foods_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, Food>, sqlx::Error> {
  if ids.is_empty() {
    return Ok(HashMap::new());
  }
  let foods = sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE id = ANY($1)")
    .bind(ids)
    .fetch_all(pool)
    .await?;
  Ok(foods.into_iter().map(|food| (food.id, food)).collect())
}

pub async fn foods_on_menu(pool: &PgPool, menu_id: Uuid) -> Result<Vec<Food>, sqlx::Error> {
  sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE menu_id = $1 ORDER BY created_at ASC, name ASC")
    .bind(menu_id)
    .fetch_all(pool)
    .await
}

/// Foods of several menus at once, grouped by menu.
pub async fn foods_on_menus(pool: &PgPool, menu_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Food>>, sqlx::Error> {
  if menu_ids.is_empty() {
    return Ok(HashMap::new());
  }
  let foods = sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE menu_id = ANY($1) ORDER BY created_at ASC, name ASC")
    .bind(menu_ids)
    .fetch_all(pool)
    .await?;
  let mut by_menu: HashMap<Uuid, Vec<Food>> = HashMap::new();
  for food in foods {
    if let Some(menu_id) = food.menu_id {
      by_menu.entry(menu_id).or_default().push(food);
    }
  }
  Ok(by_menu)
}

/// The ids among `ids` that are not items of `menu_id` (unknown ids included), in input order.
pub async fn ids_outside_menu(pool: &PgPool, ids: &[Uuid], menu_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  let on_menu: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>("SELECT id FROM foods WHERE id = ANY($1) AND menu_id = $2")
    .bind(ids)
    .bind(menu_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();
  Ok(ids.iter().copied().filter(|id| !on_menu.contains(id)).collect())
}

/// Turns free text into a `to_tsquery` expression requiring every word.
///
/// Characters outside letters and digits are dropped so user input cannot
/// produce tsquery syntax errors. `None` when no word is left.
pub fn search_terms(query: &str) -> Option<String> {
  let words: Vec<String> = query
    .split_whitespace()
    .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
    .filter(|word| !word.is_empty())
    .collect();
  if words.is_empty() {
    None
  } else {
    Some(words.join(" & "))
  }
}

pub async fn search_foods(pool: &PgPool, query: &str, limit: Option<i64>) -> Result<Vec<Food>, sqlx::Error> {
  let Some(terms) = search_terms(query) else {
    return Ok(Vec::new());
  };
  // LIMIT NULL means no limit.
  sqlx::query_as::<_, Food>(
    r#"
    SELECT * FROM foods
    WHERE to_tsvector('simple', name) @@ to_tsquery('simple', $1)
    ORDER BY name ASC, created_at ASC
    LIMIT $2
    "#,
  )
  .bind(terms)
  .bind(limit)
  .fetch_all(pool)
  .await
}
