// server/src/db/reviews.rs

use super::users;
use crate::models::{Review, ReviewView};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

pub async fn find_review(pool: &PgPool, review_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
  sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
    .bind(review_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_review(
  pool: &PgPool,
  stall_id: Uuid,
  user_id: Uuid,
  rating: i32,
  description: Option<&str>,
) -> Result<Review, sqlx::Error> {
  sqlx::query_as::<_, Review>(
    "INSERT INTO reviews (stall_id, user_id, rating, description) VALUES ($1, $2, $3, $4) RETURNING *",
  )
  .bind(stall_id)
  .bind(user_id)
  .bind(rating)
  .bind(description)
  .fetch_one(pool)
  .await
}

pub async fn update_review(
  pool: &PgPool,
  review_id: Uuid,
  rating: i32,
  description: Option<&str>,
) -> Result<Option<Review>, sqlx::Error> {
  sqlx::query_as::<_, Review>(
    "UPDATE reviews SET rating = $2, description = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
  )
  .bind(review_id)
  .bind(rating)
  .bind(description)
  .fetch_optional(pool)
  .await
}

pub async fn delete_review(pool: &PgPool, review_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
    .bind(review_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

/// Reviews written by `user_id`, newest first.
pub async fn reviews_of_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
  sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE user_id = $1 ORDER BY created_at DESC")
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Attaches each review's author. Keeps the order of `reviews`.
pub async fn attach_authors(pool: &PgPool, reviews: Vec<Review>) -> Result<Vec<ReviewView>, sqlx::Error> {
  let author_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
  let authors = users::public_users_by_ids(pool, &author_ids).await?;

  let mut views = Vec::with_capacity(reviews.len());
  for review in reviews {
    let Some(user) = authors.get(&review.user_id).cloned() else {
      warn!(review_id = %review.id, "Review author no longer exists.");
      continue;
    };
    views.push(ReviewView { review, user });
  }
  Ok(views)
}

/// Reviews of every stall in `stall_ids`, newest first, grouped by stall.
pub async fn reviews_by_stall(pool: &PgPool, stall_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<ReviewView>>, sqlx::Error> {
  let reviews = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE stall_id = ANY($1) ORDER BY created_at DESC")
    .bind(stall_ids)
    .fetch_all(pool)
    .await?;
  let mut by_stall: HashMap<Uuid, Vec<ReviewView>> = HashMap::new();
  for view in attach_authors(pool, reviews).await? {
    by_stall.entry(view.review.stall_id).or_default().push(view);
  }
  Ok(by_stall)
}

pub async fn review_view(pool: &PgPool, review: Review) -> Result<ReviewView, sqlx::Error> {
  attach_authors(pool, vec![review]).await?.pop().ok_or(sqlx::Error::RowNotFound)
}
