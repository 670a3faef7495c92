// server/src/db/canteens.rs

use crate::models::{Canteen, CanteenView, Location};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn find_location_by_address(pool: &PgPool, address: &str) -> Result<Option<Location>, sqlx::Error> {
  sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE address = $1")
    .bind(address)
    .fetch_optional(pool)
    .await
}

/// Returns the location stored for `address`, creating it with the given coordinates if absent.
/// An existing row keeps its coordinates.
pub async fn connect_or_create_location(
  conn: &mut PgConnection,
  address: &str,
  latitude: f64,
  longitude: f64,
) -> Result<Location, sqlx::Error> {
  sqlx::query_as::<_, Location>(
    r#"
    INSERT INTO locations (address, latitude, longitude)
    VALUES ($1, $2, $3)
    ON CONFLICT (address) DO UPDATE SET address = EXCLUDED.address
    RETURNING *
    "#,
  )
  .bind(address)
  .bind(latitude)
  .bind(longitude)
  .fetch_one(conn)
  .await
}

pub async fn insert_canteen(
  conn: &mut PgConnection,
  name: &str,
  description: Option<&str>,
  location_id: Uuid,
) -> Result<Canteen, sqlx::Error> {
  sqlx::query_as::<_, Canteen>(
    "INSERT INTO canteens (name, description, location_id) VALUES ($1, $2, $3) RETURNING *",
  )
  .bind(name)
  .bind(description)
  .bind(location_id)
  .fetch_one(conn)
  .await
}

pub async fn update_canteen(
  conn: &mut PgConnection,
  canteen_id: Uuid,
  name: &str,
  description: Option<&str>,
  location_id: Uuid,
) -> Result<Option<Canteen>, sqlx::Error> {
  sqlx::query_as::<_, Canteen>(
    r#"
    UPDATE canteens SET name = $2, description = $3, location_id = $4, updated_at = NOW()
    WHERE id = $1
    RETURNING *
    "#,
  )
  .bind(canteen_id)
  .bind(name)
  .bind(description)
  .bind(location_id)
  .fetch_optional(conn)
  .await
}

pub async fn delete_canteen(pool: &PgPool, canteen_id: Uuid) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM canteens WHERE id = $1")
    .bind(canteen_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

async fn attach_locations(pool: &PgPool, canteens: Vec<Canteen>) -> Result<Vec<CanteenView>, sqlx::Error> {
  let location_ids: Vec<Uuid> = canteens.iter().map(|c| c.location_id).collect();
  let locations: HashMap<Uuid, Location> = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ANY($1)")
    .bind(&location_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|location| (location.id, location))
    .collect();

  canteens
    .into_iter()
    .map(|canteen| {
      let location = locations.get(&canteen.location_id).cloned().ok_or(sqlx::Error::RowNotFound)?;
      Ok(CanteenView { canteen, location })
    })
    .collect()
}

pub async fn list_canteens(pool: &PgPool) -> Result<Vec<CanteenView>, sqlx::Error> {
  let canteens = sqlx::query_as::<_, Canteen>("SELECT * FROM canteens ORDER BY name ASC")
    .fetch_all(pool)
    .await?;
  attach_locations(pool, canteens).await
}

pub async fn find_canteen(pool: &PgPool, canteen_id: Uuid) -> Result<Option<CanteenView>, sqlx::Error> {
  let canteen = sqlx::query_as::<_, Canteen>("SELECT * FROM canteens WHERE id = $1")
    .bind(canteen_id)
    .fetch_optional(pool)
    .await?;
  match canteen {
    Some(canteen) => Ok(attach_locations(pool, vec![canteen]).await?.pop()),
    None => Ok(None),
  }
}

pub async fn canteen_view(pool: &PgPool, canteen: Canteen) -> Result<CanteenView, sqlx::Error> {
  attach_locations(pool, vec![canteen]).await?.pop().ok_or(sqlx::Error::RowNotFound)
}
