// server/src/db/fixtures.rs

//! Rows shared by the database-backed tests.

use super::{canteens, foods, menus, orders, stalls, users};
use crate::models::{Food, Menu, Order, Role, Stall, User};
use canteen_core::FoodDraft;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StallFixture {
  pub owner: User,
  pub customer: User,
  pub stall: Stall,
  pub menu: Menu,
  pub foods: Vec<Food>,
}

pub async fn user(pool: &PgPool, role: Role) -> User {
  let subject = format!("subject-{}", Uuid::new_v4().simple());
  let email = format!("{}@campus.test", subject);
  users::insert_user(pool, &subject, &email, "Test User", role).await.unwrap()
}

/// A canteen with one owned stall whose menu carries `food_names`.
pub async fn stall_with_menu(pool: &PgPool, food_names: &[&str]) -> StallFixture {
  let owner = user(pool, Role::Business).await;
  let customer = user(pool, Role::User).await;

  let mut conn = pool.acquire().await.unwrap();
  let location = canteens::connect_or_create_location(&mut *conn, "1 Campus Road", 1.29, 103.77)
    .await
    .unwrap();
  let canteen = canteens::insert_canteen(&mut *conn, "Central Canteen", None, location.id)
    .await
    .unwrap();
  drop(conn);

  let stall = stalls::insert_stall(pool, "Chicken Rice", None, canteen.id).await.unwrap();
  let stall = stalls::assign_owner(pool, stall.id, owner.id).await.unwrap().unwrap();
  let menu = menus::insert_menu(pool, stall.id).await.unwrap();

  let mut foods = Vec::new();
  for name in food_names {
    let draft = FoodDraft {
      name: name.to_string(),
      price: Some(3.5),
      ..FoodDraft::default()
    };
    foods.push(foods::insert_food(pool, Some(menu.id), &draft).await.unwrap());
  }

  StallFixture {
    owner,
    customer,
    stall,
    menu,
    foods,
  }
}

/// An order placed by the fixture's customer with the given `(food, count)` links.
pub async fn order_with_links(pool: &PgPool, fixture: &StallFixture, links: &[(Uuid, i32)]) -> Order {
  let order = orders::insert_order(pool, fixture.customer.id, fixture.stall.id).await.unwrap();
  for (food_id, count) in links {
    sqlx::query("INSERT INTO order_foods (order_id, food_id, count) VALUES ($1, $2, $3)")
      .bind(order.id)
      .bind(food_id)
      .bind(count)
      .execute(pool)
      .await
      .unwrap();
  }
  order
}

/// `(food_id, count)` of every link of `order_id`, sorted by food id.
pub async fn order_counts(pool: &PgPool, order_id: Uuid) -> Vec<(Uuid, i32)> {
  sqlx::query_as::<_, (Uuid, i32)>("SELECT food_id, count FROM order_foods WHERE order_id = $1 ORDER BY food_id")
    .bind(order_id)
    .fetch_all(pool)
    .await
    .unwrap()
}
