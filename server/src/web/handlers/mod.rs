// server/src/web/handlers/mod.rs

pub mod canteen_handlers;
pub mod caloric_tracker_handlers;
pub mod menu_handlers;
pub mod order_handlers;
pub mod payment_handlers;
pub mod review_handlers;
pub mod stall_handlers;
pub mod user_handlers;

use crate::errors::{AppError, Result as AppResult};
use crate::models::FoodPayload;
use crate::pipelines::contexts::NewFoodItem;
use crate::web::extractors::CurrentUser;
use canteen_core::NewItem;
use serde::Deserialize;

/// One entry of an `items` / `newItems` list: `{"food": {...}, "count"?: n}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItemPayload {
  pub food: FoodPayload,
  #[serde(default)]
  pub count: Option<i32>,
}

impl From<NewItemPayload> for NewFoodItem {
  fn from(payload: NewItemPayload) -> Self {
    let count = payload.count;
    match payload.food.id {
      Some(item_id) => NewItem::Connect { item_id, count },
      None => NewItem::Create {
        draft: payload.food.draft,
        count,
      },
    }
  }
}

pub(crate) fn into_new_items(payloads: Vec<NewItemPayload>) -> Vec<NewFoodItem> {
  payloads.into_iter().map(NewFoodItem::from).collect()
}

/// A trimmed text field, `None` when missing or blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn require_admin(user: &CurrentUser) -> AppResult<()> {
  if user.is_admin() {
    Ok(())
  } else {
    Err(AppError::unauthorized())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Role;
  use serde_json::json;
  use uuid::Uuid;

  #[test]
  fn food_with_an_id_is_a_reference() {
    let id = Uuid::new_v4();
    let payload: NewItemPayload = serde_json::from_value(json!({
      "food": {"id": id, "name": "Chicken Rice", "price": 3.5},
      "count": 2
    }))
    .unwrap();

    assert_eq!(NewFoodItem::from(payload), NewItem::Connect { item_id: id, count: Some(2) });
  }

  #[test]
  fn food_without_an_id_is_a_draft() {
    let payloads: Vec<NewItemPayload> = serde_json::from_value(json!([
      {"food": {"name": "Laksa", "calories": 560.0}},
    ]))
    .unwrap();

    let items = into_new_items(payloads);
    match &items[..] {
      [NewItem::Create { draft, count: None }] => {
        assert_eq!(draft.name, "Laksa");
        assert_eq!(draft.calories, Some(560.0));
        assert_eq!(draft.protein, None);
      }
      other => panic!("unexpected items: {:?}", other),
    }
  }

  #[test]
  fn blank_text_is_not_present() {
    assert_eq!(present(Some("  Western  ".into())), Some("Western".to_string()));
    assert_eq!(present(Some("   ".into())), None);
    assert_eq!(present(None), None);
  }

  #[test]
  fn only_admins_pass_the_admin_check() {
    let user = CurrentUser {
      id: Uuid::new_v4(),
      role: Role::Business,
    };
    assert!(matches!(require_admin(&user), Err(AppError::Forbidden(_))));
    let admin = CurrentUser { role: Role::Admin, ..user };
    assert!(require_admin(&admin).is_ok());
  }
}
