// server/src/web/handlers/user_handlers.rs

use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::present;
use crate::db::{self, reviews, users};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{PublicUserView, Role, User, UserView};
use crate::state::AppState;
use crate::web::extractors::{bearer_subject, CurrentUser};
use crate::web::responses::singleton;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
  #[serde(default)]
  pub name: Option<String>,
  pub email: Option<String>,
  /// `true` or `"true"`, in any case.
  #[serde(default)]
  pub is_business_account: Option<Value>,
}

impl CreateUserPayload {
  fn role(&self) -> Role {
    let business = match &self.is_business_account {
      Some(Value::Bool(flag)) => *flag,
      Some(Value::String(flag)) => flag.trim().eq_ignore_ascii_case("true"),
      _ => false,
    };
    if business {
      Role::Business
    } else {
      Role::User
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
  pub name: Option<String>,
  pub email: Option<String>,
}

fn user_not_found() -> AppError {
  AppError::NotFound("User not found".to_string())
}

async fn user_view(app_state: &AppState, user: User) -> AppResult<UserView> {
  let reviews = reviews::reviews_of_user(&app_state.db_pool, user.id).await?;
  Ok(UserView { user, reviews })
}

/// The caller's own record.
#[instrument(name = "handler::current_user", skip(app_state, user), fields(user_id = %user.id))]
pub async fn current_user_handler(app_state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
  let record = users::find_user(&app_state.db_pool, user.id)
    .await?
    .ok_or_else(user_not_found)?;
  let view = user_view(&app_state, record).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::get_user", skip(app_state, path), fields(user_id = %path.as_ref()))]
pub async fn get_user_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let pool = &app_state.db_pool;
  let user = users::find_public_user(pool, path.into_inner())
    .await?
    .ok_or_else(user_not_found)?;
  let reviews = reviews::reviews_of_user(pool, user.id).await?;
  Ok(HttpResponse::Ok().json(singleton(&PublicUserView { user, reviews }, None)))
}

/// Registers the bearer subject as a user. Business accounts get a connected
/// payment account in the same transaction.
#[instrument(name = "handler::create_user", skip(app_state, req, payload))]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<CreateUserPayload>,
) -> AppResult<HttpResponse> {
  let header = req.headers().get(AUTHORIZATION).map(|value| value.to_str().unwrap_or_default());
  let external_id = bearer_subject(header)?.to_string();

  let payload = payload.into_inner();
  let role = payload.role();
  let Some(email) = present(payload.email) else {
    return Err(AppError::missing_fields(&[("email", "Required"), ("name", "Optional")]));
  };
  let name = present(payload.name).unwrap_or_default();

  let mut tx = app_state.db_pool.begin().await?;
  let mut user = users::insert_user(&mut *tx, &external_id, &email, &name, role)
    .await
    .map_err(|e| {
      if db::is_unique_violation(&e) {
        AppError::Conflict("User already exists".to_string())
      } else {
        AppError::Sqlx(e)
      }
    })?;
  if role == Role::Business {
    let account_id = app_state
      .payments
      .create_connected_account(user.id, &email)
      .await
      .map_err(|e| AppError::Payment(e.to_string()))?;
    user = users::set_payment_account(&mut *tx, user.id, &account_id).await?;
  }
  tx.commit().await?;

  info!(user_id = %user.id, role = ?user.role, "User registered.");
  let view = user_view(&app_state, user).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::update_user", skip(app_state, path, payload, user), fields(user_id = %path.as_ref()))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateUserPayload>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let user_id = path.into_inner();
  if !user.may_act_for(Some(user_id)) {
    return Err(AppError::unauthorized());
  }
  let UpdateUserPayload { name, email } = payload.into_inner();
  let (Some(name), Some(email)) = (present(name), present(email)) else {
    return Err(AppError::missing_fields(&[("name", "Required"), ("email", "Required")]));
  };

  let updated = users::update_user(&app_state.db_pool, user_id, &name, &email)
    .await?
    .ok_or_else(user_not_found)?;
  info!(%user_id, "User updated.");
  let view = user_view(&app_state, updated).await?;
  Ok(HttpResponse::Ok().json(singleton(&view, None)))
}

#[instrument(name = "handler::delete_user", skip(app_state, path, user), fields(user_id = %path.as_ref()))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> AppResult<HttpResponse> {
  let user_id = path.into_inner();
  if !user.may_act_for(Some(user_id)) {
    return Err(AppError::unauthorized());
  }
  if users::delete_user(&app_state.db_pool, user_id).await? == 0 {
    return Err(user_not_found());
  }
  info!(%user_id, "User deleted.");
  Ok(HttpResponse::Ok().json(singleton(&Option::<User>::None, Some("User deleted successfully"))))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::PublicUser;
  use serde_json::json;

  fn payload(body: Value) -> CreateUserPayload {
    serde_json::from_value(body).unwrap()
  }

  #[test]
  fn business_flag_accepts_booleans_and_text() {
    assert_eq!(payload(json!({"email": "a@b.c"})).role(), Role::User);
    assert_eq!(payload(json!({"isBusinessAccount": true})).role(), Role::Business);
    assert_eq!(payload(json!({"isBusinessAccount": "TRUE"})).role(), Role::Business);
    assert_eq!(payload(json!({"isBusinessAccount": "yes"})).role(), Role::User);
    assert_eq!(payload(json!({"isBusinessAccount": false})).role(), Role::User);
  }

  #[test]
  fn public_view_hides_contact_and_payment_details() {
    let now = chrono::Utc::now();
    let own = serde_json::to_value(User {
      id: Uuid::new_v4(),
      external_id: "subject-1".into(),
      email: "owner@stall.test".into(),
      name: "Ah Seng".into(),
      role: Role::Business,
      payment_account_id: Some("acct_1".into()),
      created_at: now,
      updated_at: now,
    })
    .unwrap();
    assert_eq!(own["email"], "owner@stall.test");
    assert_eq!(own["paymentAccountId"], "acct_1");
    assert!(own.get("externalId").is_none());

    let public = serde_json::to_value(PublicUserView {
      user: PublicUser {
        id: Uuid::new_v4(),
        name: "Ah Seng".into(),
        role: Role::Business,
        created_at: now,
      },
      reviews: Vec::new(),
    })
    .unwrap();
    assert_eq!(public["name"], "Ah Seng");
    assert_eq!(public["role"], "BUSINESS");
    assert_eq!(public["reviews"], json!([]));
    assert!(public.get("email").is_none());
    assert!(public.get("paymentAccountId").is_none());
  }
}
