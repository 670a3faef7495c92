// server/src/web/extractors.rs

use crate::db::users;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";

/// The caller, resolved from `Authorization: Bearer <subject>`.
///
/// Token verification happens upstream at the identity provider; the subject
/// is matched against `users.external_id`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub id: Uuid,
  pub role: Role,
}

impl CurrentUser {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Owners and admins may act on a resource owned by `owner_id`.
  pub fn may_act_for(&self, owner_id: Option<Uuid>) -> bool {
    self.is_admin() || owner_id == Some(self.id)
  }
}

impl From<User> for CurrentUser {
  fn from(user: User) -> Self {
    CurrentUser {
      id: user.id,
      role: user.role,
    }
  }
}

/// Extracts the subject from an `Authorization` header value.
pub fn bearer_subject(header: Option<&str>) -> Result<&str, AppError> {
  let header = header.ok_or_else(|| AppError::Auth("Please provide a token".to_string()))?;
  header
    .strip_prefix(BEARER_PREFIX)
    .map(str::trim)
    .ok_or_else(|| AppError::Auth(format!("Token must start with {}", BEARER_PREFIX)))
}

impl FromRequest for CurrentUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    // Unreadable (non-ASCII) headers fail the prefix check.
    let header = req.headers().get(AUTHORIZATION).map(|value| value.to_str().unwrap_or_default());
    let subject = bearer_subject(header).map(str::to_owned);
    let state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
      let subject = subject?;
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;

      match users::find_by_external_id(&state.db_pool, &subject).await? {
        Some(user) => {
          debug!(user_id = %user.id, role = ?user.role, "Request authenticated.");
          Ok(CurrentUser::from(user))
        }
        None => {
          warn!("Bearer subject does not match any user.");
          Err(AppError::Forbidden("Unauthorized\nUser not found in server database".to_string()))
        }
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::{http::StatusCode, test as actix_test, App, HttpResponse};
  use serde_json::Value;

  #[test]
  fn subject_follows_the_bearer_prefix() {
    assert_eq!(bearer_subject(Some("Bearer abc123")).unwrap(), "abc123");
  }

  #[test]
  fn missing_or_malformed_headers_are_rejected() {
    let missing = bearer_subject(None).unwrap_err();
    assert!(matches!(missing, AppError::Auth(ref m) if m == "Please provide a token"));
    let wrong = bearer_subject(Some("Token abc")).unwrap_err();
    assert!(matches!(wrong, AppError::Auth(ref m) if m == "Token must start with Bearer "));
    assert!(bearer_subject(Some("bearer abc")).is_err());
  }

  #[test]
  fn ownership_checks() {
    let id = Uuid::new_v4();
    let user = CurrentUser {
      id,
      role: Role::User,
    };
    assert!(user.may_act_for(Some(id)));
    assert!(!user.may_act_for(Some(Uuid::new_v4())));
    assert!(!user.may_act_for(None));
    let admin = CurrentUser {
      role: Role::Admin,
      ..user
    };
    assert!(admin.may_act_for(None));
  }

  async fn whoami(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().body(user.id.to_string())
  }

  #[actix_web::test]
  async fn extractor_answers_401_before_touching_the_database() {
    let app = actix_test::init_service(App::new().route("/me", web::get().to(whoami))).await;

    let req = actix_test::TestRequest::get().uri("/me").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 401);
    assert_eq!(body["error"]["message"], "Please provide a token");

    let req = actix_test::TestRequest::get()
      .uri("/me")
      .insert_header((AUTHORIZATION, "Basic abc"))
      .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
