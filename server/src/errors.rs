// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use canteen_core::CoreError;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to hint (`"Required"`, `"Optional"`), reported when a body is incomplete.
pub type FieldHints = BTreeMap<&'static str, &'static str>;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Missing or invalid fields: {0:?}")]
  MissingFields(FieldHints),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  /// The reconciled edit set could not be written; the transaction was rolled back.
  #[error("Failed to apply item edits to {parent}: {source}")]
  ApplyFailed {
    parent: String,
    #[source]
    source: sqlx::Error,
  },

  #[error("Workflow Error: {0}")]
  Workflow(#[from] CoreError),

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A workflow stopped early where the handler needed it to complete.
  #[error("Workflow execution was halted by a step.")]
  WorkflowHalted,
}

impl AppError {
  pub fn missing_fields(fields: &[(&'static str, &'static str)]) -> Self {
    AppError::MissingFields(fields.iter().copied().collect())
  }

  pub fn unauthorized() -> Self {
    AppError::Forbidden("Unauthorized".to_string())
  }

  // The client-facing message; internal details stay in the logs.
  fn public_message(&self) -> Value {
    match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Payment(m) => Value::String(m.clone()),
      AppError::MissingFields(fields) => json!(fields),
      AppError::Config(_) => json!("Configuration issue"),
      AppError::Sqlx(_) => json!("Database operation failed"),
      AppError::ApplyFailed { parent, .. } => json!(format!("Could not save the changes to {}", parent)),
      AppError::Workflow(_) => json!("Workflow processing error"),
      AppError::Internal(_) => json!("An internal error occurred"),
      AppError::WorkflowHalted => json!("Process halted by business logic."),
    }
  }
}

/// `{"error": {"code": <status>, "message": <string or field map>}}`
pub fn error_body(code: StatusCode, message: Value) -> Value {
  json!({
    "error": {
      "code": code.as_u16(),
      "message": message,
    }
  })
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::WorkflowHalted => StatusCode::CONFLICT,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::ApplyFailed { .. }
      | AppError::Workflow(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }
    HttpResponse::build(status).json(error_body(status, self.public_message()))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.error_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_rt::test]
  async fn validation_error_uses_envelope() {
    let (status, body) = body_of(AppError::Validation("Cannot update paid order".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": {"code": 400, "message": "Cannot update paid order"}}));
  }

  #[actix_rt::test]
  async fn missing_fields_render_as_a_field_map() {
    let err = AppError::missing_fields(&[("items", "Required"), ("newItems", "Optional")]);
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], json!({"items": "Required", "newItems": "Optional"}));
  }

  #[actix_rt::test]
  async fn database_details_are_not_leaked() {
    let (status, body) = body_of(AppError::Sqlx(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Database operation failed");
  }

  #[actix_rt::test]
  async fn apply_failure_names_the_parent() {
    let err = AppError::ApplyFailed {
      parent: "order".into(),
      source: sqlx::Error::PoolTimedOut,
    };
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Could not save the changes to order");
  }

  #[test]
  fn status_codes_follow_the_error_kind() {
    assert_eq!(AppError::unauthorized().status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    let core = CoreError::WorkflowNotRegistered {
      context_type: "Ctx".into(),
    };
    assert_eq!(AppError::from(core).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn anyhow_wrapping_sqlx_keeps_the_database_variant() {
    let err = AppError::from(anyhow::Error::new(sqlx::Error::RowNotFound));
    assert!(matches!(err, AppError::Sqlx(_)));
    let err = AppError::from(anyhow::anyhow!("boom"));
    assert!(matches!(err, AppError::Internal(ref m) if m == "boom"));
  }
}
