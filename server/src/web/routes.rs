// server/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{
  canteen_handlers, caloric_tracker_handlers, menu_handlers, order_handlers, payment_handlers, review_handlers, stall_handlers,
  user_handlers,
};
use actix_web::{web, HttpResponse};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Extractor settings: malformed bodies, paths and queries answer 400 in the error envelope.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Invalid JSON body: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Invalid path: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Invalid query: {}", err)).into()
    }));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{id}/fulfill", web::patch().to(order_handlers::fulfill_order_handler))
          .route("/{id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}", web::patch().to(order_handlers::update_order_handler))
          .route("/{id}", web::delete().to(order_handlers::delete_order_handler)),
      )
      .service(
        web::scope("/caloric-tracker")
          .route("/search", web::get().to(caloric_tracker_handlers::search_foods_handler))
          .route("/entry", web::post().to(caloric_tracker_handlers::create_entry_handler))
          .route("/entry", web::patch().to(caloric_tracker_handlers::update_entry_handler))
          .route("/entry", web::delete().to(caloric_tracker_handlers::delete_entry_handler))
          .route("", web::get().to(caloric_tracker_handlers::get_tracker_handler))
          .route("", web::post().to(caloric_tracker_handlers::create_tracker_handler))
          .route("", web::delete().to(caloric_tracker_handlers::delete_tracker_handler)),
      )
      .service(
        web::scope("/menus")
          .route("", web::post().to(menu_handlers::create_menu_handler))
          .route("/{id}", web::get().to(menu_handlers::get_menu_handler))
          .route("/{id}", web::delete().to(menu_handlers::delete_menu_handler)),
      )
      .service(
        web::scope("/canteens")
          .route("", web::get().to(canteen_handlers::list_canteens_handler))
          .route("", web::post().to(canteen_handlers::create_canteen_handler))
          .route("/{id}", web::get().to(canteen_handlers::get_canteen_handler))
          .route("/{id}", web::patch().to(canteen_handlers::update_canteen_handler))
          .route("/{id}", web::delete().to(canteen_handlers::delete_canteen_handler)),
      )
      .service(
        web::scope("/stalls")
          .route("", web::get().to(stall_handlers::list_stalls_handler))
          .route("", web::post().to(stall_handlers::create_stall_handler))
          .route("/{id}/owner", web::post().to(stall_handlers::assign_owner_handler))
          .route("/{id}/review", web::post().to(stall_handlers::create_review_handler))
          .route("/{id}", web::get().to(stall_handlers::get_stall_handler))
          .route("/{id}", web::patch().to(stall_handlers::update_stall_handler))
          .route("/{id}", web::delete().to(stall_handlers::delete_stall_handler)),
      )
      .service(
        web::scope("/reviews")
          .route("/{id}", web::get().to(review_handlers::get_review_handler))
          .route("/{id}", web::patch().to(review_handlers::update_review_handler))
          .route("/{id}", web::delete().to(review_handlers::delete_review_handler)),
      )
      .service(
        web::scope("/users")
          .route("", web::get().to(user_handlers::current_user_handler))
          .route("", web::post().to(user_handlers::create_user_handler))
          .route("/{id}", web::get().to(user_handlers::get_user_handler))
          .route("/{id}", web::patch().to(user_handlers::update_user_handler))
          .route("/{id}", web::delete().to(user_handlers::delete_user_handler)),
      )
      .service(
        web::scope("/payments")
          .route("/publishable-key", web::get().to(payment_handlers::publishable_key_handler))
          .route("/payment-sheet", web::post().to(payment_handlers::payment_sheet_handler))
          .route("/webhook", web::post().to(payment_handlers::payment_webhook_handler)),
      ),
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::{http::StatusCode, test as actix_test, App};
  use serde_json::Value;

  #[actix_web::test]
  async fn health_answers_ok() {
    let app = actix_test::init_service(App::new().configure(configure_app_routes)).await;
    let req = actix_test::TestRequest::get().uri("/api/health").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
  }

  async fn echo(body: web::Json<Value>) -> HttpResponse {
    HttpResponse::Ok().json(body.into_inner())
  }

  #[actix_web::test]
  async fn malformed_json_uses_the_error_envelope() {
    let app = actix_test::init_service(App::new().configure(configure_extractors).route("/echo", web::post().to(echo))).await;
    let req = actix_test::TestRequest::post()
      .uri("/echo")
      .insert_header(("content-type", "application/json"))
      .set_payload("{not json")
      .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"].as_str().unwrap().starts_with("Invalid JSON body"));
  }
}
