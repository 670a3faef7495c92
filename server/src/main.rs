// server/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod pipelines;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::errors::AppError;
use crate::services::geocoding::MapsCoGeocoder;
use crate::services::nutritionix::NutritionixLookup;
use crate::services::payment_gateway::build_payment_gateway;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use canteen_core::{NutritionLookup, PassThroughLookup, Workflows};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  // LOG_FORMAT has to be known before the subscriber exists, so the config is loaded first.
  let app_config = AppConfig::from_env();
  let log_format = app_config.as_ref().map(|c| c.log_format).unwrap_or(LogFormat::Pretty);
  init_tracing(log_format);

  tracing::info!("Starting canteen server...");
  let app_config = Arc::new(app_config.map_err(|e| startup_error("Failed to load application configuration", e))?);

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&db_pool)
      .await
      .map_err(|e| startup_error("Failed to run database migrations", e))?;
    tracing::info!("Database migrations applied.");
  }

  let http_client =
    services::build_http_client(&app_config).map_err(|e| startup_error("Failed to build the HTTP client", e))?;

  let nutrition: Arc<dyn NutritionLookup> = match app_config.nutritionix.clone() {
    Some(nutritionix) => Arc::new(NutritionixLookup::new(http_client.clone(), nutritionix)),
    None => Arc::new(PassThroughLookup),
  };
  let geocoder = Arc::new(MapsCoGeocoder::new(
    http_client,
    app_config.geocoding_api_url.clone(),
    app_config.geocoding_api_key.clone(),
  ));

  let payments = build_payment_gateway(app_config.payment_gateway);

  let workflows = Arc::new(Workflows::<AppError>::new());
  pipelines::register_all_workflows(&workflows);

  let app_state = AppState {
    db_pool,
    workflows,
    config: app_config.clone(),
    nutrition,
    geocoder,
    payments,
  };

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .configure(web::configure_extractors)
      .configure(web::configure_app_routes)
      .wrap(tracing_actix_web::TracingLogger::default())
  })
  .bind(&server_address)?
  .run()
  .await
}
