// server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::geocoding::Geocoder;
use crate::services::payment_gateway::PaymentGateway;
use canteen_core::{NutritionLookup, Workflows};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub workflows: Arc<Workflows<AppError>>,
  pub config: Arc<AppConfig>,
  pub nutrition: Arc<dyn NutritionLookup>,
  pub geocoder: Arc<dyn Geocoder>,
  pub payments: Arc<dyn PaymentGateway>,
}
