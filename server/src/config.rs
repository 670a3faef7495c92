// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

/// Payment processor backing payment sheets and connected accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentGatewayKind {
  /// In-process stand-in; intents are never charged.
  Mock,
}

/// Credentials for the Nutritionix natural-language nutrients endpoint.
#[derive(Debug, Clone)]
pub struct NutritionixConfig {
  pub app_id: String,
  pub app_key: String,
  pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  // None when the app id or key is missing: enrichment then passes drafts through.
  pub nutritionix: Option<NutritionixConfig>,

  pub geocoding_api_url: String,
  pub geocoding_api_key: Option<String>,

  pub payment_gateway: PaymentGatewayKind,
  pub payment_publishable_key: String,
  pub payment_webhook_secret: String,
  pub payment_currency: String,

  pub http_client_timeout_secs: u64,
  pub log_format: LogFormat,
}

const DEFAULT_NUTRITIONIX_API_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";
const DEFAULT_GEOCODING_API_URL: &str = "https://geocode.maps.co/search";

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source. Empty values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let require =
      |name: &str| get(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", get("SERVER_PORT"), 8080u16)?;
    let database_url = require("DATABASE_URL")?;
    let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 10u32)?;
    let run_migrations = parse_var("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), false)?;

    let nutritionix = match (get("NUTRITIONIX_APP_ID"), get("NUTRITIONIX_APP_KEY")) {
      (Some(app_id), Some(app_key)) => Some(NutritionixConfig {
        app_id,
        app_key,
        api_url: get("NUTRITIONIX_API_URL").unwrap_or_else(|| DEFAULT_NUTRITIONIX_API_URL.to_string()),
      }),
      _ => None,
    };

    let geocoding_api_url = get("GEOCODING_API_URL").unwrap_or_else(|| DEFAULT_GEOCODING_API_URL.to_string());
    let geocoding_api_key = get("GEOCODING_API_KEY");

    // No default: fake intents must be asked for explicitly.
    let payment_gateway = match require("PAYMENT_GATEWAY")?.trim().to_lowercase().as_str() {
      "mock" => PaymentGatewayKind::Mock,
      other => return Err(AppError::Config(format!("Invalid PAYMENT_GATEWAY: '{}'", other))),
    };
    let payment_publishable_key = require("PAYMENT_PUBLISHABLE_KEY")?;
    let payment_webhook_secret = require("PAYMENT_WEBHOOK_SECRET")?;
    let payment_currency = get("PAYMENT_CURRENCY")
      .map(|c| c.to_lowercase())
      .unwrap_or_else(|| "sgd".to_string());

    let http_client_timeout_secs = parse_var("HTTP_CLIENT_TIMEOUT_SECS", get("HTTP_CLIENT_TIMEOUT_SECS"), 10u64)?;

    let log_format = match get("LOG_FORMAT").map(|f| f.to_lowercase()).as_deref() {
      None | Some("pretty") | Some("text") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT: '{}'", other))),
    };

    if nutritionix.is_none() {
      tracing::warn!("Nutritionix credentials not set; new foods will not be enriched.");
    }
    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      nutritionix,
      geocoding_api_url,
      geocoding_api_key,
      payment_gateway,
      payment_publishable_key,
      payment_webhook_secret,
      payment_currency,
      http_client_timeout_secs,
      log_format,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
