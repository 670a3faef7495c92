// server/src/services/nutritionix.rs

//! Nutrition lookup backed by the Nutritionix natural-language nutrients API.

use crate::config::NutritionixConfig;
use anyhow::Context;
use async_trait::async_trait;
use canteen_core::{NutritionFacts, NutritionLookup};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

#[derive(Debug, Default, Deserialize)]
pub struct NutrientsResponse {
  #[serde(default)]
  pub foods: Vec<NutrientsFood>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NutrientsFood {
  pub serving_qty: Option<f64>,
  pub serving_unit: Option<String>,
  pub serving_weight_grams: Option<f64>,
  pub nf_calories: Option<f64>,
  pub nf_total_fat: Option<f64>,
  pub nf_saturated_fat: Option<f64>,
  pub nf_cholesterol: Option<f64>,
  pub nf_sodium: Option<f64>,
  pub nf_total_carbohydrate: Option<f64>,
  pub nf_dietary_fiber: Option<f64>,
  pub nf_sugars: Option<f64>,
  pub nf_protein: Option<f64>,
  pub nf_potassium: Option<f64>,
}

impl From<NutrientsFood> for NutritionFacts {
  fn from(food: NutrientsFood) -> Self {
    NutritionFacts {
      serving_qty: food.serving_qty,
      serving_unit: food.serving_unit,
      serving_weight_grams: food.serving_weight_grams,
      calories: food.nf_calories,
      total_fat: food.nf_total_fat,
      saturated_fat: food.nf_saturated_fat,
      cholesterol: food.nf_cholesterol,
      sodium: food.nf_sodium,
      total_carbohydrate: food.nf_total_carbohydrate,
      dietary_fiber: food.nf_dietary_fiber,
      sugars: food.nf_sugars,
      protein: food.nf_protein,
      potassium: food.nf_potassium,
    }
  }
}

impl NutrientsResponse {
  /// The service answers a free-text query with one food per recognised phrase; the first one is used.
  pub fn into_facts(self) -> Option<NutritionFacts> {
    self.foods.into_iter().next().map(NutritionFacts::from)
  }
}

pub struct NutritionixLookup {
  client: reqwest::Client,
  config: NutritionixConfig,
}

impl NutritionixLookup {
  pub fn new(client: reqwest::Client, config: NutritionixConfig) -> Self {
    Self { client, config }
  }
}

#[async_trait]
impl NutritionLookup for NutritionixLookup {
  #[instrument(name = "nutritionix::lookup", skip(self), err(Display))]
  async fn lookup(&self, query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    let response = self
      .client
      .post(&self.config.api_url)
      .header("x-app-id", &self.config.app_id)
      .header("x-app-key", &self.config.app_key)
      .json(&json!({ "query": query }))
      .send()
      .await
      .context("Nutritionix request failed")?;

    // 404 is how the service says it recognised no food in the query.
    if response.status() == StatusCode::NOT_FOUND {
      debug!("Nutritionix matched no food.");
      return Ok(None);
    }
    let body: NutrientsResponse = response
      .error_for_status()
      .context("Nutritionix returned an error status")?
      .json()
      .await
      .context("Nutritionix response was not the expected JSON")?;
    Ok(body.into_facts())
  }
}
