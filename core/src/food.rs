// core/src/food.rs

//! Food drafts (foods that do not exist yet) and nutrition facts.

use serde::{Deserialize, Serialize};

/// Attributes of a food the client wants created.
///
/// Nutrition values are per serving. Any of them may be left out; the
/// enrichment step fills the gaps from a nutrition lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDraft {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub serving_qty: Option<f64>,
  #[serde(default)]
  pub serving_unit: Option<String>,
  #[serde(default)]
  pub serving_weight_grams: Option<f64>,
  #[serde(default)]
  pub calories: Option<f64>,
  #[serde(default)]
  pub total_fat: Option<f64>,
  #[serde(default)]
  pub saturated_fat: Option<f64>,
  #[serde(default)]
  pub cholesterol: Option<f64>,
  #[serde(default)]
  pub sodium: Option<f64>,
  #[serde(default)]
  pub total_carbohydrate: Option<f64>,
  #[serde(default)]
  pub dietary_fiber: Option<f64>,
  #[serde(default)]
  pub sugars: Option<f64>,
  #[serde(default)]
  pub protein: Option<f64>,
  #[serde(default)]
  pub potassium: Option<f64>,
}

/// What a nutrition lookup knows about one food, per serving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutritionFacts {
  pub serving_qty: Option<f64>,
  pub serving_unit: Option<String>,
  pub serving_weight_grams: Option<f64>,
  pub calories: Option<f64>,
  pub total_fat: Option<f64>,
  pub saturated_fat: Option<f64>,
  pub cholesterol: Option<f64>,
  pub sodium: Option<f64>,
  pub total_carbohydrate: Option<f64>,
  pub dietary_fiber: Option<f64>,
  pub sugars: Option<f64>,
  pub protein: Option<f64>,
  pub potassium: Option<f64>,
}

// Zero counts as "not provided": clients send 0 for fields they left blank.
fn fill(slot: &mut Option<f64>, looked_up: Option<f64>) {
  if slot.map_or(true, |value| value == 0.0) {
    if let Some(value) = looked_up {
      *slot = Some(value);
    }
  }
}

impl FoodDraft {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Copies every looked-up value into a field that is missing or zero.
  /// Values the client provided are never overwritten.
  pub fn fill_missing(&mut self, facts: &NutritionFacts) {
    fill(&mut self.serving_qty, facts.serving_qty);
    if self.serving_unit.as_deref().map_or(true, str::is_empty) {
      if let Some(unit) = &facts.serving_unit {
        self.serving_unit = Some(unit.clone());
      }
    }
    fill(&mut self.serving_weight_grams, facts.serving_weight_grams);
    fill(&mut self.calories, facts.calories);
    fill(&mut self.total_fat, facts.total_fat);
    fill(&mut self.saturated_fat, facts.saturated_fat);
    fill(&mut self.cholesterol, facts.cholesterol);
    fill(&mut self.sodium, facts.sodium);
    fill(&mut self.total_carbohydrate, facts.total_carbohydrate);
    fill(&mut self.dietary_fiber, facts.dietary_fiber);
    fill(&mut self.sugars, facts.sugars);
    fill(&mut self.protein, facts.protein);
    fill(&mut self.potassium, facts.potassium);
  }

  /// A draft can only become a food row if it has a name.
  pub fn validate_for_create(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("Food name is required to create a new food.".to_string());
    }
    Ok(())
  }
}
