// core/src/enrichment.rs

//! Best-effort nutrition enrichment for food drafts.
//!
//! Enrichment never fails the owning write: a lookup error or an empty answer
//! leaves the draft exactly as the client sent it.

use crate::food::{FoodDraft, NutritionFacts};
use crate::reconcile::NewItem;
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

/// External nutrition database, queried by free-text food name.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
  /// `Ok(None)` means the service had nothing for this query.
  async fn lookup(&self, query: &str) -> anyhow::Result<Option<NutritionFacts>>;
}

/// Used when no nutrition service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughLookup;

#[async_trait]
impl NutritionLookup for PassThroughLookup {
  async fn lookup(&self, _query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    Ok(None)
  }
}

async fn enrich_one(lookup: &dyn NutritionLookup, mut draft: FoodDraft) -> FoodDraft {
  match lookup.lookup(&draft.name).await {
    Ok(Some(facts)) => {
      draft.fill_missing(&facts);
      debug!(food = %draft.name, "Draft enriched with nutrition facts.");
    }
    Ok(None) => debug!(food = %draft.name, "No nutrition facts found; draft kept as submitted."),
    Err(e) => warn!(food = %draft.name, error = %e, "Nutrition lookup failed; draft kept as submitted."),
  }
  draft
}

/// Enriches every draft concurrently. Output has the input's length and order.
#[instrument(name = "enrichment::enrich_drafts", skip_all, fields(drafts = drafts.len()))]
pub async fn enrich_drafts(lookup: &dyn NutritionLookup, drafts: Vec<FoodDraft>) -> Vec<FoodDraft> {
  if drafts.is_empty() {
    return drafts;
  }
  join_all(drafts.into_iter().map(|draft| enrich_one(lookup, draft))).await
}

/// Enriches the `Create` drafts among `items`; `Connect` references pass through untouched.
/// Every item keeps its position.
#[instrument(name = "enrichment::enrich_new_items", skip_all, fields(items = items.len()))]
pub async fn enrich_new_items<I>(lookup: &dyn NutritionLookup, items: Vec<NewItem<I, FoodDraft>>) -> Vec<NewItem<I, FoodDraft>> {
  join_all(items.into_iter().map(|item| async move {
    match item {
      NewItem::Create { draft, count } => NewItem::Create {
        draft: enrich_one(lookup, draft).await,
        count,
      },
      connect => connect,
    }
  }))
  .await
}
