// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers.

use async_trait::async_trait;
use canteen_core::{CoreError, FoodDraft, Link, LinkRecord, NewItem, NutritionFacts, NutritionLookup};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;

// --- Link fixtures ---

/// A persisted link, shaped like the order / tracker-entry rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredLink {
  pub parent_id: u32,
  pub item_id: u32,
  pub count: i32,
  pub created_at: u64,
  pub updated_at: u64,
}

impl Link for StoredLink {
  type ParentId = u32;
  type ItemId = u32;

  fn parent_id(&self) -> u32 {
    self.parent_id
  }
  fn item_id(&self) -> u32 {
    self.item_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

impl LinkRecord for StoredLink {
  fn with_count(&self, count: i32) -> Self {
    Self { count, ..self.clone() }
  }
}

/// What a client sends back for a link it wants to keep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
  pub parent_id: u32,
  pub item_id: u32,
  pub count: i32,
}

impl Link for Submitted {
  type ParentId = u32;
  type ItemId = u32;

  fn parent_id(&self) -> u32 {
    self.parent_id
  }
  fn item_id(&self) -> u32 {
    self.item_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

pub const PARENT: u32 = 7;

pub fn stored(item_id: u32, count: i32) -> StoredLink {
  StoredLink {
    parent_id: PARENT,
    item_id,
    count,
    created_at: 1_700_000_000 + item_id as u64,
    updated_at: 1_700_000_500 + item_id as u64,
  }
}

pub fn submitted(item_id: u32, count: i32) -> Submitted {
  Submitted {
    parent_id: PARENT,
    item_id,
    count,
  }
}

pub fn connect(item_id: u32, count: Option<i32>) -> NewItem<u32, FoodDraft> {
  NewItem::Connect { item_id, count }
}

pub fn create(name: &str, count: Option<i32>) -> NewItem<u32, FoodDraft> {
  NewItem::Create {
    draft: FoodDraft::named(name),
    count,
  }
}

// --- Nutrition lookup stubs ---

pub fn facts(calories: f64, protein: f64) -> NutritionFacts {
  NutritionFacts {
    serving_qty: Some(1.0),
    serving_unit: Some("plate".to_string()),
    serving_weight_grams: Some(350.0),
    calories: Some(calories),
    protein: Some(protein),
    ..NutritionFacts::default()
  }
}

/// Answers from a fixed table; counts how often it was asked.
#[derive(Default)]
pub struct TableLookup {
  pub table: HashMap<String, NutritionFacts>,
  pub calls: AtomicUsize,
}

impl TableLookup {
  pub fn with(entries: &[(&str, NutritionFacts)]) -> Self {
    Self {
      table: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
      calls: AtomicUsize::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl NutritionLookup for TableLookup {
  async fn lookup(&self, query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.table.get(query).cloned())
  }
}

/// Fails for the listed queries, answers `facts(100, 5)` for everything else.
pub struct FlakyLookup {
  pub failing: Vec<String>,
}

#[async_trait]
impl NutritionLookup for FlakyLookup {
  async fn lookup(&self, query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    if self.failing.iter().any(|q| q == query) {
      anyhow::bail!("nutrition service unavailable for '{}'", query);
    }
    Ok(Some(facts(100.0, 5.0)))
  }
}

/// Sleeps for the number of milliseconds given as the query's numeric suffix,
/// so later drafts can finish first.
pub struct SlowLookup;

#[async_trait]
impl NutritionLookup for SlowLookup {
  async fn lookup(&self, query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    let delay: u64 = query.rsplit('-').next().and_then(|s| s.parse().ok()).unwrap_or(0);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    Ok(Some(facts(delay as f64, 1.0)))
  }
}

// --- Error type for workflow tests ---

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("core error: {0}")]
  Core(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<CoreError> for TestError {
  fn from(e: CoreError) -> Self {
    TestError::Core(format!("{:?}", e))
  }
}

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
