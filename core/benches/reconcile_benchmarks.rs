use canteen_core::{enrich_drafts, reconcile, FoodDraft, Link, LinkRecord, NewItem, NutritionFacts, NutritionLookup};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

#[derive(Clone, Debug)]
struct BenchLink {
  parent_id: u64,
  item_id: u64,
  count: i32,
}

impl Link for BenchLink {
  type ParentId = u64;
  type ItemId = u64;

  fn parent_id(&self) -> u64 {
    self.parent_id
  }
  fn item_id(&self) -> u64 {
    self.item_id
  }
  fn count(&self) -> i32 {
    self.count
  }
}

impl LinkRecord for BenchLink {
  fn with_count(&self, count: i32) -> Self {
    Self { count, ..self.clone() }
  }
}

fn links(n: u64) -> Vec<BenchLink> {
  (0..n)
    .map(|i| BenchLink {
      parent_id: 1,
      item_id: i,
      count: (i % 5) as i32 + 1,
    })
    .collect()
}

// Keeps two thirds of the links, bumps every other kept count, adds n/4 references (half duplicates).
fn submission(existing: &[BenchLink]) -> (Vec<BenchLink>, Vec<NewItem<u64, FoodDraft>>) {
  let n = existing.len() as u64;
  let submitted = existing
    .iter()
    .filter(|l| l.item_id % 3 != 0)
    .map(|l| if l.item_id % 2 == 0 { l.with_count(l.count + 1) } else { l.clone() })
    .collect();
  let new_items = (0..n / 4)
    .map(|i| NewItem::Connect {
      item_id: n + i / 2,
      count: Some(1),
    })
    .collect();
  (submitted, new_items)
}

fn bench_reconcile(c: &mut Criterion) {
  let mut group = c.benchmark_group("Reconcile");

  for size in [5u64, 50, 500].iter() {
    let existing = links(*size);
    let (submitted, new_items) = submission(&existing);

    group.throughput(Throughput::Elements(*size));
    group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
      b.iter(|| reconcile(&existing, &submitted, new_items.clone()));
    });
  }
  group.finish();
}

struct InstantLookup;

#[async_trait::async_trait]
impl NutritionLookup for InstantLookup {
  async fn lookup(&self, _query: &str) -> anyhow::Result<Option<NutritionFacts>> {
    Ok(Some(NutritionFacts {
      calories: Some(420.0),
      protein: Some(18.0),
      ..NutritionFacts::default()
    }))
  }
}

fn bench_enrichment(c: &mut Criterion) {
  let mut group = c.benchmark_group("EnrichDrafts");
  let rt = Runtime::new().unwrap();

  for drafts in [1usize, 10, 50].iter() {
    group.throughput(Throughput::Elements(*drafts as u64));
    group.bench_with_input(BenchmarkId::from_parameter(drafts), drafts, |b, &n| {
      b.to_async(&rt).iter_batched(
        || (0..n).map(|i| FoodDraft::named(format!("dish {}", i))).collect::<Vec<_>>(),
        |batch| async move { enrich_drafts(&InstantLookup, batch).await },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

criterion_group!(benches, bench_reconcile, bench_enrichment);
criterion_main!(benches);
