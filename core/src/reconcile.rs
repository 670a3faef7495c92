// core/src/reconcile.rs

//! Item-set reconciliation.
//!
//! A parent aggregate (an order, a caloric tracker entry) owns a set of links to
//! food items, each with a count. When a client submits the state it wants, the
//! server diffs the links it just read against that submission and gets back
//! three edit sets:
//!
//! * `to_update`: links the client kept but with a different count.
//! * `to_delete`: links the client did not mention at all (full replacement).
//! * `to_insert`: new links, either to an existing item or to one created first.
//!
//! The reconciler is pure and synchronous. Applying the edits atomically is the
//! caller's job.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, instrument};

/// Natural key of a link: the (parent, item) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey<P, I> {
  pub parent_id: P,
  pub item_id: I,
}

/// Key extraction for anything that identifies a (parent, item, count) link.
///
/// Both persisted rows and client submissions implement this; the two call
/// sites (orders and caloric tracker entries) only differ in which fields back
/// `parent_id`.
pub trait Link {
  type ParentId: Copy + Eq + Hash + Debug;
  type ItemId: Copy + Eq + Hash + Debug;

  fn parent_id(&self) -> Self::ParentId;
  fn item_id(&self) -> Self::ItemId;
  fn count(&self) -> i32;

  fn link_key(&self) -> LinkKey<Self::ParentId, Self::ItemId> {
    LinkKey {
      parent_id: self.parent_id(),
      item_id: self.item_id(),
    }
  }
}

/// A persisted link. `with_count` produces the row as it should look after an update.
pub trait LinkRecord: Link + Clone {
  fn with_count(&self, count: i32) -> Self;
}

/// A link the client wants to add.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem<I, D> {
  /// Attach an item that already exists.
  Connect { item_id: I, count: Option<i32> },
  /// Create the item from `draft`, then attach it.
  Create { draft: D, count: Option<i32> },
}

impl<I, D> NewItem<I, D> {
  pub fn count(&self) -> Option<i32> {
    match self {
      NewItem::Connect { count, .. } | NewItem::Create { count, .. } => *count,
    }
  }

  pub fn is_create(&self) -> bool {
    matches!(self, NewItem::Create { .. })
  }
}

/// A link the store must create. `count: None` leaves the column default in charge.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion<I, D> {
  Connect { item_id: I, count: Option<i32> },
  Create { draft: D, count: Option<i32> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditSummary {
  pub updated: usize,
  pub deleted: usize,
  pub inserted: usize,
}

/// The three edit sets produced by [`reconcile`].
#[derive(Debug, Clone)]
pub struct ItemEdits<R: Link, D> {
  /// Existing links carrying the newly submitted count.
  pub to_update: Vec<R>,
  /// Existing links exactly as read, timestamps included; deleted by full-key filter.
  pub to_delete: Vec<R>,
  pub to_insert: Vec<Insertion<R::ItemId, D>>,
}

impl<R: Link, D> ItemEdits<R, D> {
  pub fn is_empty(&self) -> bool {
    self.to_update.is_empty() && self.to_delete.is_empty() && self.to_insert.is_empty()
  }

  pub fn summary(&self) -> EditSummary {
    EditSummary {
      updated: self.to_update.len(),
      deleted: self.to_delete.len(),
      inserted: self.to_insert.len(),
    }
  }
}

/// Diffs `existing` against `submitted` and plans the insertion of `new_items`.
///
/// `existing` must be the parent's complete link set, read right before the call:
/// anything missing from it would never be considered for deletion.
/// An empty `submitted` deletes every existing link.
#[instrument(
  name = "reconcile",
  skip_all,
  fields(existing = existing.len(), submitted = submitted.len(), new_items = new_items.len())
)]
pub fn reconcile<R, S, D>(existing: &[R], submitted: &[S], new_items: Vec<NewItem<R::ItemId, D>>) -> ItemEdits<R, D>
where
  R: LinkRecord,
  S: Link<ParentId = R::ParentId, ItemId = R::ItemId>,
{
  // Duplicate submissions of one pair: the first count is the one that counts.
  let mut submitted_counts: HashMap<LinkKey<R::ParentId, R::ItemId>, i32> = HashMap::with_capacity(submitted.len());
  for item in submitted {
    submitted_counts.entry(item.link_key()).or_insert(item.count());
  }

  let to_update: Vec<R> = existing
    .iter()
    .filter_map(|link| match submitted_counts.get(&link.link_key()) {
      Some(&count) if count != link.count() => Some(link.with_count(count)),
      _ => None,
    })
    .collect();

  let to_delete: Vec<R> = existing
    .iter()
    .filter(|link| !submitted_counts.contains_key(&link.link_key()))
    .cloned()
    .collect();

  let to_insert = plan_insertions(existing, new_items);

  let edits = ItemEdits {
    to_update,
    to_delete,
    to_insert,
  };
  debug!(summary = ?edits.summary(), "Item edits computed.");
  edits
}

/// Connect references first (deduplicated, minus already-linked items), then creates.
fn plan_insertions<R, D>(existing: &[R], new_items: Vec<NewItem<R::ItemId, D>>) -> Vec<Insertion<R::ItemId, D>>
where
  R: Link,
{
  let already_linked: HashSet<R::ItemId> = existing.iter().map(|link| link.item_id()).collect();
  let mut seen: HashSet<R::ItemId> = HashSet::new();
  let mut connects = Vec::new();
  let mut creates = Vec::new();

  for item in new_items {
    match item {
      NewItem::Connect { item_id, count } => {
        // Dedup runs before the already-linked filter; first occurrence wins either way.
        if seen.insert(item_id) && !already_linked.contains(&item_id) {
          connects.push(Insertion::Connect { item_id, count });
        }
      }
      NewItem::Create { draft, count } => creates.push(Insertion::Create { draft, count }),
    }
  }

  connects.extend(creates);
  connects
}
