// tests/reconcile_tests.rs
mod common;

use canteen_core::{reconcile, EditSummary, FoodDraft, Insertion, Link, NewItem};
use common::*;
use std::collections::HashSet;

fn no_new_items() -> Vec<NewItem<u32, FoodDraft>> {
  Vec::new()
}

#[test]
fn test_end_to_end_update_delete_insert() {
  setup_tracing();
  let existing = vec![stored(1, 2), stored(2, 5)];
  let submission = vec![submitted(1, 3)];
  let new_items = vec![connect(3, Some(1))];

  let edits = reconcile(&existing, &submission, new_items);

  assert_eq!(edits.to_update, vec![stored(1, 3)]);
  assert_eq!(edits.to_delete, vec![stored(2, 5)]);
  assert_eq!(
    edits.to_insert,
    vec![Insertion::Connect {
      item_id: 3,
      count: Some(1)
    }]
  );
  assert_eq!(
    edits.summary(),
    EditSummary {
      updated: 1,
      deleted: 1,
      inserted: 1
    }
  );
}

#[test]
fn test_updates_keep_original_timestamps() {
  let existing = vec![stored(4, 1)];
  let edits = reconcile(&existing, &[submitted(4, 9)], no_new_items());

  let updated = &edits.to_update[0];
  assert_eq!(updated.count, 9);
  assert_eq!(updated.created_at, existing[0].created_at);
  assert_eq!(updated.updated_at, existing[0].updated_at);
}

#[test]
fn test_deletions_carry_full_key_and_timestamps() {
  let existing = vec![stored(1, 2), stored(2, 5)];
  let edits = reconcile(&existing, &[submitted(1, 2)], no_new_items());

  assert_eq!(edits.to_delete.len(), 1);
  let deleted = &edits.to_delete[0];
  assert_eq!(deleted, &existing[1]);
  assert_eq!(deleted.parent_id, PARENT);
}

#[test]
fn test_mirrored_submission_is_a_no_op() {
  let existing = vec![stored(1, 2), stored(2, 5), stored(3, 1)];
  let mirror: Vec<Submitted> = existing.iter().map(|l| submitted(l.item_id, l.count)).collect();

  let edits = reconcile(&existing, &mirror, no_new_items());

  assert!(edits.to_update.is_empty());
  assert!(edits.to_delete.is_empty());
  assert!(edits.to_insert.is_empty());
  assert!(edits.is_empty());
}

#[test]
fn test_empty_submission_deletes_everything() {
  let existing = vec![stored(1, 2), stored(2, 5)];
  let edits = reconcile(&existing, &Vec::<Submitted>::new(), vec![connect(9, None)]);

  assert!(edits.to_update.is_empty());
  assert_eq!(edits.to_delete, existing);
  assert_eq!(
    edits.to_insert,
    vec![Insertion::Connect {
      item_id: 9,
      count: None
    }]
  );
}

#[test]
fn test_partition_over_mixed_submission() {
  let existing: Vec<StoredLink> = (1..=8).map(|i| stored(i, i as i32)).collect();
  // keep 1,2 unchanged; change 3,4,5; drop 6,7,8; mention an unknown item 42
  let submission = vec![
    submitted(1, 1),
    submitted(2, 2),
    submitted(3, 30),
    submitted(4, 40),
    submitted(5, 50),
    submitted(42, 1),
  ];

  let edits = reconcile(&existing, &submission, no_new_items());

  let updated: HashSet<u32> = edits.to_update.iter().map(|l| l.item_id()).collect();
  let deleted: HashSet<u32> = edits.to_delete.iter().map(|l| l.item_id()).collect();
  assert!(updated.is_disjoint(&deleted));
  assert_eq!(updated, HashSet::from([3, 4, 5]));
  assert_eq!(deleted, HashSet::from([6, 7, 8]));

  let untouched: HashSet<u32> = existing
    .iter()
    .map(|l| l.item_id)
    .filter(|id| !updated.contains(id) && !deleted.contains(id))
    .collect();
  assert_eq!(untouched, HashSet::from([1, 2]));
  assert_eq!(updated.len() + deleted.len() + untouched.len(), existing.len());
}

#[test]
fn test_submission_for_unknown_pair_is_ignored() {
  let existing = vec![stored(1, 2)];
  let stranger = Submitted {
    parent_id: PARENT + 1,
    item_id: 1,
    count: 10,
  };

  let edits = reconcile(&existing, &[stranger], no_new_items());

  // The pair (PARENT, 1) is not reaffirmed, so it goes; the foreign pair does nothing.
  assert!(edits.to_update.is_empty());
  assert_eq!(edits.to_delete, existing);
  assert!(edits.to_insert.is_empty());
}

#[test]
fn test_duplicate_submission_first_count_wins() {
  let existing = vec![stored(1, 2)];
  let edits = reconcile(&existing, &[submitted(1, 2), submitted(1, 8)], no_new_items());
  assert!(edits.to_update.is_empty());

  let edits = reconcile(&existing, &[submitted(1, 8), submitted(1, 2)], no_new_items());
  assert_eq!(edits.to_update, vec![stored(1, 8)]);
}

#[test]
fn test_connect_references_are_deduplicated() {
  let edits = reconcile(
    &Vec::<StoredLink>::new(),
    &Vec::<Submitted>::new(),
    vec![connect(5, Some(1)), connect(6, None), connect(5, Some(4))],
  );

  assert_eq!(
    edits.to_insert,
    vec![
      Insertion::Connect {
        item_id: 5,
        count: Some(1)
      },
      Insertion::Connect {
        item_id: 6,
        count: None
      },
    ]
  );
}

#[test]
fn test_already_linked_reference_is_excluded() {
  let existing = vec![stored(1, 2), stored(2, 5)];
  let edits = reconcile(
    &existing,
    &[submitted(1, 2), submitted(2, 5)],
    vec![connect(2, Some(3)), connect(4, Some(1))],
  );

  assert!(edits.to_update.is_empty());
  assert_eq!(
    edits.to_insert,
    vec![Insertion::Connect {
      item_id: 4,
      count: Some(1)
    }]
  );
}

#[test]
fn test_reference_to_link_being_deleted_is_still_excluded() {
  // Item 2 is dropped from the submission and re-sent as a new reference:
  // the already-linked filter looks at what exists, so it ends up deleted only.
  let existing = vec![stored(1, 2), stored(2, 5)];
  let edits = reconcile(&existing, &[submitted(1, 2)], vec![connect(2, Some(1))]);

  assert_eq!(edits.to_delete, vec![stored(2, 5)]);
  assert!(edits.to_insert.is_empty());
}

#[test]
fn test_creates_follow_connects_and_are_never_deduplicated() {
  let edits = reconcile(
    &Vec::<StoredLink>::new(),
    &Vec::<Submitted>::new(),
    vec![
      create("laksa", Some(2)),
      connect(3, None),
      create("laksa", None),
      connect(1, Some(1)),
    ],
  );

  assert_eq!(edits.to_insert.len(), 4);
  assert!(matches!(edits.to_insert[0], Insertion::Connect { item_id: 3, count: None }));
  assert!(matches!(edits.to_insert[1], Insertion::Connect { item_id: 1, count: Some(1) }));
  match (&edits.to_insert[2], &edits.to_insert[3]) {
    (Insertion::Create { draft: a, count: Some(2) }, Insertion::Create { draft: b, count: None }) => {
      assert_eq!(a.name, "laksa");
      assert_eq!(b.name, "laksa");
    }
    other => panic!("Expected two create insertions, got {:?}", other),
  }
}

#[test]
fn test_reaffirming_applied_state_yields_no_edits() {
  let existing = vec![stored(1, 2), stored(2, 5)];
  let submission = vec![submitted(1, 3)];
  let edits = reconcile(&existing, &submission, vec![connect(3, Some(1))]);

  // Apply the edits to an in-memory copy the way the store would.
  let mut applied: Vec<StoredLink> = existing
    .iter()
    .filter(|l| !edits.to_delete.contains(l))
    .map(|l| edits.to_update.iter().find(|u| u.item_id == l.item_id).cloned().unwrap_or_else(|| l.clone()))
    .collect();
  for insertion in &edits.to_insert {
    if let Insertion::Connect { item_id, count } = insertion {
      applied.push(stored(*item_id, count.unwrap_or(1)));
    }
  }

  let resubmission = vec![submitted(1, 3), submitted(3, 1)];
  let again = reconcile(&applied, &resubmission, vec![connect(3, Some(1))]);
  assert!(again.is_empty());
}
