// server/src/db/mod.rs

//! Postgres access. Plain runtime `sqlx` queries; functions that must run
//! inside a caller's transaction take `&mut PgConnection`.

pub mod canteens;
#[cfg(test)]
pub mod fixtures;
pub mod foods;
pub mod links;
pub mod menus;
pub mod orders;
pub mod reviews;
pub mod stalls;
pub mod trackers;
pub mod users;

pub use links::{apply_item_edits, fetch_links, lock_parent, ParentLock, StoredLink};

/// True when `err` is a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
    _ => false,
  }
}

/// True when `err` is a Postgres foreign-key violation (a row is still referenced).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
    _ => false,
  }
}
