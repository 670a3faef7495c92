// core/src/lib.rs

//! canteen-core: the domain logic behind the campus canteen ordering backend.
//!
//! The crate holds the parts of the backend that do not touch HTTP or SQL:
//!  - `reconcile`: diffing a parent's linked food items against a client submission
//!    into update / delete / insert edit sets.
//!  - `food`: food drafts and the "fill only what is missing" nutrition policy.
//!  - `enrichment`: concurrent, best-effort nutrition lookups for new drafts.
//!  - `workflow`: named async steps over shared context data, plus a registry
//!    keyed by context type.

pub mod enrichment;
pub mod error;
pub mod food;
pub mod reconcile;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::enrichment::{enrich_drafts, enrich_new_items, NutritionLookup, PassThroughLookup};
pub use crate::error::{CoreError, CoreResult};
pub use crate::food::{FoodDraft, NutritionFacts};
pub use crate::reconcile::{reconcile, EditSummary, Insertion, ItemEdits, Link, LinkKey, LinkRecord, NewItem};
pub use crate::workflow::{ContextData, StepControl, Workflow, WorkflowOutcome, Workflows};

/*
    Reconcile-and-apply, as the server runs it:
    1. Reject the request if the client did not send its `items` list at all.
    2. Load the parent (order / tracker entry) and check the caller may edit it.
    3. Enrich every `NewItem::Create` draft (network; may degrade to pass-through).
    4. Open a transaction, lock the parent row, read its links fresh.
    5. `reconcile(&existing, &submitted, new_items)` and apply the edits.
    6. Commit. Any failure rolls the whole edit set back.
*/
