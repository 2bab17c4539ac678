/*!
 * Candidate selection: suitability rules, dedup memory and the bounded
 * traversal that picks one unit of text to narrate.
 *
 * - `rules`: the pure suitability predicate and its explicit rule object
 * - `ledger`: persisted dedup and already-produced stores
 * - `selector`: bounded BFS and widening listing walk
 */

// Re-export main types for easier usage
pub use self::ledger::{DedupLedger, ProducedLedger, ProducedRecord};
pub use self::rules::{evaluate, RejectReason, SelectionRules, Verdict};
pub use self::selector::{
    ScanLimits, SelectedStory, SelectionOutcome, Selector, StoryKind, WIDENING_SCHEDULE,
};

// Submodules
pub mod ledger;
pub mod rules;
pub mod selector;
