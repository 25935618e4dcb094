//! Open-item reconciliation (Offene-Posten-Abstimmung).
//!
//! The matcher pairs open debit and credit lines with three greedy passes of
//! decreasing confidence; the applier settles accepted pairs on the ledger.
//! Matching is pure and never touches the book.

pub mod applier;
pub mod matcher;

pub use applier::{apply_matches, ReconcileOutcome};
pub use matcher::{match_open_items, normalize_reference, MatchOutcome};
