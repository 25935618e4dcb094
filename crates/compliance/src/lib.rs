//! Compliance gate for case approval.
//!
//! Runs the full GoBD-style rule set over a case's latest accounting-entry
//! suggestion and reports every violation at once. Pure over its inputs; the
//! engine decides when to run it and what to do with the result.

pub mod validator;

pub use validator::validate_for_approval;
