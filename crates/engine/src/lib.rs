//! `aioffice-engine`: the command layer.
//!
//! Service functions that drive cases through their lifecycle. Every function
//! takes its stores and the acting principal explicitly, performs all
//! fallible work up front, and commits the state change together with its
//! audit record. Agent calls happen before the first mutation, so a failed
//! call leaves the case exactly as it was.

pub mod orchestration;
pub mod workflow;

#[cfg(test)]
mod integration_tests;

pub use orchestration::{run_opos, run_orchestrator, LocalMatcher};
pub use workflow::{
    apply_reconciliation, approve_case, export_batch, export_case, flag_needs_attention,
    post_case, propose_case, reset_to_new, BatchKind, BatchOutcome,
};
