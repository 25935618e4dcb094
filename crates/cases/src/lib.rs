//! `aioffice-cases`: the case aggregate and its satellites.
//!
//! Owns the case state machine (documented edges only, one audit entry per
//! successful transition), the typed suggestion store, the append-only audit
//! trail and policy resolution. No IO; services in `aioffice-engine` drive
//! these types with explicit stores and actors.

pub mod audit;
pub mod case;
pub mod policy;
pub mod suggestion;

pub use audit::{AuditEntry, AuditTrail};
pub use case::{Case, CaseAction, CaseState};
pub use policy::{Policy, PolicyRules, PolicyScope, PolicySet, ResolvedThresholds};
pub use suggestion::{
    AccountingEntryProposal, ClassificationProposal, EnrichmentField, MatchKind, MatchProposal,
    ProposedLine, ReconciliationProposal, Suggestion, SuggestionPayload, ValidationFinding,
};
