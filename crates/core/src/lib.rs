//! `aioffice-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the actor/role model, the accounting period
//! value type, money tolerance helpers and the shared error model.

pub mod actor;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod period;

pub use actor::{Actor, ActorType, Role};
pub use entity::Entity;
pub use error::{OfficeError, OfficeResult, ValidationReport};
pub use id::{
    AuditEntryId, CaseId, CompanyId, JournalId, LedgerEntryId, LedgerLineId, PartnerId,
    SuggestionId,
};
pub use money::{amounts_equal, is_balanced, AMOUNT_TOLERANCE};
pub use period::Period;
