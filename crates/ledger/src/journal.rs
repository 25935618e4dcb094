//! Posting journals.

use serde::{Deserialize, Serialize};

use aioffice_core::{CompanyId, JournalId, OfficeError, OfficeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalKind {
    Purchase,
    Sale,
    General,
    Bank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
    pub company: CompanyId,
    pub name: String,
    pub code: String,
    pub kind: JournalKind,
}

/// Pick the journal to post into: a dedicated purchase journal of the
/// company if one exists, else any journal of the company.
pub fn select_posting_journal(journals: &[Journal], company: CompanyId) -> OfficeResult<&Journal> {
    journals
        .iter()
        .find(|j| j.company == company && j.kind == JournalKind::Purchase)
        .or_else(|| journals.iter().find(|j| j.company == company))
        .ok_or_else(|| OfficeError::not_found("journal", format!("company {company}")))
}
