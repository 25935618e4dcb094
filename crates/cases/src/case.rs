//! The case aggregate and its state machine.
//!
//! A case moves only along documented edges; every successful transition
//! appends exactly one audit entry in the same unit of work. A failed guard
//! returns an error and leaves state and audit log untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use aioffice_core::{
    Actor, CaseId, CompanyId, Entity, LedgerEntryId, OfficeError, OfficeResult, PartnerId, Period,
};

use crate::audit::{AuditEntry, AuditTrail};
use crate::suggestion::{Suggestion, SuggestionPayload};

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    New,
    Enriched,
    Proposed,
    Approved,
    Posted,
    Exported,
    NeedsAttention,
    Failed,
}

impl CaseState {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseState::New => "new",
            CaseState::Enriched => "enriched",
            CaseState::Proposed => "proposed",
            CaseState::Approved => "approved",
            CaseState::Posted => "posted",
            CaseState::Exported => "exported",
            CaseState::NeedsAttention => "needs_attention",
            CaseState::Failed => "failed",
        }
    }
}

impl core::fmt::Display for CaseState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State-changing actions. `orchestrate` shares the propose edge but is
/// recorded under its own action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseAction {
    Propose,
    Orchestrate,
    Approve,
    Post,
    Export,
    NeedsAttention,
    ResetToNew,
}

impl CaseAction {
    pub fn name(self) -> &'static str {
        match self {
            CaseAction::Propose => "propose",
            CaseAction::Orchestrate => "orchestrate",
            CaseAction::Approve => "approve",
            CaseAction::Post => "post",
            CaseAction::Export => "export",
            CaseAction::NeedsAttention => "needs_attention",
            CaseAction::ResetToNew => "reset_to_new",
        }
    }

    pub fn target(self) -> CaseState {
        match self {
            CaseAction::Propose | CaseAction::Orchestrate => CaseState::Proposed,
            CaseAction::Approve => CaseState::Approved,
            CaseAction::Post => CaseState::Posted,
            CaseAction::Export => CaseState::Exported,
            CaseAction::NeedsAttention => CaseState::NeedsAttention,
            CaseAction::ResetToNew => CaseState::New,
        }
    }

    pub fn allowed_from(self, state: CaseState) -> bool {
        match self {
            CaseAction::Propose | CaseAction::Orchestrate => {
                matches!(state, CaseState::New | CaseState::Enriched)
            }
            CaseAction::Approve => state == CaseState::Proposed,
            CaseAction::Post => state == CaseState::Approved,
            CaseAction::Export => state == CaseState::Posted,
            CaseAction::NeedsAttention => true,
            CaseAction::ResetToNew => {
                matches!(state, CaseState::NeedsAttention | CaseState::Failed)
            }
        }
    }
}

/// The case aggregate. Owns its suggestions and audit trail exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    id: CaseId,
    /// Human reference, e.g. "RE-2024-0042".
    reference: String,
    company: CompanyId,
    partner: Option<PartnerId>,
    period: Period,
    state: CaseState,
    ledger_entry: Option<LedgerEntryId>,
    export_filename: Option<String>,
    suggestions: Vec<Suggestion>,
    audit: AuditTrail,
}

impl Case {
    pub fn new(reference: impl Into<String>, company: CompanyId, period: Period) -> Self {
        Self {
            id: CaseId::new(),
            reference: reference.into(),
            company,
            partner: None,
            period,
            state: CaseState::New,
            ledger_entry: None,
            export_filename: None,
            suggestions: Vec::new(),
            audit: AuditTrail::new(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn partner(&self) -> Option<PartnerId> {
        self.partner
    }

    pub fn set_partner(&mut self, partner: PartnerId) {
        self.partner = Some(partner);
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn state(&self) -> CaseState {
        self.state
    }

    pub fn ledger_entry(&self) -> Option<LedgerEntryId> {
        self.ledger_entry
    }

    pub fn link_ledger_entry(&mut self, entry: LedgerEntryId) {
        self.ledger_entry = Some(entry);
    }

    pub fn export_filename(&self) -> Option<&str> {
        self.export_filename.as_deref()
    }

    pub fn set_export_filename(&mut self, name: impl Into<String>) {
        self.export_filename = Some(name.into());
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestions.len()
    }

    /// Append a suggestion; suggestions are never edited in place.
    pub fn push_suggestion(&mut self, suggestion: Suggestion) {
        self.suggestions.push(suggestion);
    }

    /// The most recent accounting-entry suggestion, if any.
    pub fn latest_accounting_entry(&self) -> Option<&Suggestion> {
        self.suggestions
            .iter()
            .rev()
            .find(|s| matches!(s.payload, SuggestionPayload::AccountingEntry(_)))
    }

    /// The most recent reconciliation suggestion, if any.
    pub fn latest_reconciliation(&self) -> Option<&Suggestion> {
        self.suggestions
            .iter()
            .rev()
            .find(|s| matches!(s.payload, SuggestionPayload::Reconciliation(_)))
    }

    /// Most recent enrichment value for a named field.
    pub fn enrichment_value(&self, field: &str) -> Option<&str> {
        self.suggestions.iter().rev().find_map(|s| match &s.payload {
            SuggestionPayload::Enrichment(e) if e.field == field => Some(e.value.as_str()),
            _ => None,
        })
    }

    pub fn enrichment_invoice_date(&self) -> Option<NaiveDate> {
        self.enrichment_value("invoice_date")
            .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
    }

    pub fn enrichment_invoice_number(&self) -> Option<&str> {
        self.enrichment_value("invoice_number")
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn audit_entries(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    pub fn can(&self, action: CaseAction) -> bool {
        action.allowed_from(self.state)
    }

    /// Execute a state transition and record it, atomically.
    ///
    /// `detail` entries are merged into the after-snapshot next to the new
    /// state (created ledger entry id, export filename, suggestion counts...).
    pub fn transition(
        &mut self,
        action: CaseAction,
        actor: &Actor,
        detail: Option<serde_json::Value>,
    ) -> OfficeResult<()> {
        if !self.can(action) {
            return Err(OfficeError::InvalidTransition {
                case: self.reference.clone(),
                from: self.state.to_string(),
                action: action.name().to_string(),
            });
        }
        let before = serde_json::json!({ "state": self.state.to_string() });
        let target = action.target();
        let mut after = serde_json::json!({ "state": target.to_string() });
        if let (Some(serde_json::Value::Object(extra)), Some(map)) =
            (detail, after.as_object_mut())
        {
            for (k, v) in extra {
                map.insert(k, v);
            }
        }
        self.state = target;
        self.audit.append(
            self.id,
            actor.actor_type,
            actor.name.clone(),
            action.name(),
            Some(before),
            Some(after),
        );
        Ok(())
    }

    /// Record a non-transition action (opos_match, reconciliation_applied).
    pub fn record_audit(
        &mut self,
        actor: &Actor,
        action: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) {
        self.audit
            .append(self.id, actor.actor_type, actor.name.clone(), action, before, after);
    }

    /// Privileged audit deletion; fails closed.
    pub fn purge_audit(
        &mut self,
        entry_id: aioffice_core::AuditEntryId,
        privileged: bool,
    ) -> OfficeResult<()> {
        self.audit.purge(entry_id, privileged)
    }

    /// Bypass the transition table. Intake/test scaffolding only.
    pub fn force_state(&mut self, state: CaseState) {
        self.state = state;
    }
}

impl Entity for Case {
    type Id = CaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
