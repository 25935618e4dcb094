//! Typed, confidence-scored suggestions attached to a case.
//!
//! Payloads are a tagged union keyed by suggestion type, validated once when
//! a suggestion enters the system. Suggestions are never mutated after
//! creation; corrections are appended as new suggestions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aioffice_core::{Entity, LedgerLineId, SuggestionId};

/// One proposed journal line inside an accounting-entry suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedLine {
    pub account: String,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Kontierung proposal: journal lines plus derived totals and tax rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingEntryProposal {
    pub lines: Vec<ProposedLine>,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub net_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
}

impl AccountingEntryProposal {
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// Document classification result (invoice, receipt, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationProposal {
    #[serde(default)]
    pub document_type: String,
}

/// A single extracted document field (`invoice_date`, `invoice_number`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentField {
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Outcome of an upstream validation agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub status: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Which matching pass produced a reconciliation match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Amount and reference agree.
    Combined,
    /// Amounts agree, references ignored.
    ExactAmount,
    /// References agree, amounts ignored.
    Reference,
}

impl MatchKind {
    pub fn confidence(self) -> f64 {
        match self {
            MatchKind::Combined => 0.95,
            MatchKind::ExactAmount => 0.80,
            MatchKind::Reference => 0.60,
        }
    }
}

/// One debit/credit pairing proposed by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchProposal {
    pub debit_line_id: LedgerLineId,
    pub credit_line_id: LedgerLineId,
    pub amount: Decimal,
    pub match_type: MatchKind,
    pub confidence: f64,
    pub reason: String,
}

/// Full matcher output. Matched and unmatched ids are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReconciliationProposal {
    pub matches: Vec<MatchProposal>,
    pub unmatched_debit: Vec<LedgerLineId>,
    pub unmatched_credit: Vec<LedgerLineId>,
}

/// Tagged suggestion payload; the tag doubles as the wire `suggestion_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "suggestion_type", content = "payload", rename_all = "snake_case")]
pub enum SuggestionPayload {
    AccountingEntry(AccountingEntryProposal),
    Classification(ClassificationProposal),
    Enrichment(EnrichmentField),
    Validation(ValidationFinding),
    Reconciliation(ReconciliationProposal),
}

impl SuggestionPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            SuggestionPayload::AccountingEntry(_) => "accounting_entry",
            SuggestionPayload::Classification(_) => "classification",
            SuggestionPayload::Enrichment(_) => "enrichment",
            SuggestionPayload::Validation(_) => "validation",
            SuggestionPayload::Reconciliation(_) => "reconciliation",
        }
    }
}

/// A scored proposal produced by an agent or an internal matching step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    #[serde(flatten)]
    pub payload: SuggestionPayload,
    /// Confidence score in `[0, 1]`.
    pub confidence: f64,
    /// Risk score in `[0, 1]`.
    pub risk_score: f64,
    #[serde(default)]
    pub explanation: String,
    pub requires_human: bool,
    pub agent_name: String,
    /// Correlation id of the producing request.
    pub request_id: String,
    pub created_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn new(
        payload: SuggestionPayload,
        confidence: f64,
        risk_score: f64,
        agent_name: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            id: SuggestionId::new(),
            payload,
            confidence,
            risk_score,
            explanation: String::new(),
            requires_human: true,
            agent_name: agent_name.into(),
            request_id: request_id.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn as_accounting_entry(&self) -> Option<&AccountingEntryProposal> {
        match &self.payload {
            SuggestionPayload::AccountingEntry(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_reconciliation(&self) -> Option<&ReconciliationProposal> {
        match &self.payload {
            SuggestionPayload::Reconciliation(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_enrichment(&self) -> Option<&EnrichmentField> {
        match &self.payload {
            SuggestionPayload::Enrichment(p) => Some(p),
            _ => None,
        }
    }
}

impl Entity for Suggestion {
    type Id = SuggestionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wire_payload_deserializes_into_tagged_union() {
        let json = serde_json::json!({
            "suggestion_type": "accounting_entry",
            "payload": {
                "lines": [
                    {"account": "6300", "debit": 100.0, "credit": 0.0, "description": "Aufwand"},
                    {"account": "1576", "debit": 19.0, "credit": 0.0, "description": "Vorsteuer 19%"},
                    {"account": "1600", "debit": 0.0, "credit": 119.0, "description": "Verbindlichkeiten"}
                ],
                "tax_rate": 0.19
            }
        });
        let payload: SuggestionPayload = serde_json::from_value(json).unwrap();
        let entry = match &payload {
            SuggestionPayload::AccountingEntry(e) => e,
            other => panic!("unexpected payload: {other:?}"),
        };
        assert_eq!(entry.lines.len(), 3);
        assert_eq!(entry.total_debit(), dec!(119.0));
        assert_eq!(entry.total_credit(), dec!(119.0));
        assert_eq!(entry.tax_rate, Some(0.19));
    }

    #[test]
    fn enrichment_payload_round_trips() {
        let json = serde_json::json!({
            "suggestion_type": "enrichment",
            "payload": {"field": "invoice_date", "value": "2024-03-15"}
        });
        let payload: SuggestionPayload = serde_json::from_value(json).unwrap();
        match payload {
            SuggestionPayload::Enrichment(f) => {
                assert_eq!(f.field, "invoice_date");
                assert_eq!(f.value, "2024-03-15");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unknown_suggestion_type_is_rejected_at_the_boundary() {
        let json = serde_json::json!({
            "suggestion_type": "telepathy",
            "payload": {}
        });
        assert!(serde_json::from_value::<SuggestionPayload>(json).is_err());
    }
}
