//! Request/response DTOs for the agent service API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aioffice_cases::{Suggestion, SuggestionPayload};
use aioffice_core::{CaseId, CompanyId, LedgerLineId, OfficeError, OfficeResult, PartnerId};
use aioffice_ledger::OpenItem;

/// Case context shipped to the agents. `open_lines` is only populated for
/// open-item matching runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationContext {
    pub partner_id: Option<PartnerId>,
    #[serde(default)]
    pub partner_name: String,
    pub period: String,
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_lines: Option<Vec<OpenLineDto>>,
}

/// An open ledger line as the matching agent expects it on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLineDto {
    pub id: LedgerLineId,
    pub date: NaiveDate,
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub balance: Decimal,
    pub amount_residual: Decimal,
    pub account_code: String,
    pub move_name: String,
}

impl From<&OpenItem> for OpenLineDto {
    fn from(item: &OpenItem) -> Self {
        Self {
            id: item.id,
            date: item.date,
            reference: item.reference.clone(),
            name: item.name.clone(),
            balance: item.residual,
            amount_residual: item.residual,
            account_code: item.account_code.clone(),
            move_name: item.move_name.clone(),
        }
    }
}

impl From<&OpenLineDto> for OpenItem {
    fn from(dto: &OpenLineDto) -> Self {
        Self {
            id: dto.id,
            date: dto.date,
            reference: dto.reference.clone(),
            name: dto.name.clone(),
            residual: dto.amount_residual,
            account_code: dto.account_code.clone(),
            move_name: dto.move_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrateRequest {
    pub case_id: CaseId,
    pub request_id: String,
    pub context: OrchestrationContext,
}

/// A suggestion as it arrives from the service, payload still untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDto {
    pub suggestion_type: String,
    pub payload: serde_json::Value,
    pub confidence: f64,
    pub risk_score: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_requires_human")]
    pub requires_human: bool,
    #[serde(default)]
    pub agent_name: String,
}

fn default_requires_human() -> bool {
    true
}

impl SuggestionDto {
    /// Validate the payload against the typed union. An unknown type or a
    /// malformed payload is rejected here, before anything touches the case.
    pub fn into_suggestion(self, request_id: &str) -> OfficeResult<Suggestion> {
        let tagged = serde_json::json!({
            "suggestion_type": self.suggestion_type,
            "payload": self.payload,
        });
        let payload: SuggestionPayload = serde_json::from_value(tagged).map_err(|e| {
            OfficeError::serialization(format!(
                "suggestion '{}' from {}: {e}",
                self.suggestion_type, self.agent_name
            ))
        })?;
        let mut suggestion = Suggestion::new(
            payload,
            self.confidence,
            self.risk_score,
            self.agent_name,
            request_id,
        )
        .with_explanation(self.explanation);
        suggestion.requires_human = self.requires_human;
        Ok(suggestion)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrateResponse {
    pub case_id: CaseId,
    pub request_id: String,
    pub suggestions: Vec<SuggestionDto>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "ok".to_string()
}
