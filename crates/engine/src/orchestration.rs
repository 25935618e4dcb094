//! Agent-driven commands: orchestration and open-item matching.
//!
//! The service call is a pre-commit step. Suggestions are converted into
//! their typed form while the case is still untouched; only a fully valid
//! response mutates anything.

use aioffice_agents::{
    MatchingClient, OpenLineDto, OrchestrateRequest, OrchestrationClient, OrchestrationContext,
    SuggestionDto,
};
use aioffice_cases::{Case, CaseAction, CaseState, Suggestion};
use aioffice_core::{Actor, Entity, OfficeError, OfficeResult};
use aioffice_ledger::{LedgerBook, OpenItem};
use aioffice_reconcile::match_open_items;

fn context_for(case: &Case, open_lines: Option<Vec<OpenLineDto>>) -> OrchestrationContext {
    OrchestrationContext {
        partner_id: case.partner(),
        partner_name: String::new(),
        period: case.period().to_string(),
        company_id: case.company(),
        open_lines,
    }
}

fn convert_suggestions(
    dtos: Vec<SuggestionDto>,
    request_id: &str,
) -> OfficeResult<Vec<Suggestion>> {
    dtos.into_iter()
        .map(|dto| dto.into_suggestion(request_id))
        .collect()
}

/// Run the agent pipeline for a new/enriched case and store the returned
/// suggestions. Transitions to proposed and records an `orchestrate` audit
/// entry with the request correlation id.
pub fn run_orchestrator(
    case: &mut Case,
    client: &impl OrchestrationClient,
    actor: &Actor,
    request_id: impl Into<String>,
) -> OfficeResult<usize> {
    let request_id = request_id.into();
    if !case.can(CaseAction::Orchestrate) {
        return Err(OfficeError::InvalidTransition {
            case: case.reference().to_string(),
            from: case.state().to_string(),
            action: CaseAction::Orchestrate.name().to_string(),
        });
    }

    let request = OrchestrateRequest {
        case_id: *case.id(),
        request_id: request_id.clone(),
        context: context_for(case, None),
    };
    let response = client.orchestrate(&request)?;
    let suggestions = convert_suggestions(response.suggestions, &request_id)?;

    let added = suggestions.len();
    for suggestion in suggestions {
        case.push_suggestion(suggestion);
    }
    case.transition(
        CaseAction::Orchestrate,
        actor,
        Some(serde_json::json!({
            "suggestions_added": added,
            "request_id": request_id,
        })),
    )?;
    tracing::info!(case = %case.reference(), added, "orchestration finished");
    Ok(added)
}

/// Run open-item matching for a posted case with a partner and store the
/// reconciliation suggestion. Records an `opos_match` audit entry; the case
/// state does not change.
pub fn run_opos(
    case: &mut Case,
    book: &LedgerBook,
    client: &impl MatchingClient,
    actor: &Actor,
    request_id: impl Into<String>,
) -> OfficeResult<usize> {
    let request_id = request_id.into();
    if case.state() != CaseState::Posted {
        return Err(OfficeError::InvalidTransition {
            case: case.reference().to_string(),
            from: case.state().to_string(),
            action: "opos_match".to_string(),
        });
    }
    if case.ledger_entry().is_none() {
        return Err(OfficeError::not_found(
            "ledger entry for case",
            case.reference().to_string(),
        ));
    }
    let partner = case.partner().ok_or_else(|| {
        OfficeError::not_found("partner for case", case.reference().to_string())
    })?;
    let open_items = book.open_items(partner);
    if open_items.is_empty() {
        return Err(OfficeError::not_found(
            "open items for partner",
            partner.to_string(),
        ));
    }

    let request = OrchestrateRequest {
        case_id: *case.id(),
        request_id: request_id.clone(),
        context: context_for(
            case,
            Some(open_items.iter().map(OpenLineDto::from).collect()),
        ),
    };
    let response = client.match_open_items(&request)?;
    let suggestions = convert_suggestions(response.suggestions, &request_id)?;

    let added = suggestions.len();
    for suggestion in suggestions {
        case.push_suggestion(suggestion);
    }
    case.record_audit(
        actor,
        "opos_match",
        None,
        Some(serde_json::json!({
            "suggestions_added": added,
            "request_id": request_id,
        })),
    );
    tracing::info!(case = %case.reference(), added, "open-item matching finished");
    Ok(added)
}

/// In-process matcher with the service's wire shape. Used when no external
/// agent service is configured; tests use it as the reference client.
pub struct LocalMatcher;

impl MatchingClient for LocalMatcher {
    fn match_open_items(&self, request: &OrchestrateRequest) -> OfficeResult<aioffice_agents::OrchestrateResponse> {
        let items: Vec<OpenItem> = request
            .context
            .open_lines
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(OpenItem::from)
            .collect();
        let outcome = match_open_items(&items);
        let payload = serde_json::to_value(&outcome.proposal)
            .map_err(|e| OfficeError::serialization(e.to_string()))?;
        Ok(aioffice_agents::OrchestrateResponse {
            case_id: request.case_id,
            request_id: request.request_id.clone(),
            suggestions: vec![SuggestionDto {
                suggestion_type: "reconciliation".to_string(),
                payload,
                confidence: outcome.confidence,
                risk_score: outcome.risk_score,
                explanation: outcome.explanation,
                requires_human: true,
                agent_name: "opos_agent".to_string(),
            }],
            status: "ok".to_string(),
        })
    }
}
