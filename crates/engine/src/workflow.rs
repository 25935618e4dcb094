//! Lifecycle commands: propose, approve, post, export, reconcile.

use chrono::NaiveDate;

use aioffice_cases::{Case, CaseAction, CaseState, PolicySet};
use aioffice_compliance::validate_for_approval;
use aioffice_core::{Actor, CaseId, Entity, OfficeError, OfficeResult, Period};
use aioffice_export::{
    export_case_datev, generate_batch_datev, generate_batch_summary, select_batch, ExportFile,
};
use aioffice_ledger::{post_case_entry, ChartOfAccounts, Journal, LedgerBook};
use aioffice_reconcile::{apply_matches, ReconcileOutcome};

fn require_edge(case: &Case, action: CaseAction) -> OfficeResult<()> {
    if case.can(action) {
        Ok(())
    } else {
        Err(OfficeError::InvalidTransition {
            case: case.reference().to_string(),
            from: case.state().to_string(),
            action: action.name().to_string(),
        })
    }
}

/// new/enriched -> proposed, without agent involvement.
pub fn propose_case(case: &mut Case, actor: &Actor) -> OfficeResult<()> {
    case.transition(CaseAction::Propose, actor, None)
}

/// proposed -> approved. Runs the full compliance gate first; approver only.
pub fn approve_case(
    case: &mut Case,
    policies: &PolicySet,
    actor: &Actor,
    today: NaiveDate,
) -> OfficeResult<()> {
    actor.require_approver("approve cases")?;
    require_edge(case, CaseAction::Approve)?;
    validate_for_approval(case, policies, today)?;
    case.transition(CaseAction::Approve, actor, None)
}

/// approved -> posted. Builds the balanced ledger entry, inserts it and
/// links it to the case in one unit of work; approver only.
pub fn post_case(
    case: &mut Case,
    chart: &ChartOfAccounts,
    journals: &[Journal],
    book: &mut LedgerBook,
    actor: &Actor,
    today: NaiveDate,
) -> OfficeResult<()> {
    actor.require_approver("post cases")?;
    require_edge(case, CaseAction::Post)?;
    let entry = post_case_entry(case, chart, journals, today)?;
    let entry_id = book.insert(entry);
    case.link_ledger_entry(entry_id);
    case.transition(
        CaseAction::Post,
        actor,
        Some(serde_json::json!({ "ledger_entry": entry_id })),
    )?;
    tracing::info!(case = %case.reference(), %entry_id, "case posted");
    Ok(())
}

/// posted -> exported for a single case. The generated DATEV filename is
/// stored on the case and recorded in the audit snapshot.
pub fn export_case(case: &mut Case, actor: &Actor) -> OfficeResult<ExportFile> {
    actor.require_approver("export cases")?;
    require_edge(case, CaseAction::Export)?;
    let file = export_case_datev(case)?;
    case.set_export_filename(&file.filename);
    case.transition(
        CaseAction::Export,
        actor,
        Some(serde_json::json!({ "datev_filename": file.filename })),
    )?;
    tracing::info!(case = %case.reference(), filename = %file.filename, "case exported");
    Ok(file)
}

/// Flag a case for manual review, from any state.
pub fn flag_needs_attention(
    case: &mut Case,
    actor: &Actor,
    note: Option<String>,
) -> OfficeResult<()> {
    let detail = note.map(|n| serde_json::json!({ "note": n }));
    case.transition(CaseAction::NeedsAttention, actor, detail)
}

/// needs_attention/failed -> new, restarting the lifecycle.
pub fn reset_to_new(case: &mut Case, actor: &Actor) -> OfficeResult<()> {
    case.transition(CaseAction::ResetToNew, actor, None)
}

/// Which artifact a batch export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Datev,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub file: ExportFile,
    /// How many cases the file covers.
    pub case_count: usize,
}

/// Period-range export. The file is rendered from every selected case
/// first; only then do the still-posted cases transition to exported, so a
/// render failure exports nothing.
pub fn export_batch(
    cases: &mut [Case],
    book: &LedgerBook,
    actor: &Actor,
    from: &Period,
    to: &Period,
    include_exported: bool,
    kind: BatchKind,
) -> OfficeResult<BatchOutcome> {
    actor.require_approver("export cases")?;

    let selected = select_batch(cases.iter(), from, to, include_exported);
    let file = match kind {
        BatchKind::Datev => generate_batch_datev(&selected, from, to)?,
        BatchKind::Summary => generate_batch_summary(&selected, book, from, to)?,
    };
    let to_transition: Vec<CaseId> = selected
        .iter()
        .filter(|c| c.state() == CaseState::Posted)
        .map(|c| *c.id())
        .collect();
    let case_count = selected.len();

    for case in cases.iter_mut() {
        if !to_transition.contains(case.id()) {
            continue;
        }
        case.set_export_filename(&file.filename);
        case.transition(
            CaseAction::Export,
            actor,
            Some(serde_json::json!({ "export_filename": file.filename })),
        )?;
    }
    tracing::info!(cases = case_count, filename = %file.filename, "batch exported");
    Ok(BatchOutcome { file, case_count })
}

/// Apply the latest reconciliation suggestion of a posted case to the book.
///
/// Partial failure is reported in the outcome, not as an `Err`; whatever was
/// settled stays settled and the full outcome lands in the audit trail.
pub fn apply_reconciliation(
    case: &mut Case,
    book: &mut LedgerBook,
    actor: &Actor,
) -> OfficeResult<ReconcileOutcome> {
    actor.require_approver("apply reconciliations")?;
    if case.state() != CaseState::Posted {
        return Err(OfficeError::InvalidTransition {
            case: case.reference().to_string(),
            from: case.state().to_string(),
            action: "reconciliation_applied".to_string(),
        });
    }
    let proposal = case
        .latest_reconciliation()
        .and_then(|s| s.as_reconciliation())
        .cloned()
        .ok_or_else(|| {
            OfficeError::not_found("reconciliation suggestion", case.reference().to_string())
        })?;

    let outcome = apply_matches(&proposal, book);
    case.record_audit(
        actor,
        "reconciliation_applied",
        None,
        Some(serde_json::json!({
            "applied_count": outcome.applied_count,
            "errors": outcome.errors,
        })),
    );
    Ok(outcome)
}
