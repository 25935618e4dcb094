//! Settles accepted reconciliation matches on the ledger book.

use serde::Serialize;

use aioffice_cases::ReconciliationProposal;
use aioffice_ledger::LedgerBook;

/// Result of applying a proposal. Partial failure is a value, not an error:
/// pairs settled before a bad match stay settled, and the engine records the
/// whole outcome in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub applied_count: usize,
    pub errors: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Mark each matched debit/credit pair as reconciled.
///
/// A pair is settled only when both lines exist and neither is already
/// reconciled; re-applying the same proposal is a no-op. Missing lines are
/// reported per match and do not stop the remaining pairs.
pub fn apply_matches(proposal: &ReconciliationProposal, book: &mut LedgerBook) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    for found in &proposal.matches {
        let debit = match book.line(found.debit_line_id) {
            Some(line) => line,
            None => {
                outcome
                    .errors
                    .push(format!("debit line {} not found", found.debit_line_id));
                continue;
            }
        };
        let credit = match book.line(found.credit_line_id) {
            Some(line) => line,
            None => {
                outcome
                    .errors
                    .push(format!("credit line {} not found", found.credit_line_id));
                continue;
            }
        };
        if debit.reconciled || credit.reconciled {
            continue;
        }

        // Both sides flip in the same step; a half-settled pair must not exist.
        for id in [found.debit_line_id, found.credit_line_id] {
            if let Some(line) = book.line_mut(id) {
                line.reconciled = true;
            }
        }
        outcome.applied_count += 1;
    }

    tracing::debug!(
        applied = outcome.applied_count,
        errors = outcome.errors.len(),
        "reconciliation applied"
    );
    outcome
}
