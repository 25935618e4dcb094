//! Rule-based open-item matcher.
//!
//! Three greedy passes in priority order: combined (amount and reference),
//! exact amount, reference only. Earlier passes consume lines; a line is
//! paired at most once. No IO, no panics.

use std::collections::HashSet;

use rust_decimal::Decimal;

use aioffice_cases::{MatchKind, MatchProposal, ReconciliationProposal};
use aioffice_core::{amounts_equal, LedgerLineId};
use aioffice_ledger::OpenItem;

/// Matcher result, scored like any other suggestion.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchOutcome {
    pub proposal: ReconciliationProposal,
    pub confidence: f64,
    pub risk_score: f64,
    pub explanation: String,
}

/// Pair open debit lines (residual > 0) against open credit lines
/// (residual < 0).
pub fn match_open_items(items: &[OpenItem]) -> MatchOutcome {
    let debits: Vec<&OpenItem> = items.iter().filter(|i| i.residual > Decimal::ZERO).collect();
    let credits: Vec<&OpenItem> = items.iter().filter(|i| i.residual < Decimal::ZERO).collect();

    let mut matches = Vec::new();
    let mut used_debit = HashSet::new();
    let mut used_credit = HashSet::new();

    for kind in [MatchKind::Combined, MatchKind::ExactAmount, MatchKind::Reference] {
        run_pass(kind, &debits, &credits, &mut used_debit, &mut used_credit, &mut matches);
    }

    let unmatched_debit: Vec<LedgerLineId> = debits
        .iter()
        .filter(|d| !used_debit.contains(&d.id))
        .map(|d| d.id)
        .collect();
    let unmatched_credit: Vec<LedgerLineId> = credits
        .iter()
        .filter(|c| !used_credit.contains(&c.id))
        .map(|c| c.id)
        .collect();

    if matches.is_empty() {
        return MatchOutcome {
            proposal: ReconciliationProposal {
                matches,
                unmatched_debit,
                unmatched_credit,
            },
            confidence: 0.0,
            risk_score: 0.0,
            explanation: "No matching open items found.".to_string(),
        };
    }

    let avg: f64 = matches.iter().map(|m| m.confidence).sum::<f64>() / matches.len() as f64;
    let confidence = round2(avg);
    let explanation = format!(
        "Found {} match(es). {} debit and {} credit lines unmatched.",
        matches.len(),
        unmatched_debit.len(),
        unmatched_credit.len()
    );
    tracing::debug!(
        matches = matches.len(),
        unmatched_debit = unmatched_debit.len(),
        unmatched_credit = unmatched_credit.len(),
        "open-item matching finished"
    );
    MatchOutcome {
        proposal: ReconciliationProposal {
            matches,
            unmatched_debit,
            unmatched_credit,
        },
        confidence,
        risk_score: round2(1.0 - avg),
        explanation,
    }
}

fn run_pass(
    kind: MatchKind,
    debits: &[&OpenItem],
    credits: &[&OpenItem],
    used_debit: &mut HashSet<LedgerLineId>,
    used_credit: &mut HashSet<LedgerLineId>,
    matches: &mut Vec<MatchProposal>,
) {
    for debit in debits {
        if used_debit.contains(&debit.id) {
            continue;
        }
        for credit in credits {
            if used_credit.contains(&credit.id) {
                continue;
            }
            let hit = match kind {
                MatchKind::Combined => {
                    residuals_equal(debit, credit)
                        && references_match(&debit.reference, &credit.reference)
                }
                MatchKind::ExactAmount => residuals_equal(debit, credit),
                MatchKind::Reference => references_match(&debit.reference, &credit.reference),
            };
            if !hit {
                continue;
            }
            let amount = debit.residual.abs().min(credit.residual.abs());
            let reason = match kind {
                MatchKind::Combined => {
                    format!("Exact amount ({amount:.2}) and reference match.")
                }
                MatchKind::ExactAmount => format!("Exact amount match ({amount:.2})."),
                MatchKind::Reference => format!("Reference match ('{}').", debit.reference),
            };
            matches.push(MatchProposal {
                debit_line_id: debit.id,
                credit_line_id: credit.id,
                amount,
                match_type: kind,
                confidence: kind.confidence(),
                reason,
            });
            used_debit.insert(debit.id);
            used_credit.insert(credit.id);
            break;
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn residuals_equal(debit: &OpenItem, credit: &OpenItem) -> bool {
    amounts_equal(debit.residual.abs(), credit.residual.abs())
}

/// Canonical form of a payment/invoice reference.
///
/// Lowercases, drops `-`/`_` separators, then strips a single leading
/// document prefix (re, inv, rg, rnr). Returns `None` when nothing is left.
pub fn normalize_reference(reference: &str) -> Option<String> {
    let compact: String = reference
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect();
    if compact.is_empty() {
        return None;
    }
    let stripped = ["re", "inv", "rg", "rnr"]
        .iter()
        .find_map(|prefix| compact.strip_prefix(prefix))
        .unwrap_or(&compact);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

fn references_match(a: &str, b: &str) -> bool {
    match (normalize_reference(a), normalize_reference(b)) {
        (Some(left), Some(right)) => {
            left == right || left.contains(&right) || right.contains(&left)
        }
        _ => false,
    }
}
