//! GoBD-style approval checks.
//!
//! Every rule runs; the report carries all violations so the operator fixes
//! the whole suggestion in one pass. The only short-circuit is a missing
//! accounting-entry suggestion, which makes the remaining checks meaningless.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use aioffice_cases::{AccountingEntryProposal, Case, PolicySet, Suggestion};
use aioffice_core::{OfficeResult, ValidationReport};
use aioffice_ledger::skr03::is_contra_account;

/// Validate a case for the proposed -> approved transition.
pub fn validate_for_approval(
    case: &Case,
    policies: &PolicySet,
    today: NaiveDate,
) -> OfficeResult<()> {
    let mut report = ValidationReport::new(case.reference());

    let proposal = match case
        .latest_accounting_entry()
        .and_then(|s| s.as_accounting_entry().map(|p| (s, p)))
    {
        Some(found) => found,
        None => {
            report.push("No accounting entry suggestion to validate");
            return report.into_result();
        }
    };
    let (suggestion, entry) = proposal;

    check_lines_complete(entry, &mut report);
    check_balanced(entry, &mut report);
    check_partner(case, entry, &mut report);
    check_invoice_date(case, today, &mut report);
    check_thresholds(case, suggestion, policies, today, &mut report);

    tracing::debug!(
        case = %case.reference(),
        violations = report.violations.len(),
        "approval validation finished"
    );
    report.into_result()
}

/// Every line needs an account, exactly one positive side and a
/// Buchungstext.
fn check_lines_complete(entry: &AccountingEntryProposal, report: &mut ValidationReport) {
    for (i, line) in entry.lines.iter().enumerate() {
        let n = i + 1;
        if line.account.trim().is_empty() {
            report.push(format!("Line {n}: missing account code"));
        }
        if line.debit <= Decimal::ZERO && line.credit <= Decimal::ZERO {
            report.push(format!("Line {n}: debit or credit must be > 0"));
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            report.push(format!("Line {n}: debit and credit must not both be > 0"));
        }
        if line.description.trim().is_empty() {
            report.push(format!("Line {n}: missing description"));
        }
    }
}

fn check_balanced(entry: &AccountingEntryProposal, report: &mut ValidationReport) {
    let debit = entry.total_debit();
    let credit = entry.total_credit();
    if !aioffice_core::is_balanced(debit, credit) {
        report.push(format!(
            "Entry is not balanced: debit={:.2}, credit={:.2}",
            debit, credit
        ));
    }
}

/// Payables postings need a partner for open-item accounting.
fn check_partner(case: &Case, entry: &AccountingEntryProposal, report: &mut ValidationReport) {
    if case.partner().is_some() {
        return;
    }
    if let Some(line) = entry.lines.iter().find(|l| is_contra_account(&l.account)) {
        report.push(format!(
            "Partner is required for postings to account {}",
            line.account
        ));
    }
}

fn check_invoice_date(case: &Case, today: NaiveDate, report: &mut ValidationReport) {
    if let Some(date) = case.enrichment_invoice_date() {
        if date > today {
            report.push(format!("Invoice date {date} is in the future"));
        }
    }
}

fn check_thresholds(
    case: &Case,
    suggestion: &Suggestion,
    policies: &PolicySet,
    today: NaiveDate,
    report: &mut ValidationReport,
) {
    let thresholds = policies.resolve(case.company(), case.partner(), today);
    if suggestion.confidence < thresholds.confidence_threshold {
        report.push(format!(
            "Confidence {:.2} below policy threshold {:.2}",
            suggestion.confidence, thresholds.confidence_threshold
        ));
    }
    if suggestion.risk_score > thresholds.risk_score_max {
        report.push(format!(
            "Risk score {:.2} exceeds policy maximum {:.2}",
            suggestion.risk_score, thresholds.risk_score_max
        ));
    }
}
