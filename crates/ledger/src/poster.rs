//! The ledger poster: turns an approved accounting-entry suggestion into a
//! balanced ledger entry.
//!
//! Never trusts the upstream compliance gate for a durable write; the
//! double-entry balance is re-validated here independently. All lookups
//! happen before any value is built, so a failure aborts with no mutation.

use chrono::NaiveDate;

use aioffice_cases::Case;
use aioffice_core::{OfficeError, OfficeResult};

use crate::account::ChartOfAccounts;
use crate::entry::{LedgerEntry, LedgerLine};
use crate::journal::{select_posting_journal, Journal};

/// Build the ledger entry for a case's latest accounting-entry suggestion.
///
/// The caller commits the returned entry (insert into the book, link to the
/// case, transition) as one unit of work.
pub fn post_case_entry(
    case: &Case,
    chart: &ChartOfAccounts,
    journals: &[Journal],
    today: NaiveDate,
) -> OfficeResult<LedgerEntry> {
    let suggestion = case.latest_accounting_entry().ok_or_else(|| {
        OfficeError::not_found("accounting entry suggestion", case.reference().to_string())
    })?;
    let Some(proposal) = suggestion.as_accounting_entry() else {
        return Err(OfficeError::not_found(
            "accounting entry suggestion",
            case.reference().to_string(),
        ));
    };

    // Resolve every account first; an unknown code is fatal pre-mutation.
    for line in &proposal.lines {
        if chart.lookup(case.company(), &line.account).is_none() {
            return Err(OfficeError::not_found(
                "account",
                format!("{} (company {})", line.account, case.company()),
            ));
        }
    }

    let journal = select_posting_journal(journals, case.company())?;
    let date = case.enrichment_invoice_date().unwrap_or(today);

    let lines: Vec<LedgerLine> = proposal
        .lines
        .iter()
        .map(|l| {
            LedgerLine::new(
                l.account.clone(),
                l.debit,
                l.credit,
                l.description.clone(),
                case.partner(),
            )
        })
        .collect();

    // Defense in depth: LedgerEntry::new re-checks the balance invariant.
    let entry = LedgerEntry::new(
        journal.id,
        date,
        case.reference(),
        case.partner(),
        lines,
    )?;
    tracing::debug!(case = %case.reference(), entry = %entry.id, "ledger entry built");
    Ok(entry)
}
