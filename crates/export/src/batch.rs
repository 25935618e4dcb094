//! Period-range batch exports.
//!
//! Selection and file generation only; the engine transitions the exported
//! cases afterwards so a failed render never leaves half a batch exported.

use csv::{Terminator, WriterBuilder};

use aioffice_cases::{Case, CaseState};
use aioffice_core::{OfficeError, OfficeResult, Period};
use aioffice_ledger::LedgerBook;
use rust_decimal::Decimal;

use crate::datev::{generate_datev_rows, render_datev_csv};
use crate::ExportFile;

/// Cases eligible for a batch export: period within the range, posted (and
/// exported when re-exports are requested), with a ledger entry. Ordered by
/// period, then reference.
pub fn select_batch<'a>(
    cases: impl IntoIterator<Item = &'a Case>,
    from: &Period,
    to: &Period,
    include_exported: bool,
) -> Vec<&'a Case> {
    let mut selected: Vec<&Case> = cases
        .into_iter()
        .filter(|c| {
            let state_ok = c.state() == CaseState::Posted
                || (include_exported && c.state() == CaseState::Exported);
            state_ok
                && c.period() >= from
                && c.period() <= to
                && c.ledger_entry().is_some()
        })
        .collect();
    selected.sort_by(|a, b| {
        a.period()
            .cmp(b.period())
            .then_with(|| a.reference().cmp(b.reference()))
    });
    selected
}

fn empty_selection(from: &Period, to: &Period) -> OfficeError {
    OfficeError::not_found("cases for export period range", format!("{from}..{to}"))
}

/// One DATEV file covering every selected case.
pub fn generate_batch_datev(
    selected: &[&Case],
    from: &Period,
    to: &Period,
) -> OfficeResult<ExportFile> {
    if selected.is_empty() {
        return Err(empty_selection(from, to));
    }
    let mut rows = Vec::new();
    for case in selected {
        rows.extend(generate_datev_rows(case)?);
    }
    let content = render_datev_csv(&rows)?;
    let filename = format!("DATEV_export_{from}_{to}.csv");
    tracing::info!(cases = selected.len(), rows = rows.len(), %filename, "batch DATEV rendered");
    Ok(ExportFile { filename, content })
}

/// Comma-delimited per-case summary with ledger totals.
pub fn generate_batch_summary(
    selected: &[&Case],
    book: &LedgerBook,
    from: &Period,
    to: &Period,
) -> OfficeResult<ExportFile> {
    if selected.is_empty() {
        return Err(empty_selection(from, to));
    }
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer
        .write_record([
            "case_ref",
            "period",
            "partner",
            "invoice_date",
            "total_debit",
            "total_credit",
            "state",
        ])
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    for case in selected {
        let (total_debit, total_credit) = match case.ledger_entry() {
            Some(id) => {
                let entry = book.entry(id)?;
                (entry.total_debit(), entry.total_credit())
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        let partner = case.partner().map(|p| p.to_string()).unwrap_or_default();
        let debit = format!("{total_debit:.2}");
        let credit = format!("{total_credit:.2}");
        writer
            .write_record([
                case.reference(),
                case.period().as_str(),
                partner.as_str(),
                case.enrichment_value("invoice_date").unwrap_or(""),
                debit.as_str(),
                credit.as_str(),
                case.state().as_str(),
            ])
            .map_err(|e| OfficeError::serialization(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    let content =
        String::from_utf8(bytes).map_err(|e| OfficeError::serialization(e.to_string()))?;
    Ok(ExportFile {
        filename: format!("export_{from}_{to}.csv"),
        content,
    })
}
