//! DATEV Buchungsstapel CSV generation.
//!
//! Fixed 14-column layout, semicolon-delimited, CRLF line endings. One row
//! per expense/revenue line of the case's accounting-entry suggestion; tax
//! lines are folded into those rows proportionally to their net share so
//! every row carries the gross amount, and the payables contra account
//! collapses into the Gegenkonto column.

use csv::{Terminator, WriterBuilder};
use rust_decimal::Decimal;

use aioffice_cases::{AccountingEntryProposal, Case};
use aioffice_core::{OfficeError, OfficeResult};
use aioffice_ledger::skr03::{is_contra_account, is_tax_account, rate_as_decimal, tax_rate_for_account, CONTRA_ACCOUNTS};
use rust_decimal_macros::dec;

use crate::ExportFile;

pub const DATEV_HEADER: [&str; 14] = [
    "Umsatz (Soll/Haben)",
    "Soll/Haben-Kennzeichen",
    "WKZ Umsatz",
    "Kurs",
    "Basis-Umsatz",
    "WKZ Basis-Umsatz",
    "Konto",
    "Gegenkonto (ohne BU-Schluessel)",
    "BU-Schluessel",
    "Belegdatum",
    "Belegfeld 1",
    "Belegfeld 2",
    "Skonto",
    "Buchungstext",
];

/// One rendered Buchungsstapel row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatevRow {
    pub umsatz: String,
    pub soll_haben: String,
    pub wkz_umsatz: String,
    pub kurs: String,
    pub basis_umsatz: String,
    pub wkz_basis_umsatz: String,
    pub konto: String,
    pub gegenkonto: String,
    pub bu_schluessel: String,
    pub belegdatum: String,
    pub belegfeld_1: String,
    pub belegfeld_2: String,
    pub skonto: String,
    pub buchungstext: String,
}

impl DatevRow {
    fn record(&self) -> [&str; 14] {
        [
            &self.umsatz,
            &self.soll_haben,
            &self.wkz_umsatz,
            &self.kurs,
            &self.basis_umsatz,
            &self.wkz_basis_umsatz,
            &self.konto,
            &self.gegenkonto,
            &self.bu_schluessel,
            &self.belegdatum,
            &self.belegfeld_1,
            &self.belegfeld_2,
            &self.skonto,
            &self.buchungstext,
        ]
    }
}

/// German amount format: absolute value, two fractional digits, decimal
/// comma, no thousands separator.
pub fn format_datev_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.abs().round_dp(2)).replace('.', ",")
}

/// BU-Schluessel: 19% -> "9", 7% -> "8". The rate comes from the suggestion
/// payload, falling back to the tax accounts present in the lines.
pub fn datev_tax_key(proposal: &AccountingEntryProposal) -> String {
    let rate = proposal
        .tax_rate
        .or_else(|| {
            proposal
                .lines
                .iter()
                .find_map(|l| tax_rate_for_account(&l.account))
        })
        .and_then(rate_as_decimal);
    match rate {
        Some(r) if r == dec!(0.19) => "9".to_string(),
        Some(r) if r == dec!(0.07) => "8".to_string(),
        _ => String::new(),
    }
}

fn line_amount(debit: Decimal, credit: Decimal) -> Decimal {
    if debit.is_zero() { credit } else { debit }
}

/// Build the rows for one case from its latest accounting-entry suggestion.
pub fn generate_datev_rows(case: &Case) -> OfficeResult<Vec<DatevRow>> {
    let proposal = case
        .latest_accounting_entry()
        .and_then(|s| s.as_accounting_entry())
        .ok_or_else(|| {
            OfficeError::not_found("accounting entry suggestion", case.reference().to_string())
        })?;

    let gegenkonto = proposal
        .lines
        .iter()
        .find(|l| is_contra_account(&l.account))
        .map(|l| l.account.clone())
        .unwrap_or_else(|| CONTRA_ACCOUNTS[0].to_string());

    let booking_lines: Vec<_> = proposal
        .lines
        .iter()
        .filter(|l| !is_tax_account(&l.account) && !is_contra_account(&l.account))
        .collect();
    let net_total: Decimal = booking_lines
        .iter()
        .map(|l| line_amount(l.debit, l.credit))
        .sum();
    let tax_total: Decimal = proposal
        .lines
        .iter()
        .filter(|l| is_tax_account(&l.account))
        .map(|l| line_amount(l.debit, l.credit))
        .sum();

    let bu_schluessel = datev_tax_key(proposal);
    let belegdatum = case
        .enrichment_invoice_date()
        .map(|d| d.format("%d%m").to_string())
        .unwrap_or_default();
    let belegfeld_1 = case
        .enrichment_invoice_number()
        .unwrap_or(case.reference())
        .to_string();

    let rows = booking_lines
        .into_iter()
        .map(|line| {
            let net = line_amount(line.debit, line.credit);
            let gross = if net_total.is_zero() {
                net
            } else {
                net + tax_total * net / net_total
            };
            DatevRow {
                umsatz: format_datev_amount(gross),
                soll_haben: if line.debit.is_zero() { "H" } else { "S" }.to_string(),
                wkz_umsatz: "EUR".to_string(),
                kurs: String::new(),
                basis_umsatz: String::new(),
                wkz_basis_umsatz: String::new(),
                konto: line.account.clone(),
                gegenkonto: gegenkonto.clone(),
                bu_schluessel: bu_schluessel.clone(),
                belegdatum: belegdatum.clone(),
                belegfeld_1: belegfeld_1.clone(),
                belegfeld_2: String::new(),
                skonto: String::new(),
                buchungstext: line.description.clone(),
            }
        })
        .collect();
    Ok(rows)
}

/// Render rows into the semicolon/CRLF wire format, header first.
pub fn render_datev_csv(rows: &[DatevRow]) -> OfficeResult<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer
        .write_record(DATEV_HEADER)
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    for row in rows {
        writer
            .write_record(row.record())
            .map_err(|e| OfficeError::serialization(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OfficeError::serialization(e.to_string()))
}

/// Single-case DATEV file. Requires a posted ledger entry on the case.
pub fn export_case_datev(case: &Case) -> OfficeResult<ExportFile> {
    if case.ledger_entry().is_none() {
        return Err(OfficeError::not_found(
            "ledger entry for case",
            case.reference().to_string(),
        ));
    }
    let rows = generate_datev_rows(case)?;
    let content = render_datev_csv(&rows)?;
    let filename = format!("DATEV_{}.csv", case.reference());
    tracing::debug!(case = %case.reference(), rows = rows.len(), %filename, "DATEV file rendered");
    Ok(ExportFile { filename, content })
}
