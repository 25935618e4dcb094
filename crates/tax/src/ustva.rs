//! UStVA (Umsatzsteuervoranmeldung) Kennziffer aggregation.
//!
//! Walks the posted/exported cases of a period and buckets their suggestion
//! lines into the Kennziffern the advance VAT return asks for:
//!
//! - KZ 81: net amounts taxed at 19%
//! - KZ 86: net amounts taxed at 7%
//! - KZ 66: deductible input VAT at 19% (Vorsteuer)
//! - KZ 61: deductible input VAT at 7% (Vorsteuer)
//! - KZ 83: prepayment = (KZ81 tax + KZ86 tax) - (KZ66 + KZ61)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use aioffice_cases::{Case, CaseState};
use aioffice_core::{OfficeError, OfficeResult, Period};
use aioffice_ledger::skr03::{is_contra_account, is_tax_account, rate_as_decimal, tax_rate_for_account};

/// Aggregated Kennziffer values, all rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UstvaFigures {
    pub period: Period,
    pub kz81: Decimal,
    pub kz86: Decimal,
    pub kz66: Decimal,
    pub kz61: Decimal,
    pub kz83: Decimal,
    pub kz81_tax: Decimal,
    pub kz86_tax: Decimal,
}

/// Aggregate the UStVA figures for one period.
///
/// Considers posted and exported cases of the period that carry a ledger
/// entry; cases without an accounting-entry suggestion are skipped. An empty
/// selection is an error so the operator never files a zeroed return by
/// accident.
pub fn aggregate_ustva<'a>(
    cases: impl IntoIterator<Item = &'a Case>,
    period: &Period,
) -> OfficeResult<UstvaFigures> {
    let selected: Vec<&Case> = cases
        .into_iter()
        .filter(|c| {
            c.period() == period
                && matches!(c.state(), CaseState::Posted | CaseState::Exported)
                && c.ledger_entry().is_some()
        })
        .collect();
    if selected.is_empty() {
        return Err(OfficeError::not_found(
            "posted or exported cases for period",
            period.to_string(),
        ));
    }

    let mut kz81 = Decimal::ZERO;
    let mut kz86 = Decimal::ZERO;
    let mut kz66 = Decimal::ZERO;
    let mut kz61 = Decimal::ZERO;

    for case in &selected {
        let Some(proposal) = case
            .latest_accounting_entry()
            .and_then(|s| s.as_accounting_entry())
        else {
            continue;
        };

        let mut net = Decimal::ZERO;
        let mut tax = Decimal::ZERO;
        for line in &proposal.lines {
            let amount = if line.debit.is_zero() {
                line.credit
            } else {
                line.debit
            };
            if is_tax_account(&line.account) {
                tax += amount;
            } else if !is_contra_account(&line.account) {
                net += amount;
            }
        }

        let rate = proposal
            .tax_rate
            .or_else(|| {
                proposal
                    .lines
                    .iter()
                    .find_map(|l| tax_rate_for_account(&l.account))
            })
            .and_then(rate_as_decimal);

        if rate == Some(dec!(0.19)) {
            kz81 += net;
            kz66 += tax;
        } else if rate == Some(dec!(0.07)) {
            kz86 += net;
            kz61 += tax;
        }
    }

    let kz81_tax = kz81 * dec!(0.19);
    let kz86_tax = kz86 * dec!(0.07);
    let kz83 = (kz81_tax + kz86_tax) - (kz66 + kz61);

    tracing::debug!(period = %period, cases = selected.len(), "UStVA aggregated");
    Ok(UstvaFigures {
        period: period.clone(),
        kz81: kz81.round_dp(2),
        kz86: kz86.round_dp(2),
        kz66: kz66.round_dp(2),
        kz61: kz61.round_dp(2),
        kz83: kz83.round_dp(2),
        kz81_tax: kz81_tax.round_dp(2),
        kz86_tax: kz86_tax.round_dp(2),
    })
}

/// ZM (Zusammenfassende Meldung) is a documented placeholder.
pub fn zm_report() -> OfficeResult<()> {
    Err(OfficeError::unsupported("ZM report is not yet implemented"))
}
