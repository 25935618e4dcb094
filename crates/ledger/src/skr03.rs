//! SKR03 account tables used by export and tax aggregation.
//!
//! Only the accounts the engine has to recognize: deductible input tax
//! (Vorsteuer) accounts mapped to their statutory rate, and the payables
//! contra account collapsed into the DATEV counter-account column.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Input-tax accounts and their rates: 1576 → 19%, 1571 → 7%.
pub const TAX_ACCOUNTS: [(&str, f64); 2] = [("1576", 0.19), ("1571", 0.07)];

/// Contra accounts (Verbindlichkeiten aus Lieferungen und Leistungen).
pub const CONTRA_ACCOUNTS: [&str; 1] = ["1600"];

pub fn tax_rate_for_account(code: &str) -> Option<f64> {
    TAX_ACCOUNTS
        .iter()
        .find(|(account, _)| *account == code)
        .map(|(_, rate)| *rate)
}

pub fn is_tax_account(code: &str) -> bool {
    tax_rate_for_account(code).is_some()
}

pub fn is_contra_account(code: &str) -> bool {
    CONTRA_ACCOUNTS.contains(&code)
}

pub fn contra_accounts() -> &'static [&'static str] {
    &CONTRA_ACCOUNTS
}

/// Statutory rate as a decimal fraction, for tax arithmetic.
pub fn rate_as_decimal(rate: f64) -> Option<Decimal> {
    if rate == 0.19 {
        Some(dec!(0.19))
    } else if rate == 0.07 {
        Some(dec!(0.07))
    } else {
        None
    }
}
