//! Amount comparison helpers.
//!
//! Amounts are `rust_decimal::Decimal` everywhere; the regulatory balance
//! invariant tolerates rounding differences up to one cent.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Maximum accepted difference between two amounts that are "equal".
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// True when the two magnitudes differ by less than one cent.
pub fn amounts_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < AMOUNT_TOLERANCE
}

/// The double-entry invariant: `|Σdebit − Σcredit| < 0.01`.
pub fn is_balanced(total_debit: Decimal, total_credit: Decimal) -> bool {
    amounts_equal(total_debit, total_credit)
}
