//! Money arithmetic on fixed-point decimals.
//!
//! Totals arrive as decimals in major currency units. Payment providers want
//! integer minor units; the ledger and emails want two-decimal strings.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Share of every order that goes to the charity, 15 %.
pub const DONATION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Errors that can occur converting money amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
	#[error("Amount cannot be negative: {0}")]
	Negative(Decimal),
	#[error("Amount out of range: {0}")]
	OutOfRange(Decimal),
}

/// Donation included in `total`, rounded to cents.
pub fn donation_amount(total: Decimal) -> Decimal {
	(total * DONATION_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with exactly two decimals, e.g. `18.00`.
pub fn format_amount(amount: Decimal) -> String {
	let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
	format!("{:.2}", rounded)
}

/// Renders a total the way the customer typed it, without trailing zeros.
pub fn display_total(total: Decimal) -> String {
	total.normalize().to_string()
}

/// Converts a major-unit amount to integer minor units, round(total × 100).
pub fn to_minor_units(total: Decimal) -> Result<i64, MoneyError> {
	if total.is_sign_negative() && !total.is_zero() {
		return Err(MoneyError::Negative(total));
	}
	(total * Decimal::ONE_HUNDRED)
		.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
		.to_i64()
		.ok_or(MoneyError::OutOfRange(total))
}
