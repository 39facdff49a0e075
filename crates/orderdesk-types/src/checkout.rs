//! Checkout session types for hosted payment pages.

use serde::{Deserialize, Serialize};

/// Parameters for creating a hosted checkout session.
///
/// The whole order is charged as a single line item of quantity one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
	/// Charge in minor currency units.
	pub amount_minor: i64,
	/// Human-readable summary of the items.
	pub description: String,
	pub customer_email: String,
	pub customer_name: String,
	pub customer_phone: String,
}

/// Session issued by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
	/// Unique identifier
	pub id: String,
	/// Redirect URL for customer
	pub url: String,
}
