//! The persisted order record.
//!
//! One row per order in an append-only table. The column layout is fixed and
//! the header row is written once, when the table is first used.

use crate::money::{display_total, donation_amount, format_amount};
use crate::order::OrderRequest;
use crate::utils::record_summary;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Column titles of the order table, in order.
pub const ORDER_RECORD_HEADER: [&str; 16] = [
	"Timestamp",
	"Name",
	"Email",
	"Phone",
	"IG Handle",
	"Payment Method",
	"Street",
	"City",
	"State",
	"Zip Code",
	"Country",
	"Rashguard Orders",
	"Shorts Orders",
	"Total",
	"Donation (15%)",
	"Payment Status",
];

/// A single ledger row.
pub type Row = Vec<String>;

/// Returns the header row.
pub fn header_row() -> Row {
	ORDER_RECORD_HEADER.iter().map(|s| s.to_string()).collect()
}

/// Order as written to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
	pub timestamp: DateTime<Utc>,
	pub name: String,
	pub email: String,
	pub phone: String,
	pub handle: String,
	pub payment_method: String,
	pub street: String,
	pub city: String,
	pub state: String,
	pub zipcode: String,
	pub country: String,
	pub rashguard_orders: String,
	pub shorts_orders: String,
	pub total: Decimal,
	pub donation: Decimal,
	pub payment_status: String,
}

impl OrderRecord {
	/// Builds the record for `request` as of `timestamp`.
	pub fn from_request(request: &OrderRequest, timestamp: DateTime<Utc>) -> Self {
		Self {
			timestamp,
			name: request.name.clone(),
			email: request.email.clone(),
			phone: request.phone.clone(),
			handle: request.handle().to_string(),
			payment_method: request.payment_label().to_string(),
			street: request.address.street.clone(),
			city: request.address.city.clone(),
			state: request.address.state.clone(),
			zipcode: request.address.zipcode.clone(),
			country: request.address.country.clone(),
			rashguard_orders: record_summary(&request.items.rashguard),
			shorts_orders: record_summary(&request.items.shorts),
			total: request.total,
			donation: donation_amount(request.total),
			payment_status: request.payment_status().to_string(),
		}
	}

	/// `$`-prefixed total as shown in the ledger.
	pub fn total_display(&self) -> String {
		format!("${}", display_total(self.total))
	}

	/// `$`-prefixed donation with two decimals.
	pub fn donation_display(&self) -> String {
		format!("${}", format_amount(self.donation))
	}

	/// Renders the record as a 16-column row matching [`ORDER_RECORD_HEADER`].
	pub fn to_row(&self) -> Row {
		vec![
			self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
			self.name.clone(),
			self.email.clone(),
			self.phone.clone(),
			self.handle.clone(),
			self.payment_method.clone(),
			self.street.clone(),
			self.city.clone(),
			self.state.clone(),
			self.zipcode.clone(),
			self.country.clone(),
			self.rashguard_orders.clone(),
			self.shorts_orders.clone(),
			self.total_display(),
			self.donation_display(),
			self.payment_status.clone(),
		]
	}
}
