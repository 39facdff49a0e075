//! Email message types for the notification backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A plain-text email ready to hand to a delivery backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
	pub to: String,
	pub subject: String,
	pub body: String,
	/// Display name shown as the sender.
	pub sender_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reply_to: Option<String>,
}

/// Which transactional email a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
	/// New-order notice to the shop owner.
	OwnerNotification,
	/// Venmo/Zelle instructions to the customer.
	PaymentInstructions,
}

impl fmt::Display for NotificationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NotificationKind::OwnerNotification => write!(f, "owner_notification"),
			NotificationKind::PaymentInstructions => write!(f, "payment_instructions"),
		}
	}
}
