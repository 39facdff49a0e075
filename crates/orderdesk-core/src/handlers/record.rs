//! Record handler for placed orders.
//!
//! Appends the order to the ledger, then sends the owner notice and, for
//! Venmo or Zelle orders, payment instructions. Emails are best effort: a
//! failed send is reported in the outcome and never fails the order.

use crate::email::EmailComposer;
use chrono::Utc;
use orderdesk_ledger::LedgerService;
use orderdesk_notify::NotificationService;
use orderdesk_types::{EmailMessage, NotificationKind, OrderRecord, OrderRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while recording an order.
#[derive(Debug, Error)]
pub enum RecordError {
	#[error("{0}")]
	Ledger(String),
}

/// Result of one email attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
	pub kind: NotificationKind,
	pub recipient: String,
	/// Delivery error, if the send failed.
	pub error: Option<String>,
}

impl NotificationOutcome {
	pub fn delivered(&self) -> bool {
		self.error.is_none()
	}
}

/// Result of recording one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
	/// Whether the header row was written first.
	pub header_written: bool,
	pub notifications: Vec<NotificationOutcome>,
}

impl RecordOutcome {
	pub fn failed_notifications(&self) -> impl Iterator<Item = &NotificationOutcome> {
		self.notifications.iter().filter(|n| !n.delivered())
	}
}

/// Handler that records orders and sends the follow-up emails.
pub struct RecordHandler {
	ledger: Arc<LedgerService>,
	notifications: Arc<NotificationService>,
	composer: EmailComposer,
}

impl RecordHandler {
	pub fn new(
		ledger: Arc<LedgerService>,
		notifications: Arc<NotificationService>,
		composer: EmailComposer,
	) -> Self {
		Self {
			ledger,
			notifications,
			composer,
		}
	}

	#[instrument(skip_all, fields(customer = %request.email))]
	pub async fn handle(&self, request: &OrderRequest) -> Result<RecordOutcome, RecordError> {
		let record = OrderRecord::from_request(request, Utc::now());

		let appended = self
			.ledger
			.append_record(&record)
			.await
			.map_err(|e| RecordError::Ledger(e.to_string()))?;

		let mut notifications = Vec::with_capacity(2);

		let owner = self.composer.owner_notification(request, &record);
		notifications.push(
			self.notify(NotificationKind::OwnerNotification, &owner)
				.await,
		);

		if request
			.payment
			.as_ref()
			.is_some_and(|method| method.needs_instructions())
		{
			let instructions = self.composer.payment_instructions(request, &record);
			notifications.push(
				self.notify(NotificationKind::PaymentInstructions, &instructions)
					.await,
			);
		}

		Ok(RecordOutcome {
			header_written: appended.header_written,
			notifications,
		})
	}

	async fn notify(&self, kind: NotificationKind, message: &EmailMessage) -> NotificationOutcome {
		let error = self
			.notifications
			.send(kind, message)
			.await
			.err()
			.map(|e| e.to_string());
		NotificationOutcome {
			kind,
			recipient: message.to.clone(),
			error,
		}
	}
}
