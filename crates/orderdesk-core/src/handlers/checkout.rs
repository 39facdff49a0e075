//! Checkout handler for hosted payment sessions.
//!
//! Converts the order total to minor units, asks the payment backend for a
//! session and caches the order payload under the session id. Nothing is
//! cached unless the provider issued a session.

use orderdesk_payment::{PaymentError, PaymentService};
use orderdesk_storage::StorageService;
use orderdesk_types::{
	checkout_description, to_minor_units, truncate_id, CheckoutRequest, CheckoutSession,
	OrderRequest, StorageKey,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
	/// Payment credential missing; no call was made.
	#[error("API key not configured")]
	NotConfigured,
	/// The provider rejected the call.
	#[error("{0}")]
	Provider(String),
	#[error("{0}")]
	Failed(String),
}

/// Handler that creates checkout sessions.
pub struct CheckoutHandler {
	payment: Arc<PaymentService>,
	storage: Arc<StorageService>,
}

impl CheckoutHandler {
	pub fn new(payment: Arc<PaymentService>, storage: Arc<StorageService>) -> Self {
		Self { payment, storage }
	}

	/// Builds the provider request for `request`.
	pub fn checkout_request(&self, request: &OrderRequest) -> Result<CheckoutRequest, CheckoutError> {
		let amount_minor =
			to_minor_units(request.total).map_err(|e| CheckoutError::Failed(e.to_string()))?;
		Ok(CheckoutRequest {
			amount_minor,
			description: checkout_description(&request.items),
			customer_email: request.email.clone(),
			customer_name: request.name.clone(),
			customer_phone: request.phone.clone(),
		})
	}

	#[instrument(skip_all, fields(customer = %request.email))]
	pub async fn handle(&self, request: &OrderRequest) -> Result<CheckoutSession, CheckoutError> {
		let checkout = self.checkout_request(request)?;

		let session = self
			.payment
			.create_session(&checkout)
			.await
			.map_err(|e| match e {
				PaymentError::NotConfigured => CheckoutError::NotConfigured,
				PaymentError::Provider(message) => CheckoutError::Provider(message),
				other => CheckoutError::Failed(other.to_string()),
			})?;

		self.storage
			.store_keyed(StorageKey::CheckoutSessions, &session.id, request)
			.await
			.map_err(|e| CheckoutError::Failed(e.to_string()))?;

		tracing::debug!(
			session_id = %truncate_id(&session.id),
			"Cached order payload"
		);
		Ok(session)
	}
}
