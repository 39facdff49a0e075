//! Hosted checkout creation.
//!
//! A payment backend turns a [`CheckoutRequest`] into a provider-issued
//! [`CheckoutSession`] whose URL the customer is redirected to. Exactly one
//! outbound call is made per request; there are no retries.

use async_trait::async_trait;
use orderdesk_types::{CheckoutRequest, CheckoutSession, ConfigSchema, ImplementationRegistry};
use thiserror::Error;

pub mod implementations {
	pub mod mock;
	pub mod stripe;
}

/// Errors that can occur while creating a checkout session.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// Credential missing or left at its sample value. No call was made.
	#[error("API key not configured")]
	NotConfigured,
	/// The provider answered with a non-success status.
	#[error("{0}")]
	Provider(String),
	/// The provider could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The provider's answer could not be understood.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every payment backend implements.
#[async_trait]
pub trait PaymentInterface: Send + Sync {
	/// Returns the configuration schema for this payment implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Creates one hosted checkout session.
	async fn create_session(
		&self,
		request: &CheckoutRequest,
	) -> Result<CheckoutSession, PaymentError>;
}

/// Signature every payment implementation's factory has.
pub type PaymentFactory = fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>;

/// Registry trait for payment implementations.
pub trait PaymentRegistry: ImplementationRegistry<Factory = PaymentFactory> {}

/// Returns `(name, factory)` for every built-in payment implementation.
pub fn get_all_implementations() -> Vec<(&'static str, PaymentFactory)> {
	use implementations::{mock, stripe};

	vec![
		(mock::Registry::NAME, mock::Registry::factory()),
		(stripe::Registry::NAME, stripe::Registry::factory()),
	]
}

/// Front for the configured payment backend.
pub struct PaymentService {
	backend: Box<dyn PaymentInterface>,
}

impl PaymentService {
	pub fn new(backend: Box<dyn PaymentInterface>) -> Self {
		Self { backend }
	}

	pub async fn create_session(
		&self,
		request: &CheckoutRequest,
	) -> Result<CheckoutSession, PaymentError> {
		let session = self.backend.create_session(request).await?;
		tracing::info!(
			session_id = %orderdesk_types::truncate_id(&session.id),
			amount_minor = request.amount_minor,
			"Created checkout session"
		);
		Ok(session)
	}
}
