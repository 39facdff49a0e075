//! Offline payment backend for development.
//!
//! Issues random session ids without contacting any provider. Setting
//! `reject_with` makes every call fail with that provider message.

use crate::{PaymentError, PaymentInterface};
use async_trait::async_trait;
use orderdesk_types::{
	CheckoutRequest, CheckoutSession, ConfigSchema, Field, FieldType, Schema, ValidationError,
};

const DEFAULT_CHECKOUT_URL: &str = "http://localhost:3000/mock-checkout";

/// Mock payment implementation.
pub struct MockPayment {
	checkout_url: String,
	reject_with: Option<String>,
}

impl MockPayment {
	pub fn new(checkout_url: impl Into<String>, reject_with: Option<String>) -> Self {
		Self {
			checkout_url: checkout_url.into(),
			reject_with,
		}
	}
}

#[async_trait]
impl PaymentInterface for MockPayment {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockPaymentSchema)
	}

	async fn create_session(
		&self,
		request: &CheckoutRequest,
	) -> Result<CheckoutSession, PaymentError> {
		if let Some(message) = &self.reject_with {
			return Err(PaymentError::Provider(message.clone()));
		}
		let id = format!("cs_mock_{}", uuid::Uuid::new_v4().simple());
		tracing::debug!(amount_minor = request.amount_minor, "Issuing mock session");
		Ok(CheckoutSession {
			url: format!("{}/{}", self.checkout_url.trim_end_matches('/'), id),
			id,
		})
	}
}

/// Configuration schema for MockPayment.
pub struct MockPaymentSchema;

impl ConfigSchema for MockPaymentSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![
				Field::new("checkout_url", FieldType::Url),
				Field::new("reject_with", FieldType::String),
			],
		)
		.validate(config)
	}
}

/// Factory function to create the mock backend from configuration.
///
/// Configuration parameters:
/// - `checkout_url`: base of the returned session URLs
/// - `reject_with`: provider error message to fail every call with
pub fn create_payment(config: &toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError> {
	MockPaymentSchema
		.validate(config)
		.map_err(|e| PaymentError::Configuration(e.to_string()))?;

	let checkout_url = config
		.get("checkout_url")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_CHECKOUT_URL);
	let reject_with = config
		.get("reject_with")
		.and_then(|v| v.as_str())
		.map(str::to_string);

	Ok(Box::new(MockPayment::new(checkout_url, reject_with)))
}

/// Registry for the mock implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::PaymentFactory;

	fn factory() -> Self::Factory {
		create_payment
	}
}

impl crate::PaymentRegistry for Registry {}
