//! Stripe Checkout backend.
//!
//! Sessions are created with one form-encoded `POST /v1/checkout/sessions`
//! carrying a single line item of quantity one priced at the order total.

use crate::{PaymentError, PaymentInterface};
use async_trait::async_trait;
use orderdesk_types::{
	CheckoutRequest, CheckoutSession, ConfigSchema, Field, FieldType, Schema, SecretString,
	ValidationError,
};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.stripe.com/v1/checkout/sessions";
const DEFAULT_PRODUCT_NAME: &str = "All Heart All In - Rashguard & Shorts";
const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
	#[serde(default)]
	message: Option<String>,
}

/// Settings for [`StripePayment`].
#[derive(Debug, Clone)]
pub struct StripeSettings {
	pub secret_key: SecretString,
	pub api_url: String,
	pub success_url: String,
	pub cancel_url: String,
	pub product_name: String,
	pub currency: String,
}

/// Stripe Checkout implementation.
pub struct StripePayment {
	client: reqwest::Client,
	settings: StripeSettings,
}

impl StripePayment {
	pub fn new(client: reqwest::Client, settings: StripeSettings) -> Self {
		Self { client, settings }
	}

	/// Form fields of the session-creation call, in submission order.
	fn form_fields(&self, request: &CheckoutRequest) -> Vec<(&'static str, String)> {
		let s = &self.settings;
		vec![
			("payment_method_types[]", "card".to_string()),
			("line_items[0][price_data][currency]", s.currency.clone()),
			(
				"line_items[0][price_data][unit_amount]",
				request.amount_minor.to_string(),
			),
			(
				"line_items[0][price_data][product_data][name]",
				s.product_name.clone(),
			),
			(
				"line_items[0][price_data][product_data][description]",
				request.description.clone(),
			),
			("line_items[0][quantity]", "1".to_string()),
			("mode", "payment".to_string()),
			("success_url", s.success_url.clone()),
			("cancel_url", s.cancel_url.clone()),
			("customer_email", request.customer_email.clone()),
			("metadata[customer_name]", request.customer_name.clone()),
			("metadata[phone]", request.customer_phone.clone()),
			("metadata[order_details]", request.description.clone()),
		]
	}
}

#[async_trait]
impl PaymentInterface for StripePayment {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StripePaymentSchema)
	}

	async fn create_session(
		&self,
		request: &CheckoutRequest,
	) -> Result<CheckoutSession, PaymentError> {
		if self.settings.secret_key.is_placeholder() {
			return Err(PaymentError::NotConfigured);
		}

		let response = self
			.client
			.post(&self.settings.api_url)
			.bearer_auth(self.settings.secret_key.expose_secret())
			.form(&self.form_fields(request))
			.send()
			.await
			.map_err(|e| PaymentError::Network(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| PaymentError::Network(e.to_string()))?;
		tracing::debug!(status = status.as_u16(), "Stripe responded");

		if status == reqwest::StatusCode::OK {
			return serde_json::from_str::<CheckoutSession>(&body)
				.map_err(|e| PaymentError::InvalidResponse(e.to_string()));
		}

		let parsed: ErrorBody = serde_json::from_str(&body)
			.map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
		let message = parsed
			.error
			.and_then(|e| e.message)
			.unwrap_or_else(|| "Unknown error".to_string());
		Err(PaymentError::Provider(message))
	}
}

/// Configuration schema for StripePayment.
pub struct StripePaymentSchema;

impl ConfigSchema for StripePaymentSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![
				Field::new("secret_key", FieldType::String),
				Field::new("success_url", FieldType::Url),
				Field::new("cancel_url", FieldType::Url),
			],
			vec![
				Field::new("api_url", FieldType::Url),
				Field::new("product_name", FieldType::String),
				Field::new("currency", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(c) if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_lowercase()) => {
							Ok(())
						},
						_ => Err("currency must be a lowercase ISO 4217 code".to_string()),
					}
				}),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(120),
					},
				),
			],
		)
		.validate(config)
	}
}

/// Factory function to create the Stripe backend from configuration.
///
/// Configuration parameters:
/// - `secret_key` (required): sample placeholders are accepted here and
///   rejected per request
/// - `success_url`, `cancel_url` (required): redirect targets
/// - `api_url`: session endpoint (default: Stripe's)
/// - `product_name`: line-item name
/// - `currency`: ISO code (default: "usd")
/// - `timeout_seconds`: request timeout (default: 30)
pub fn create_payment(config: &toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError> {
	StripePaymentSchema
		.validate(config)
		.map_err(|e| PaymentError::Configuration(e.to_string()))?;

	let get_str = |key: &str| config.get(key).and_then(|v| v.as_str());
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	let settings = StripeSettings {
		secret_key: SecretString::from(get_str("secret_key").unwrap_or_default()),
		api_url: get_str("api_url").unwrap_or(DEFAULT_API_URL).to_string(),
		success_url: get_str("success_url").unwrap_or_default().to_string(),
		cancel_url: get_str("cancel_url").unwrap_or_default().to_string(),
		product_name: get_str("product_name")
			.unwrap_or(DEFAULT_PRODUCT_NAME)
			.to_string(),
		currency: get_str("currency").unwrap_or(DEFAULT_CURRENCY).to_string(),
	};

	if settings.secret_key.is_placeholder() {
		tracing::warn!("Stripe secret_key is not set; checkout requests will be rejected");
	}

	let client = reqwest::Client::builder()
		.timeout(Duration::from_secs(timeout))
		.build()
		.map_err(|e| PaymentError::Configuration(e.to_string()))?;

	Ok(Box::new(StripePayment::new(client, settings)))
}

/// Registry for the Stripe implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "stripe";
	type Factory = crate::PaymentFactory;

	fn factory() -> Self::Factory {
		create_payment
	}
}

impl crate::PaymentRegistry for Registry {}
