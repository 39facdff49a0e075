//! Email backend for JSON mail-sending APIs.
//!
//! Each message is one `POST` of
//! `{from, to, reply_to, subject, text}` to `api_url` with a bearer key.
//! Any 2xx answer counts as accepted.

use crate::{EmailInterface, NotifyError};
use async_trait::async_trait;
use orderdesk_types::{
	ConfigSchema, EmailMessage, Field, FieldType, Schema, SecretString, ValidationError,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Address<'a> {
	email: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
	from: Address<'a>,
	to: Vec<Address<'a>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	reply_to: Option<Address<'a>>,
	subject: &'a str,
	text: &'a str,
}

/// HTTP mail API implementation.
pub struct HttpEmail {
	client: reqwest::Client,
	api_url: String,
	api_key: SecretString,
	from_address: String,
}

impl HttpEmail {
	pub fn new(
		client: reqwest::Client,
		api_url: impl Into<String>,
		api_key: SecretString,
		from_address: impl Into<String>,
	) -> Self {
		Self {
			client,
			api_url: api_url.into(),
			api_key,
			from_address: from_address.into(),
		}
	}
}

#[async_trait]
impl EmailInterface for HttpEmail {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpEmailSchema)
	}

	async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
		let body = SendRequest {
			from: Address {
				email: &self.from_address,
				name: Some(&message.sender_name),
			},
			to: vec![Address {
				email: &message.to,
				name: None,
			}],
			reply_to: message.reply_to.as_deref().map(|email| Address { email, name: None }),
			subject: &message.subject,
			text: &message.body,
		};

		let response = self
			.client
			.post(&self.api_url)
			.bearer_auth(self.api_key.expose_secret())
			.json(&body)
			.send()
			.await
			.map_err(|e| NotifyError::Network(e.to_string()))?;

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}
		let detail = response.text().await.unwrap_or_default();
		Err(NotifyError::Rejected(format!(
			"HTTP {}: {}",
			status.as_u16(),
			detail.trim()
		)))
	}
}

/// Configuration schema for HttpEmail.
pub struct HttpEmailSchema;

impl ConfigSchema for HttpEmailSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![
				Field::new("api_url", FieldType::Url),
				Field::new("api_key", FieldType::String),
				Field::new("from_address", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(s) if s.contains('@') => Ok(()),
						_ => Err("from_address must be an email address".to_string()),
					}
				}),
			],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(120),
				},
			)],
		)
		.validate(config)
	}
}

/// Factory function to create the HTTP email backend from configuration.
///
/// Configuration parameters:
/// - `api_url` (required): send endpoint
/// - `api_key` (required): bearer key
/// - `from_address` (required): envelope sender
/// - `timeout_seconds`: request timeout (default: 15)
pub fn create_email(config: &toml::Value) -> Result<Box<dyn EmailInterface>, NotifyError> {
	HttpEmailSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;

	let get_str = |key: &str| config.get(key).and_then(|v| v.as_str()).unwrap_or_default();
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(15) as u64;

	let client = reqwest::Client::builder()
		.timeout(Duration::from_secs(timeout))
		.build()
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;

	Ok(Box::new(HttpEmail::new(
		client,
		get_str("api_url"),
		SecretString::from(get_str("api_key")),
		get_str("from_address"),
	)))
}

/// Registry for the HTTP implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::EmailFactory;

	fn factory() -> Self::Factory {
		create_email
	}
}

impl crate::EmailRegistry for Registry {}
