//! Email backend that writes messages to the log instead of sending them.

use crate::{EmailInterface, NotifyError};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, EmailMessage, Schema, ValidationError};

pub struct LogEmail;

#[async_trait]
impl EmailInterface for LogEmail {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogEmailSchema)
	}

	async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
		tracing::info!(
			to = %message.to,
			from = %message.sender_name,
			reply_to = message.reply_to.as_deref().unwrap_or(""),
			subject = %message.subject,
			"Email (log only)"
		);
		tracing::debug!(body = %message.body, "Email body");
		Ok(())
	}
}

pub struct LogEmailSchema;

impl ConfigSchema for LogEmailSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_email(config: &toml::Value) -> Result<Box<dyn EmailInterface>, NotifyError> {
	LogEmailSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;
	Ok(Box::new(LogEmail))
}

/// Registry for the log implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = crate::EmailFactory;

	fn factory() -> Self::Factory {
		create_email
	}
}

impl crate::EmailRegistry for Registry {}
