//! Transactional email delivery.
//!
//! Backends deliver a fully composed [`EmailMessage`]; composing the text is
//! the engine's job. Delivery is attempted once.

use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, EmailMessage, ImplementationRegistry, NotificationKind};
use thiserror::Error;

pub mod implementations {
	pub mod http;
	pub mod log;
}

/// Errors that can occur while sending email.
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("Network error: {0}")]
	Network(String),
	/// The mail service refused the message.
	#[error("Rejected: {0}")]
	Rejected(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every email backend implements.
#[async_trait]
pub trait EmailInterface: Send + Sync {
	/// Returns the configuration schema for this email implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Signature every email implementation's factory has.
pub type EmailFactory = fn(&toml::Value) -> Result<Box<dyn EmailInterface>, NotifyError>;

/// Registry trait for email implementations.
pub trait EmailRegistry: ImplementationRegistry<Factory = EmailFactory> {}

/// Returns `(name, factory)` for every built-in email implementation.
pub fn get_all_implementations() -> Vec<(&'static str, EmailFactory)> {
	use implementations::{http, log};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(log::Registry::NAME, log::Registry::factory()),
	]
}

/// Sends notifications through the configured backend.
pub struct NotificationService {
	backend: Box<dyn EmailInterface>,
}

impl NotificationService {
	pub fn new(backend: Box<dyn EmailInterface>) -> Self {
		Self { backend }
	}

	/// Sends one message, logging the outcome under `kind`.
	pub async fn send(
		&self,
		kind: NotificationKind,
		message: &EmailMessage,
	) -> Result<(), NotifyError> {
		match self.backend.send(message).await {
			Ok(()) => {
				tracing::info!(kind = %kind, to = %message.to, "Notification sent");
				Ok(())
			},
			Err(e) => {
				tracing::warn!(kind = %kind, to = %message.to, error = %e, "Notification failed");
				Err(e)
			},
		}
	}
}
