//! Configuration module for the orderdesk service.
//!
//! Configuration is read from TOML once at start-up and is immutable
//! afterwards. Every pluggable concern (cache storage, ledger, payment,
//! notification) names a `primary` implementation and carries a raw table
//! per implementation that the backend validates itself.
//!
//! A file may pull sections from sibling files with `include = ["a.toml"]`;
//! see [`ConfigLoader`]. `${VAR}` and `${VAR:-default}` are substituted from
//! the environment before parsing.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The file is not valid TOML or does not match the expected shape.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Values parsed but are inconsistent or out of range.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// HTTP server settings.
	#[serde(default)]
	pub api: ApiConfig,
	/// Key/value cache for pending checkout sessions.
	pub storage: StorageConfig,
	/// Append-only order table.
	pub ledger: LedgerConfig,
	/// Hosted checkout provider.
	pub payment: PaymentConfig,
	/// Transactional email delivery and the text that goes into it.
	pub notification: NotificationConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier, used in logs.
	pub id: String,
}

/// Configuration for the cache storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	pub primary: String,
	/// Raw table per implementation name.
	pub implementations: HashMap<String, toml::Value>,
	/// Seconds between sweeps of expired cache entries.
	#[serde(default = "default_cleanup_interval")]
	pub cleanup_interval_seconds: u64,
}

fn default_cleanup_interval() -> u64 {
	300
}

/// Configuration for the order ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the checkout provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for email delivery and email content.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
	/// Which delivery implementation to use.
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
	/// Recipient of new-order notices.
	pub owner_email: String,
	/// Sender display name on owner notices.
	#[serde(default = "default_sender_name")]
	pub sender_name: String,
	/// Sender display name on customer emails.
	#[serde(default = "default_customer_sender_name")]
	pub customer_sender_name: String,
	/// Reply-to address on customer emails.
	#[serde(default)]
	pub reply_to: Option<String>,
	/// Subject of the payment-instructions email.
	#[serde(default = "default_instructions_subject")]
	pub instructions_subject: String,
	/// Venmo handle customers pay to, including the leading `@`.
	pub venmo_handle: String,
	/// Zelle address customers pay to.
	pub zelle_address: String,
	/// Instagram handle shown in the contact block.
	#[serde(default)]
	pub instagram: Option<String>,
	/// Contact email shown in the contact block.
	#[serde(default)]
	pub contact_email: Option<String>,
	/// Name the customer email is signed with.
	#[serde(default = "default_signature")]
	pub signature: String,
	/// Brand line under the signature.
	#[serde(default = "default_brand")]
	pub brand: String,
	/// Charity that receives the donation share.
	#[serde(default = "default_charity")]
	pub charity: String,
}

fn default_sender_name() -> String {
	"Rashguard Order System".to_string()
}

fn default_customer_sender_name() -> String {
	"All Heart All In".to_string()
}

fn default_instructions_subject() -> String {
	"All Heart All In - Payment Instructions for Your Order".to_string()
}

fn default_signature() -> String {
	"The All Heart All In team".to_string()
}

fn default_brand() -> String {
	"All Heart All In ❤️".to_string()
}

fn default_charity() -> String {
	"Tap Cancer Out".to_string()
}

/// Settings for the HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Bind address.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Bind port.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Per-request deadline in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Largest accepted request body, in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration. Absent means any origin is allowed.
	#[serde(default)]
	pub cors: Option<CorsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
			cors: None,
		}
	}
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	64 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}. Comment lines
/// are left untouched.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	for line in input.split_inclusive('\n') {
		if line.trim_start().starts_with('#') {
			result.push_str(line);
			continue;
		}

		let mut last = 0;
		for cap in re.captures_iter(line) {
			let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
				continue;
			};
			let value = match std::env::var(var_name.as_str()) {
				Ok(v) => v,
				Err(_) => match cap.get(2) {
					Some(default) => default.as_str().to_string(),
					None => {
						return Err(ConfigError::Validation(format!(
							"Environment variable '{}' not found",
							var_name.as_str()
						)))
					},
				},
			};

			result.push_str(&line[last..full_match.start()]);
			result.push_str(&value);
			last = full_match.end();
		}
		result.push_str(&line[last..]);
	}

	Ok(result)
}

/// Checks the `primary`/`implementations` pair of one pluggable section.
fn validate_selection(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		validate_selection("storage", &self.storage.primary, &self.storage.implementations)?;
		if self.storage.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.storage.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		validate_selection("ledger", &self.ledger.primary, &self.ledger.implementations)?;
		validate_selection("payment", &self.payment.primary, &self.payment.implementations)?;

		let notification = &self.notification;
		validate_selection(
			"notification",
			&notification.primary,
			&notification.implementations,
		)?;
		if !notification.owner_email.contains('@') {
			return Err(ConfigError::Validation(format!(
				"notification.owner_email '{}' is not an email address",
				notification.owner_email
			)));
		}
		if let Some(reply_to) = &notification.reply_to {
			if !reply_to.contains('@') {
				return Err(ConfigError::Validation(format!(
					"notification.reply_to '{}' is not an email address",
					reply_to
				)));
			}
		}
		if notification.venmo_handle.trim().is_empty() {
			return Err(ConfigError::Validation(
				"notification.venmo_handle cannot be empty".into(),
			));
		}
		if notification.zelle_address.trim().is_empty() {
			return Err(ConfigError::Validation(
				"notification.zelle_address cannot be empty".into(),
			));
		}

		if self.api.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"api.timeout_seconds must be greater than 0".into(),
			));
		}
		if self.api.max_request_size == 0 {
			return Err(ConfigError::Validation(
				"api.max_request_size must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating
/// the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
