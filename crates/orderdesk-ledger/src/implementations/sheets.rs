//! Spreadsheet ledger over the Google Sheets values API.
//!
//! Rows are read with `GET .../values/{range}` and appended with
//! `POST .../values/{range}:append`, the quoted A1 range being
//! percent-encoded as one path segment. Authentication is a bearer access token
//! supplied through configuration.

use crate::{LedgerError, LedgerInterface};
use async_trait::async_trait;
use orderdesk_types::{
	ConfigSchema, Field, FieldType, Schema, SecretString, ValidationError, ORDER_RECORD_HEADER,
};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_SHEET: &str = "Sheet1";

/// Body of a values read.
#[derive(Debug, Deserialize)]
struct ValueRange {
	/// Absent when the range holds no data.
	#[serde(default)]
	values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
	message: String,
}

/// Ledger backed by one sheet of a spreadsheet.
pub struct SheetsLedger {
	client: reqwest::Client,
	api_url: String,
	spreadsheet_id: String,
	sheet: String,
	access_token: SecretString,
}

impl SheetsLedger {
	pub fn new(
		client: reqwest::Client,
		api_url: impl Into<String>,
		spreadsheet_id: impl Into<String>,
		sheet: impl Into<String>,
		access_token: SecretString,
	) -> Self {
		Self {
			client,
			api_url: api_url.into().trim_end_matches('/').to_string(),
			spreadsheet_id: spreadsheet_id.into(),
			sheet: sheet.into(),
			access_token,
		}
	}

	/// A1 range spanning every ledger column, e.g. `'Sheet1'!A:P`.
	///
	/// The sheet name is always quoted, with embedded quotes doubled.
	fn range(&self) -> String {
		let last_column = (b'A' + (ORDER_RECORD_HEADER.len() as u8 - 1)) as char;
		format!("'{}'!A:{}", self.sheet.replace('\'', "''"), last_column)
	}

	/// Values endpoint for the ledger range, with `suffix` appended to the
	/// encoded range segment.
	fn values_url(&self, suffix: &str) -> Result<reqwest::Url, LedgerError> {
		let invalid = || LedgerError::Configuration(format!("Invalid api_url '{}'", self.api_url));
		let range = format!("{}{}", self.range(), suffix);
		let mut url = reqwest::Url::parse(&self.api_url).map_err(|_| invalid())?;
		url.path_segments_mut()
			.map_err(|_| invalid())?
			.pop_if_empty()
			.extend([
				"v4",
				"spreadsheets",
				self.spreadsheet_id.as_str(),
				"values",
				range.as_str(),
			]);
		Ok(url)
	}

	async fn check(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let message = response
			.json::<ApiErrorBody>()
			.await
			.map(|body| body.error.message)
			.unwrap_or_else(|_| "Unknown error".to_string());
		Err(LedgerError::InvalidResponse(format!(
			"HTTP {}: {}",
			status.as_u16(),
			message
		)))
	}
}

#[async_trait]
impl LedgerInterface for SheetsLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SheetsLedgerSchema)
	}

	async fn row_count(&self) -> Result<usize, LedgerError> {
		let response = self
			.client
			.get(self.values_url("")?)
			.bearer_auth(self.access_token.expose_secret())
			.send()
			.await
			.map_err(|e| LedgerError::Network(e.to_string()))?;
		let body: ValueRange = Self::check(response)
			.await?
			.json()
			.await
			.map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
		Ok(body.values.len())
	}

	async fn append_row(&self, row: &[String]) -> Result<(), LedgerError> {
		let response = self
			.client
			.post(self.values_url(":append")?)
			.query(&[
				("valueInputOption", "USER_ENTERED"),
				("insertDataOption", "INSERT_ROWS"),
			])
			.bearer_auth(self.access_token.expose_secret())
			.json(&serde_json::json!({ "values": [row] }))
			.send()
			.await
			.map_err(|e| LedgerError::Network(e.to_string()))?;
		Self::check(response).await?;
		tracing::debug!(sheet = %self.sheet, "Appended ledger row");
		Ok(())
	}
}

/// Configuration schema for SheetsLedger.
pub struct SheetsLedgerSchema;

impl ConfigSchema for SheetsLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![
				Field::new("spreadsheet_id", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(id) if !id.trim().is_empty() => Ok(()),
						_ => Err("spreadsheet_id cannot be empty".to_string()),
					}
				}),
				Field::new("access_token", FieldType::String),
			],
			vec![
				Field::new("sheet", FieldType::String),
				Field::new("api_url", FieldType::Url),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		)
		.validate(config)
	}
}

/// Factory function to create a spreadsheet ledger from configuration.
///
/// Configuration parameters:
/// - `spreadsheet_id` (required)
/// - `access_token` (required): OAuth bearer token
/// - `sheet`: sheet name (default: "Sheet1")
/// - `api_url`: API base URL (default: "https://sheets.googleapis.com")
/// - `timeout_seconds`: request timeout (default: 30)
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	SheetsLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let get_str = |key: &str| config.get(key).and_then(|v| v.as_str());
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	let client = reqwest::Client::builder()
		.timeout(Duration::from_secs(timeout))
		.build()
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	Ok(Box::new(SheetsLedger::new(
		client,
		get_str("api_url").unwrap_or(DEFAULT_API_URL),
		get_str("spreadsheet_id").unwrap_or_default(),
		get_str("sheet").unwrap_or(DEFAULT_SHEET),
		SecretString::from(get_str("access_token").unwrap_or_default()),
	)))
}

/// Registry for the spreadsheet ledger implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "sheets";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}
