//! In-memory ledger, for development and tests.

use crate::{LedgerError, LedgerInterface};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, Row, Schema, ValidationError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ledger held in a vector. Contents are lost on restart.
pub struct MemoryLedger {
	rows: Arc<Mutex<Vec<Row>>>,
}

impl MemoryLedger {
	pub fn new() -> Self {
		Self::with_rows(Vec::new())
	}

	/// Starts from existing rows.
	pub fn with_rows(rows: Vec<Row>) -> Self {
		Self {
			rows: Arc::new(Mutex::new(rows)),
		}
	}

	/// Shared handle on the rows, for inspection after the ledger is boxed.
	pub fn rows_handle(&self) -> Arc<Mutex<Vec<Row>>> {
		self.rows.clone()
	}
}

impl Default for MemoryLedger {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl LedgerInterface for MemoryLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLedgerSchema)
	}

	async fn row_count(&self) -> Result<usize, LedgerError> {
		Ok(self.rows.lock().await.len())
	}

	async fn append_row(&self, row: &[String]) -> Result<(), LedgerError> {
		self.rows.lock().await.push(row.to_vec());
		Ok(())
	}
}

/// Configuration schema for MemoryLedger. It takes no options.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	MemoryLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryLedger::new()))
}

/// Registry for the memory ledger implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}
