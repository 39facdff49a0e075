//! Append-only order ledger.
//!
//! The ledger is a table of string rows. The first row is the column header
//! and is written exactly once, when the table is first found empty. Rows
//! are never updated or deleted.

use async_trait::async_trait;
use orderdesk_types::{header_row, ConfigSchema, ImplementationRegistry, OrderRecord};
use thiserror::Error;
use tokio::sync::Mutex;

pub mod implementations {
	pub mod file;
	pub mod memory;
	pub mod sheets;
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// Local storage failed.
	#[error("Backend error: {0}")]
	Backend(String),
	/// The remote table service could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The remote table service answered with an error or unexpected body.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every ledger backend implements.
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	/// Returns the configuration schema for this ledger implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Number of rows currently in the table, header included.
	async fn row_count(&self) -> Result<usize, LedgerError>;

	/// Appends one row after the last row.
	async fn append_row(&self, row: &[String]) -> Result<(), LedgerError>;
}

/// Signature every ledger implementation's factory has.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Returns `(name, factory)` for every built-in ledger implementation.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::{file, memory, sheets};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
		(sheets::Registry::NAME, sheets::Registry::factory()),
	]
}

/// Result of appending one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
	/// Whether the header row was written before the order row.
	pub header_written: bool,
}

/// Writes order records to a ledger backend.
///
/// Header check and append run under one lock so that two orders arriving
/// on an empty table produce a single header.
pub struct LedgerService {
	backend: Box<dyn LedgerInterface>,
	write_lock: Mutex<()>,
}

impl LedgerService {
	pub fn new(backend: Box<dyn LedgerInterface>) -> Self {
		Self {
			backend,
			write_lock: Mutex::new(()),
		}
	}

	/// Appends the header row if the table is empty.
	///
	/// Returns whether the header was written.
	async fn ensure_header(&self) -> Result<bool, LedgerError> {
		if self.backend.row_count().await? > 0 {
			return Ok(false);
		}
		self.backend.append_row(&header_row()).await?;
		tracing::info!("Wrote order table header");
		Ok(true)
	}

	/// Appends `record` as one row, preceded by the header on an empty table.
	pub async fn append_record(&self, record: &OrderRecord) -> Result<AppendOutcome, LedgerError> {
		let _guard = self.write_lock.lock().await;
		let header_written = self.ensure_header().await?;
		self.backend.append_row(&record.to_row()).await?;
		Ok(AppendOutcome { header_written })
	}

	/// Number of rows currently in the table, header included.
	pub async fn row_count(&self) -> Result<usize, LedgerError> {
		self.backend.row_count().await
	}
}
