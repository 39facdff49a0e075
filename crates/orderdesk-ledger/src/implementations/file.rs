//! File-backed ledger.
//!
//! Rows are stored as JSON arrays, one per line. Every operation takes an
//! advisory lock on the file so that separate processes sharing the file
//! append whole lines.

use crate::{LedgerError, LedgerInterface};
use async_trait::async_trait;
use fs2::FileExt;
use orderdesk_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Ledger stored in a JSON-lines file.
pub struct FileLedger {
	path: PathBuf,
}

impl FileLedger {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	fn open(path: &Path) -> Result<File, LedgerError> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| LedgerError::Backend(e.to_string()))?;
		}
		OpenOptions::new()
			.create(true)
			.read(true)
			.append(true)
			.open(path)
			.map_err(|e| LedgerError::Backend(format!("{}: {}", path.display(), e)))
	}

	fn count_lines(path: &Path) -> Result<usize, LedgerError> {
		let file = Self::open(path)?;
		file.lock_shared()
			.map_err(|e| LedgerError::Backend(e.to_string()))?;
		let mut count = 0;
		for line in BufReader::new(&file).lines() {
			let line = line.map_err(|e| LedgerError::Backend(e.to_string()))?;
			if !line.trim().is_empty() {
				count += 1;
			}
		}
		file.unlock()
			.map_err(|e| LedgerError::Backend(e.to_string()))?;
		Ok(count)
	}

	fn write_line(path: &Path, line: &str) -> Result<(), LedgerError> {
		let mut file = Self::open(path)?;
		file.lock_exclusive()
			.map_err(|e| LedgerError::Backend(e.to_string()))?;
		let written = writeln!(file, "{}", line).and_then(|_| file.sync_data());
		file.unlock()
			.map_err(|e| LedgerError::Backend(e.to_string()))?;
		written.map_err(|e| LedgerError::Backend(e.to_string()))
	}

	/// Reads back every row. Used by tests and offline tooling.
	pub fn read_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
		let file = match File::open(&self.path) {
			Ok(file) => file,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(LedgerError::Backend(e.to_string())),
		};
		BufReader::new(file)
			.lines()
			.filter(|line| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true))
			.map(|line| {
				let line = line.map_err(|e| LedgerError::Backend(e.to_string()))?;
				serde_json::from_str(&line).map_err(|e| LedgerError::Backend(e.to_string()))
			})
			.collect()
	}
}

#[async_trait]
impl LedgerInterface for FileLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileLedgerSchema)
	}

	async fn row_count(&self) -> Result<usize, LedgerError> {
		let path = self.path.clone();
		tokio::task::spawn_blocking(move || Self::count_lines(&path))
			.await
			.map_err(|e| LedgerError::Backend(e.to_string()))?
	}

	async fn append_row(&self, row: &[String]) -> Result<(), LedgerError> {
		let line = serde_json::to_string(row).map_err(|e| LedgerError::Backend(e.to_string()))?;
		let path = self.path.clone();
		tokio::task::spawn_blocking(move || Self::write_line(&path, &line))
			.await
			.map_err(|e| LedgerError::Backend(e.to_string()))?
	}
}

/// Configuration schema for FileLedger.
pub struct FileLedgerSchema;

impl ConfigSchema for FileLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("path", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a file ledger from configuration.
///
/// Configuration parameters:
/// - `path`: ledger file (default: "./data/orders.jsonl")
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	FileLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/orders.jsonl");
	Ok(Box::new(FileLedger::new(PathBuf::from(path))))
}

/// Registry for the file ledger implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}
