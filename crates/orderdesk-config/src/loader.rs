//! Loader for configurations split across several files.
//!
//! The entry file may name other files in `include`; their top-level
//! sections are merged in. A section may be defined in only one file and
//! included files cannot include further files.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// Loads a configuration file together with its includes.
pub struct ConfigLoader {
	root: PathBuf,
	seen: HashSet<PathBuf>,
	/// Top-level section name to the file that defined it
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	/// Creates a loader resolving relative paths against `root`.
	pub fn new(root: impl AsRef<Path>) -> Self {
		Self {
			root: root.as_ref().to_path_buf(),
			seen: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Loads, merges and validates a configuration file and its includes.
	pub async fn load_config(&mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let entry = self.locate(entry.as_ref())?;
		let mut merged = self.read_table(&entry).await?;

		let includes = match merged.remove("include") {
			Some(value) => include_list(value)?,
			None => Vec::new(),
		};
		for section in merged.keys() {
			self.owners.insert(section.clone(), entry.clone());
		}

		for include in includes {
			let path = self.locate(&include)?;
			let table = self.read_table(&path).await?;
			for (section, value) in table {
				self.claim(&section, &path)?;
				merged.insert(section, value);
			}
		}

		let config: Config = toml::Value::Table(merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Records `path` as the owner of `section`.
	fn claim(&mut self, section: &str, path: &Path) -> Result<(), ConfigError> {
		if section == "include" {
			return Err(ConfigError::Validation(format!(
				"{} cannot include other files; only the entry file may use include",
				path.display()
			)));
		}
		if let Some(owner) = self.owners.get(section) {
			return Err(ConfigError::Validation(format!(
				"Duplicate section '{}' in {} (already defined in {})",
				section,
				path.display(),
				owner.display()
			)));
		}
		self.owners.insert(section.to_string(), path.to_path_buf());
		Ok(())
	}

	/// Reads one file, resolving `${VAR}` references before parsing.
	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(io::Error::new(
				io::ErrorKind::NotFound,
				format!("{}: {}", path.display(), e),
			))
		})?;
		if !self.seen.insert(canonical) {
			return Err(ConfigError::Validation(format!(
				"{} is included more than once",
				path.display()
			)));
		}

		let raw = tokio::fs::read_to_string(path).await?;
		Ok(toml::from_str(&resolve_env_vars(&raw)?)?)
	}

	fn locate(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let candidate = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		};
		if candidate.is_file() {
			Ok(candidate)
		} else {
			Err(ConfigError::Io(io::Error::new(
				io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", candidate.display()),
			)))
		}
	}
}

/// `include` accepts one path or a list of paths.
fn include_list(value: toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				other => Err(ConfigError::Validation(format!(
					"include entries must be paths, found {}",
					other.type_str()
				))),
			})
			.collect(),
		other => Err(ConfigError::Validation(format!(
			"include must be a path or a list of paths, found {}",
			other.type_str()
		))),
	}
}
