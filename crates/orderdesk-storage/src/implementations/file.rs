//! File-backed storage.
//!
//! Each key is one file under `storage_path`. Files begin with a fixed
//! 64-byte header carrying the expiry time, followed by the raw value.

use crate::{StorageError, StorageInterface, TtlConfig};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

const FILE_EXTENSION: &str = "bin";

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Fixed-size file header.
///
/// Layout (64 bytes):
/// - `[0..4]`: magic `ODSK`
/// - `[4..6]`: version, u16 little-endian
/// - `[6..14]`: expiry, u64 little-endian Unix seconds, 0 = never
/// - `[14..64]`: zero padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"ODSK";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			unix_now().saturating_add(ttl.as_secs())
		};
		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	fn encode(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expires = [0u8; 8];
		expires.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			version,
			expires_at: u64::from_le_bytes(expires),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && unix_now() >= self.expires_at
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	/// Maps a key to a filesystem-safe path.
	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key: String = key
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
			.collect();
		self.base_path
			.join(format!("{}.{}", safe_key, FILE_EXTENSION))
	}

	/// TTL for a key whose caller gave none, from its namespace prefix.
	fn ttl_for_key(&self, key: &str) -> Duration {
		self.ttl_config.for_key(key).unwrap_or(Duration::ZERO)
	}

	async fn read_entry(&self, key: &str) -> Result<Option<(FileHeader, Vec<u8>)>, StorageError> {
		let data = match fs::read(self.file_path(key)).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		let header = FileHeader::decode(&data)?;
		Ok(Some((header, data[FileHeader::SIZE..].to_vec())))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match self.read_entry(key).await? {
			Some((header, value)) if !header.is_expired() => Ok(value),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.ttl_for_key(key));
		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&FileHeader::new(ttl).encode());
		file_data.extend_from_slice(&value);

		// Write to a sibling then rename so readers never see a partial file.
		let path = self.file_path(key);
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(matches!(
			self.read_entry(key).await?,
			Some((header, _)) if !header.is_expired()
		))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(FILE_EXTENSION)) {
				continue;
			}
			let data = match fs::read(&path).await {
				Ok(data) => data,
				Err(e) => {
					tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable file");
					continue;
				},
			};
			match FileHeader::decode(&data) {
				Ok(header) if header.is_expired() => match fs::remove_file(&path).await {
					Ok(()) => removed += 1,
					Err(e) => {
						tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file")
					},
				},
				Ok(_) => {},
				Err(e) => {
					tracing::debug!(path = %path.display(), error = %e, "Skipping file without header")
				},
			}
		}
		Ok(removed)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional = vec![Field::new("storage_path", FieldType::String)];
		optional.extend(TtlConfig::schema_fields());
		Schema::new(vec![], optional).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: base directory (default: "./data/cache")
/// - `ttl_checkout_sessions`: lifetime in seconds of checkout-session entries (default: 3600)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/cache");

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().to_path_buf(), TtlConfig::default())
	}

	#[test]
	fn test_header_layout() {
		let header = FileHeader {
			version: 1,
			expires_at: 1_700_000_000,
		};
		let bytes = header.encode();
		assert_eq!(&bytes[0..4], b"ODSK");
		assert!(bytes[14..].iter().all(|b| *b == 0));
		assert_eq!(FileHeader::decode(&bytes).unwrap(), header);
		assert!(FileHeader::decode(&bytes[..10]).is_err());
	}

	#[tokio::test]
	async fn test_set_get_delete() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		storage
			.set_bytes("checkout_sessions:cs_1", b"payload".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("checkout_sessions:cs_1").await.unwrap(),
			b"payload"
		);
		assert!(dir.path().join("checkout_sessions_cs_1.bin").exists());

		storage.delete("checkout_sessions:cs_1").await.unwrap();
		assert!(!storage.exists("checkout_sessions:cs_1").await.unwrap());
		storage.delete("checkout_sessions:cs_1").await.unwrap();
	}

	#[tokio::test]
	async fn test_namespace_ttl_applied_by_default() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);
		storage
			.set_bytes("checkout_sessions:cs_2", b"x".to_vec(), None)
			.await
			.unwrap();

		let data = std::fs::read(dir.path().join("checkout_sessions_cs_2.bin")).unwrap();
		let header = FileHeader::decode(&data).unwrap();
		let remaining = header.expires_at - unix_now();
		assert!((3590..=3600).contains(&remaining));
	}

	#[tokio::test]
	async fn test_expired_entries_are_hidden_and_cleaned() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		let mut expired = FileHeader::new(Duration::ZERO);
		expired.expires_at = 1;
		let mut data = expired.encode().to_vec();
		data.extend_from_slice(b"old");
		std::fs::write(dir.path().join("checkout_sessions_old.bin"), data).unwrap();
		std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

		storage
			.set_bytes("checkout_sessions:new", b"new".to_vec(), None)
			.await
			.unwrap();

		assert!(matches!(
			storage.get_bytes("checkout_sessions:old").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("checkout_sessions:new").await.unwrap());
		assert!(dir.path().join("notes.txt").exists());
	}

	#[tokio::test]
	async fn test_cleanup_on_missing_directory() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().join("absent"), TtlConfig::default());
		assert_eq!(storage.cleanup_expired().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_keyed_store_uses_configured_lifetime() {
		let dir = TempDir::new().unwrap();
		let config: toml::Value = toml::from_str(&format!(
			"storage_path = {:?}\nttl_checkout_sessions = 60",
			dir.path().to_string_lossy()
		))
		.unwrap();
		let service = crate::StorageService::new(create_storage(&config).unwrap());
		service
			.store_keyed(orderdesk_types::StorageKey::CheckoutSessions, "cs_1", &"x")
			.await
			.unwrap();

		let data = std::fs::read(dir.path().join("checkout_sessions_cs_1.bin")).unwrap();
		let header = FileHeader::decode(&data).unwrap();
		let remaining = header.expires_at - unix_now();
		assert!((50..=60).contains(&remaining), "remaining {}", remaining);
	}

	#[test]
	fn test_factory_validates() {
		let config: toml::Value = toml::from_str("ttl_checkout_sessions = -5").unwrap();
		assert!(create_storage(&config).is_err());
	}
}
