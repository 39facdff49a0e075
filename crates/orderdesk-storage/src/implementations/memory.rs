//! In-memory storage backend.
//!
//! Entries live in a `HashMap` guarded by a read-write lock and are lost on
//! restart. Expiry is tracked per entry with the tokio clock.

use crate::{StorageError, StorageInterface, TtlConfig};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, Schema, ValidationError};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| now >= at)
	}
}

/// In-memory storage implementation.
pub struct MemoryStorage {
	store: RwLock<HashMap<String, Entry>>,
	/// Lifetimes applied to namespaced keys stored without a TTL.
	ttl_config: TtlConfig,
}

impl MemoryStorage {
	pub fn new(ttl_config: TtlConfig) -> Self {
		Self {
			store: RwLock::new(HashMap::new()),
			ttl_config,
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new(TtlConfig::default())
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		match store.get(key) {
			Some(entry) if !entry.is_expired(Instant::now()) => Ok(entry.value.clone()),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let expires_at = ttl
			.or_else(|| self.ttl_config.for_key(key))
			.filter(|ttl| !ttl.is_zero())
			.map(|ttl| Instant::now() + ttl);
		let mut store = self.store.write().await;
		store.insert(key.to_string(), Entry { value, expires_at });
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.store.write().await.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(key)
			.is_some_and(|entry| !entry.is_expired(Instant::now())))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let now = Instant::now();
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, entry| !entry.is_expired(now));
		Ok(before - store.len())
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], TtlConfig::schema_fields()).validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - `ttl_checkout_sessions`: lifetime in seconds of checkout-session entries (default: 3600)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	Ok(Box::new(MemoryStorage::new(TtlConfig::from_config(config))))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl orderdesk_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::default();

		let key = "checkout_sessions:cs_1";
		let value = b"{\"name\":\"Ada\"}".to_vec();
		storage.set_bytes(key, value.clone(), None).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_entry_expires_after_ttl() {
		let storage = MemoryStorage::default();
		storage
			.set_bytes("k", b"v".to_vec(), Some(Duration::from_secs(3600)))
			.await
			.unwrap();

		tokio::time::advance(Duration::from_secs(3599)).await;
		assert!(storage.exists("k").await.unwrap());

		tokio::time::advance(Duration::from_secs(1)).await;
		assert!(!storage.exists("k").await.unwrap());
		assert!(matches!(
			storage.get_bytes("k").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_removes_only_expired() {
		let storage = MemoryStorage::default();
		storage
			.set_bytes("short", b"1".to_vec(), Some(Duration::from_secs(10)))
			.await
			.unwrap();
		storage
			.set_bytes("long", b"2".to_vec(), Some(Duration::from_secs(100)))
			.await
			.unwrap();
		storage.set_bytes("forever", b"3".to_vec(), None).await.unwrap();

		tokio::time::advance(Duration::from_secs(11)).await;
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("long").await.unwrap());
		assert!(storage.exists("forever").await.unwrap());
	}

	#[tokio::test]
	async fn test_factory_rejects_bad_config() {
		let config: toml::Value = toml::from_str("ttl_checkout_sessions = \"soon\"").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
