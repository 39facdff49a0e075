//! Storage-related types for the orderdesk cache.

use std::str::FromStr;
use std::time::Duration;

/// Namespaces of the key/value cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Pending order payloads keyed by checkout session id
	CheckoutSessions,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::CheckoutSessions => "checkout_sessions",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::CheckoutSessions].into_iter()
	}

	/// Lifetime of entries in this namespace.
	pub fn ttl(&self) -> Duration {
		match self {
			StorageKey::CheckoutSessions => Duration::from_secs(3600),
		}
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"checkout_sessions" => Ok(Self::CheckoutSessions),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
