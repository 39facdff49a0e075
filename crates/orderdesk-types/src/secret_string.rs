//! Secure string type for credentials such as payment-provider secret keys
//! and mail API tokens.
//!
//! `SecretString` zeroes its memory on drop and never prints its contents in
//! `Debug`, `Display` or serialized output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// Values shipped in sample configuration files that must never be used
/// as real credentials.
const PLACEHOLDERS: &[&str] = &[
	"STRIPE_SECRET_KEY_HERE",
	"sk_test_YOUR_STRIPE_SECRET_KEY_HERE",
	"YOUR_API_KEY_HERE",
	"changeme",
];

/// A credential that is zeroed on drop and redacted when printed.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret string as a string slice.
	///
	/// Callers must not log or persist the returned value.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Runs `f` with the secret, limiting the scope where it is visible.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// True when the value is empty or one of the sample-config placeholders.
	pub fn is_placeholder(&self) -> bool {
		let value = self.0.trim();
		value.is_empty() || PLACEHOLDERS.iter().any(|p| value.eq_ignore_ascii_case(p))
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_secret_string_is_redacted() {
		let secret = SecretString::from("sk_live_abc");
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", secret), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&secret).unwrap(),
			"\"***REDACTED***\""
		);
		assert_eq!(secret.expose_secret(), "sk_live_abc");
	}

	#[test]
	fn test_placeholder_detection() {
		assert!(SecretString::from("").is_placeholder());
		assert!(SecretString::from("  ").is_placeholder());
		assert!(SecretString::from("STRIPE_SECRET_KEY_HERE").is_placeholder());
		assert!(SecretString::from("sk_test_YOUR_STRIPE_SECRET_KEY_HERE").is_placeholder());
		assert!(!SecretString::from("sk_test_51Habc").is_placeholder());
	}

	#[test]
	fn test_with_exposed() {
		let secret = SecretString::from("token");
		assert_eq!(secret.with_exposed(|s| format!("Bearer {}", s)), "Bearer token");
	}
}
