//! Common types module for the orderdesk system.
//!
//! This module defines the data types shared by every orderdesk crate: the
//! inbound order request, the persisted order record, checkout and email
//! payloads, the caller-visible response shape, and configuration validation.

/// API types for the HTTP entry point.
pub mod api;
/// Checkout session types exchanged with payment providers.
pub mod checkout;
/// Money arithmetic on fixed-point decimals.
pub mod money;
/// Email message types.
pub mod notification;
/// Inbound order request types.
pub mod order;
/// The persisted order record and its column layout.
pub mod record;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for credentials.
pub mod secret_string;
/// Storage types for the key/value cache.
pub mod storage;
/// Formatting helpers for order summaries.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use api::*;
pub use checkout::*;
pub use money::{
	display_total, donation_amount, format_amount, to_minor_units, MoneyError, DONATION_RATE,
};
pub use notification::*;
pub use order::*;
pub use record::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::*;
pub use utils::{checkout_description, record_summary, truncate_id};
pub use validation::*;
