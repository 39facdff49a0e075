//! Builder for constructing the order engine.
//!
//! Every implementation listed under a section's `implementations` table is
//! created through its factory so that configuration mistakes surface at
//! startup; the one named `primary` is then handed to its service.

use crate::engine::OrderDesk;
use orderdesk_config::Config;
use orderdesk_ledger::{LedgerError, LedgerInterface, LedgerService};
use orderdesk_notify::{EmailInterface, NotificationService, NotifyError};
use orderdesk_payment::{PaymentError, PaymentInterface, PaymentService};
use orderdesk_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for each pluggable component, keyed by implementation
/// name.
pub struct OrderDeskFactories<SF, LF, PF, EF> {
	pub storage_factories: HashMap<String, SF>,
	pub ledger_factories: HashMap<String, LF>,
	pub payment_factories: HashMap<String, PF>,
	pub email_factories: HashMap<String, EF>,
}

/// Builder for [`OrderDesk`].
pub struct OrderDeskBuilder {
	config: Config,
}

impl OrderDeskBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, LF, PF, EF>(
		self,
		factories: OrderDeskFactories<SF, LF, PF, EF>,
	) -> Result<OrderDesk, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>,
		EF: Fn(&toml::Value) -> Result<Box<dyn EmailInterface>, NotifyError>,
	{
		let storage = load_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
		)?;
		let ledger = load_primary(
			"ledger",
			&self.config.ledger.primary,
			&self.config.ledger.implementations,
			&factories.ledger_factories,
		)?;
		let payment = load_primary(
			"payment",
			&self.config.payment.primary,
			&self.config.payment.implementations,
			&factories.payment_factories,
		)?;
		let email = load_primary(
			"notification",
			&self.config.notification.primary,
			&self.config.notification.implementations,
			&factories.email_factories,
		)?;

		Ok(OrderDesk::new(
			self.config,
			Arc::new(StorageService::new(storage)),
			Arc::new(LedgerService::new(ledger)),
			Arc::new(PaymentService::new(payment)),
			Arc::new(NotificationService::new(email)),
		))
	}
}

/// Creates every configured implementation of one component and returns
/// the primary one.
fn load_primary<T: ?Sized, E: Display, F>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<Box<T>, BuilderError>
where
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut loaded = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(
				component,
				implementation = %name,
				"Unknown implementation, skipping"
			);
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create {} implementation",
					component
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if loaded.is_empty() {
		return Err(BuilderError::MissingComponent(format!(
			"No valid {} implementations available",
			component
		)));
	}

	loaded.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use orderdesk_types::{OrderRequest, ResponseStatus};
	use std::str::FromStr;

	fn factories() -> OrderDeskFactories<
		orderdesk_storage::StorageFactory,
		orderdesk_ledger::LedgerFactory,
		orderdesk_payment::PaymentFactory,
		orderdesk_notify::EmailFactory,
	> {
		OrderDeskFactories {
			storage_factories: orderdesk_storage::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			ledger_factories: orderdesk_ledger::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			payment_factories: orderdesk_payment::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			email_factories: orderdesk_notify::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
		}
	}

	fn config(payment: &str) -> Config {
		Config::from_str(&format!(
			r#"
[service]
id = "orderdesk-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[ledger]
primary = "memory"
[ledger.implementations.memory]

[payment]
primary = "mock"
{payment}

[notification]
primary = "log"
owner_email = "owner@example.com"
venmo_handle = "@shop"
zelle_address = "pay@example.com"
[notification.implementations.log]
"#
		))
		.unwrap()
	}

	#[tokio::test]
	async fn test_builds_from_registered_factories() {
		let desk = OrderDeskBuilder::new(config("[payment.implementations.mock]"))
			.build(factories())
			.unwrap();

		let request: OrderRequest = serde_json::from_value(serde_json::json!({
			"name": "Ada",
			"email": "ada@example.com",
			"phone": "555-0100",
			"items": {"shorts": {"M": 1}},
			"total": 40,
			"action": "create_stripe_session"
		}))
		.unwrap();
		let response = desk.handle(request).await.unwrap();
		assert_eq!(response.status, ResponseStatus::Success);
		assert!(response.session_id.unwrap().starts_with("cs_mock_"));
	}

	#[test]
	fn test_invalid_implementation_config_fails() {
		let result = OrderDeskBuilder::new(config(
			"[payment.implementations.mock]\ncheckout_url = \"not a url\"",
		))
		.build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[test]
	fn test_unknown_primary_is_missing() {
		let result = OrderDeskBuilder::new(config(
			"[payment.implementations.paypal]\n[payment.implementations.mock]",
		))
		.build(factories());
		assert!(result.is_ok());

		let mut cfg = config("[payment.implementations.mock]");
		cfg.payment.primary = "paypal".into();
		cfg.payment.implementations.clear();
		cfg.payment
			.implementations
			.insert("paypal".into(), toml::Value::Table(Default::default()));
		let result = OrderDeskBuilder::new(cfg).build(factories());
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}
}
