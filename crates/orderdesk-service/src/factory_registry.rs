//! Factory registry for the pluggable backends.
//!
//! Collects the factories every backend crate exposes so that the engine can
//! be built from whatever implementation names the configuration lists.

use orderdesk_config::Config;
use orderdesk_core::{OrderDesk, OrderDeskBuilder, OrderDeskFactories};
use orderdesk_ledger::LedgerFactory;
use orderdesk_notify::EmailFactory;
use orderdesk_payment::PaymentFactory;
use orderdesk_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// All known implementation factories, by component.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub ledger: HashMap<String, LedgerFactory>,
	pub payment: HashMap<String, PaymentFactory>,
	pub email: HashMap<String, EmailFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			ledger: HashMap::new(),
			payment: HashMap::new(),
			email: HashMap::new(),
		}
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in orderdesk_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.storage.insert(name.to_string(), factory);
		}
		for (name, factory) in orderdesk_ledger::get_all_implementations() {
			tracing::debug!("Registering ledger implementation: {}", name);
			registry.ledger.insert(name.to_string(), factory);
		}
		for (name, factory) in orderdesk_payment::get_all_implementations() {
			tracing::debug!("Registering payment implementation: {}", name);
			registry.payment.insert(name.to_string(), factory);
		}
		for (name, factory) in orderdesk_notify::get_all_implementations() {
			tracing::debug!("Registering email implementation: {}", name);
			registry.email.insert(name.to_string(), factory);
		}

		registry
	})
}

/// Picks the factories for the implementations named in one section.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the engine from `config` using the registered factories.
pub fn build_desk_from_config(config: Config) -> Result<OrderDesk, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let ledger_factories =
		build_factories!(registry, config.ledger.implementations, ledger, "ledger");
	let payment_factories =
		build_factories!(registry, config.payment.implementations, payment, "payment");
	let email_factories = build_factories!(
		registry,
		config.notification.implementations,
		email,
		"notification"
	);

	let factories = OrderDeskFactories {
		storage_factories,
		ledger_factories,
		payment_factories,
		email_factories,
	};

	Ok(OrderDeskBuilder::new(config).build(factories)?)
}
