//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every backend module (storage, ledger, payment, notification) exposes a
/// `Registry` struct implementing this trait, tying the name used under
/// `<section>.implementations.<name>` in the configuration to its factory.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
