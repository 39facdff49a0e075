//! Order engine that dispatches form submissions.
//!
//! [`OrderDesk`] owns the configured services and routes each request to
//! checkout creation or order recording based on its `action` field. Every
//! failure surfaces as an [`EngineError`] whose message is what the caller
//! sees.

use crate::email::{EmailComposer, EmailSettings};
use crate::handlers::{
	CheckoutError, CheckoutHandler, RecordError, RecordHandler, RecordOutcome,
};
use crate::validation::OrderValidator;
use orderdesk_config::Config;
use orderdesk_ledger::LedgerService;
use orderdesk_notify::NotificationService;
use orderdesk_payment::PaymentService;
use orderdesk_storage::StorageService;
use orderdesk_types::{truncate_id, APIError, ApiResponse, CheckoutSession, OrderAction, OrderRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Errors that can occur while handling an order request.
///
/// The display text of each variant is the `message` returned to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Invalid order request: {0}")]
	Validation(String),
	#[error("{0}")]
	Configuration(String),
	/// The payment provider answered with an error.
	#[error("Stripe API error: {0}")]
	Upstream(String),
	#[error("Error creating checkout session: {0}")]
	Checkout(String),
	#[error("Failed to record order: {0}")]
	Ledger(String),
}

impl EngineError {
	/// HTTP status this error is reported with.
	pub fn status_code(&self) -> u16 {
		match self {
			EngineError::Validation(_) => 400,
			EngineError::Configuration(_) | EngineError::Ledger(_) => 500,
			EngineError::Upstream(_) | EngineError::Checkout(_) => 502,
		}
	}
}

impl From<EngineError> for APIError {
	fn from(err: EngineError) -> Self {
		let message = err.to_string();
		match err.status_code() {
			400 => APIError::BadRequest { message },
			502 => APIError::BadGateway { message },
			_ => APIError::InternalServerError { message },
		}
	}
}

impl From<CheckoutError> for EngineError {
	fn from(err: CheckoutError) -> Self {
		match err {
			CheckoutError::NotConfigured => {
				EngineError::Configuration("Stripe API key not configured".to_string())
			},
			CheckoutError::Provider(message) => EngineError::Upstream(message),
			CheckoutError::Failed(message) => EngineError::Checkout(message),
		}
	}
}

impl From<RecordError> for EngineError {
	fn from(err: RecordError) -> Self {
		match err {
			RecordError::Ledger(message) => EngineError::Ledger(message),
		}
	}
}

/// Order engine shared by every request.
#[derive(Clone)]
pub struct OrderDesk {
	config: Arc<Config>,
	storage: Arc<StorageService>,
	validator: OrderValidator,
	checkout_handler: Arc<CheckoutHandler>,
	record_handler: Arc<RecordHandler>,
}

impl OrderDesk {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		ledger: Arc<LedgerService>,
		payment: Arc<PaymentService>,
		notifications: Arc<NotificationService>,
	) -> Self {
		let composer = EmailComposer::new(EmailSettings::from(&config.notification));
		let checkout_handler = Arc::new(CheckoutHandler::new(payment, storage.clone()));
		let record_handler = Arc::new(RecordHandler::new(ledger, notifications, composer));

		Self {
			config: Arc::new(config),
			storage,
			validator: OrderValidator::new(),
			checkout_handler,
			record_handler,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Parses a raw request body.
	pub fn parse_request(&self, body: &str) -> Result<OrderRequest, EngineError> {
		serde_json::from_str(body).map_err(|e| EngineError::Validation(e.to_string()))
	}

	/// Validates `request` and runs the action it names.
	#[instrument(skip_all, fields(action = %request.action()))]
	pub async fn handle(&self, request: OrderRequest) -> Result<ApiResponse, EngineError> {
		self.validator
			.validate(&request)
			.map_err(EngineError::Validation)?;

		match request.action() {
			OrderAction::CreateCheckoutSession => {
				let session = self.create_checkout_session(&request).await?;
				Ok(ApiResponse::checkout_created(session.id, session.url))
			},
			OrderAction::RecordOrder => {
				self.record_order(&request).await?;
				Ok(ApiResponse::recorded())
			},
		}
	}

	/// Creates a hosted checkout session and caches the order under its id.
	pub async fn create_checkout_session(
		&self,
		request: &OrderRequest,
	) -> Result<CheckoutSession, EngineError> {
		match self.checkout_handler.handle(request).await {
			Ok(session) => {
				tracing::info!(session_id = %truncate_id(&session.id), "Checkout session created");
				Ok(session)
			},
			Err(e) => {
				let err = EngineError::from(e);
				tracing::warn!(error = %err, "Checkout session not created");
				Err(err)
			},
		}
	}

	/// Appends the order to the ledger and sends the follow-up emails.
	pub async fn record_order(&self, request: &OrderRequest) -> Result<RecordOutcome, EngineError> {
		let outcome = self.record_handler.handle(request).await.map_err(|e| {
			let err = EngineError::from(e);
			tracing::error!(error = %err, "Order not recorded");
			err
		})?;

		let failed = outcome.failed_notifications().count();
		if failed > 0 {
			tracing::warn!(
				failed,
				attempted = outcome.notifications.len(),
				"Order recorded with undelivered notifications"
			);
		} else {
			tracing::info!(
				header_written = outcome.header_written,
				notifications = outcome.notifications.len(),
				"Order recorded"
			);
		}
		Ok(outcome)
	}

	/// Starts the periodic cache cleanup task.
	pub fn spawn_cleanup(&self) -> JoinHandle<()> {
		let storage = self.storage.clone();
		let mut interval = tokio::time::interval(Duration::from_secs(
			self.config.storage.cleanup_interval_seconds,
		));
		tokio::spawn(async move {
			loop {
				interval.tick().await;
				match storage.cleanup_expired().await {
					Ok(count) if count > 0 => {
						tracing::debug!("Storage cleanup: removed {} expired entries", count);
					},
					Err(e) => {
						tracing::warn!("Storage cleanup failed: {}", e);
					},
					_ => {},
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use orderdesk_ledger::implementations::memory::MemoryLedger;
	use orderdesk_ledger::{LedgerError, LedgerInterface};
	use orderdesk_notify::{EmailInterface, NotifyError};
	use orderdesk_payment::implementations::mock::MockPayment;
	use orderdesk_payment::{PaymentError, PaymentInterface};
	use orderdesk_storage::implementations::memory::MemoryStorage;
	use orderdesk_storage::{StorageError, StorageInterface};
	use orderdesk_types::{
		CheckoutRequest, ConfigSchema, EmailMessage, NotificationKind, Schema, StorageKey,
		ValidationError,
	};
	use serde_json::json;
	use std::str::FromStr;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	const CONFIG: &str = r#"
[service]
id = "orderdesk-test"

[storage]
primary = "memory"
cleanup_interval_seconds = 60
[storage.implementations.memory]

[ledger]
primary = "memory"
[ledger.implementations.memory]

[payment]
primary = "mock"
[payment.implementations.mock]

[notification]
primary = "log"
owner_email = "owner@example.com"
venmo_handle = "@shop"
zelle_address = "pay@example.com"
[notification.implementations.log]
"#;

	struct EmptySchema;

	impl ConfigSchema for EmptySchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	/// Storage that counts writes.
	struct CountingStorage {
		inner: MemoryStorage,
		writes: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl StorageInterface for CountingStorage {
		async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
			self.inner.get_bytes(key).await
		}

		async fn set_bytes(
			&self,
			key: &str,
			value: Vec<u8>,
			ttl: Option<Duration>,
		) -> Result<(), StorageError> {
			self.writes.fetch_add(1, Ordering::SeqCst);
			self.inner.set_bytes(key, value, ttl).await
		}

		async fn delete(&self, key: &str) -> Result<(), StorageError> {
			self.inner.delete(key).await
		}

		async fn exists(&self, key: &str) -> Result<bool, StorageError> {
			self.inner.exists(key).await
		}

		async fn cleanup_expired(&self) -> Result<usize, StorageError> {
			self.inner.cleanup_expired().await
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}
	}

	/// Email backend that keeps sent messages, or fails every send.
	struct Outbox {
		sent: Arc<Mutex<Vec<EmailMessage>>>,
		fail: bool,
	}

	#[async_trait]
	impl EmailInterface for Outbox {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
			if self.fail {
				return Err(NotifyError::Network("connection refused".into()));
			}
			self.sent.lock().unwrap().push(message.clone());
			Ok(())
		}
	}

	/// Payment backend that fails with a fixed error.
	struct FailingPayment(fn() -> PaymentError);

	#[async_trait]
	impl PaymentInterface for FailingPayment {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn create_session(
			&self,
			_request: &CheckoutRequest,
		) -> Result<CheckoutSession, PaymentError> {
			Err((self.0)())
		}
	}

	/// Payment backend that remembers the last request.
	struct CapturingPayment(Arc<Mutex<Option<CheckoutRequest>>>);

	#[async_trait]
	impl PaymentInterface for CapturingPayment {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn create_session(
			&self,
			request: &CheckoutRequest,
		) -> Result<CheckoutSession, PaymentError> {
			*self.0.lock().unwrap() = Some(request.clone());
			Ok(CheckoutSession {
				id: "cs_test_1".into(),
				url: "https://checkout.example/cs_test_1".into(),
			})
		}
	}

	struct BrokenLedger;

	#[async_trait]
	impl LedgerInterface for BrokenLedger {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn row_count(&self) -> Result<usize, LedgerError> {
			Ok(1)
		}

		async fn append_row(&self, _row: &[String]) -> Result<(), LedgerError> {
			Err(LedgerError::Backend("sheet is read-only".into()))
		}
	}

	struct Harness {
		desk: OrderDesk,
		rows: Arc<tokio::sync::Mutex<Vec<Vec<String>>>>,
		sent: Arc<Mutex<Vec<EmailMessage>>>,
		writes: Arc<AtomicUsize>,
		storage: Arc<StorageService>,
	}

	fn harness_with(
		payment: Box<dyn PaymentInterface>,
		ledger: Option<Box<dyn LedgerInterface>>,
		email_fails: bool,
	) -> Harness {
		let config = Config::from_str(CONFIG).unwrap();
		let memory_ledger = MemoryLedger::new();
		let rows = memory_ledger.rows_handle();
		let ledger = ledger.unwrap_or_else(|| Box::new(memory_ledger));
		let sent = Arc::new(Mutex::new(Vec::new()));
		let writes = Arc::new(AtomicUsize::new(0));
		let storage = Arc::new(StorageService::new(Box::new(CountingStorage {
			inner: MemoryStorage::default(),
			writes: writes.clone(),
		})));

		let desk = OrderDesk::new(
			config,
			storage.clone(),
			Arc::new(LedgerService::new(ledger)),
			Arc::new(PaymentService::new(payment)),
			Arc::new(NotificationService::new(Box::new(Outbox {
				sent: sent.clone(),
				fail: email_fails,
			}))),
		);

		Harness {
			desk,
			rows,
			sent,
			writes,
			storage,
		}
	}

	fn harness() -> Harness {
		harness_with(
			Box::new(MockPayment::new("https://pay.local", None)),
			None,
			false,
		)
	}

	fn order(payment: &str, action: Option<&str>) -> OrderRequest {
		let mut value = json!({
			"name": "Ada",
			"email": "ada@example.com",
			"phone": "555-0100",
			"payment": payment,
			"street": "1 Main St",
			"city": "Springfield",
			"state": "IL",
			"zipcode": "62701",
			"country": "USA",
			"items": {"rashguard": {"M": 1, "S": 0}, "shorts": {"L": 0}},
			"total": 45.5
		});
		if let Some(action) = action {
			value["action"] = json!(action);
		}
		serde_json::from_value(value).unwrap()
	}

	#[tokio::test]
	async fn test_missing_action_records_order() {
		let h = harness();
		let response = h.desk.handle(order("Venmo", None)).await.unwrap();

		assert_eq!(response, ApiResponse::recorded());
		let rows = h.rows.lock().await;
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0][0], "Timestamp");
		assert_eq!(rows[1][11], "M x1, S x0");
		assert_eq!(rows[1][12], "L x0");
		assert_eq!(rows[1][13], "$45.5");
		assert_eq!(rows[1][14], "$6.83");
	}

	#[tokio::test]
	async fn test_unknown_action_records_order() {
		let h = harness();
		let response = h.desk.handle(order("Zelle", Some("refund"))).await.unwrap();
		assert!(response.is_success());
		assert_eq!(h.rows.lock().await.len(), 2);
	}

	#[tokio::test]
	async fn test_header_written_once_across_orders() {
		let h = harness();
		for _ in 0..3 {
			h.desk.handle(order("Stripe", Some("record_order"))).await.unwrap();
		}
		let rows = h.rows.lock().await;
		assert_eq!(rows.len(), 4);
		assert_eq!(rows.iter().filter(|r| r[0] == "Timestamp").count(), 1);
	}

	#[tokio::test]
	async fn test_instruction_email_only_for_venmo_and_zelle() {
		let h = harness();

		let outcome = h.desk.record_order(&order("Stripe", None)).await.unwrap();
		let kinds: Vec<_> = outcome.notifications.iter().map(|n| n.kind).collect();
		assert_eq!(kinds, vec![NotificationKind::OwnerNotification]);

		let outcome = h.desk.record_order(&order("Zelle", None)).await.unwrap();
		let kinds: Vec<_> = outcome.notifications.iter().map(|n| n.kind).collect();
		assert_eq!(
			kinds,
			vec![
				NotificationKind::OwnerNotification,
				NotificationKind::PaymentInstructions
			]
		);

		let sent = h.sent.lock().unwrap();
		assert_eq!(sent.len(), 3);
		assert_eq!(sent[0].to, "owner@example.com");
		assert_eq!(sent[2].to, "ada@example.com");
		assert!(sent[2].body.contains("ZELLE PAYMENT INSTRUCTIONS:"));
	}

	#[tokio::test]
	async fn test_email_failure_still_succeeds() {
		let h = harness_with(
			Box::new(MockPayment::new("https://pay.local", None)),
			None,
			true,
		);

		let outcome = h.desk.record_order(&order("Venmo", None)).await.unwrap();
		assert_eq!(outcome.notifications.len(), 2);
		assert_eq!(outcome.failed_notifications().count(), 2);

		let response = h.desk.handle(order("Venmo", None)).await.unwrap();
		assert_eq!(response, ApiResponse::recorded());
		assert_eq!(h.rows.lock().await.len(), 3);
	}

	#[tokio::test]
	async fn test_ledger_failure_is_reported_without_emails() {
		let h = harness_with(
			Box::new(MockPayment::new("https://pay.local", None)),
			Some(Box::new(BrokenLedger)),
			false,
		);

		let err = h.desk.handle(order("Venmo", None)).await.unwrap_err();
		assert!(matches!(err, EngineError::Ledger(_)));
		assert_eq!(
			err.to_string(),
			"Failed to record order: Backend error: sheet is read-only"
		);
		assert_eq!(err.status_code(), 500);
		assert!(h.sent.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_checkout_caches_order_under_session_id() {
		let captured = Arc::new(Mutex::new(None));
		let h = harness_with(Box::new(CapturingPayment(captured.clone())), None, false);

		let request = order("Stripe", Some("create_stripe_session"));
		let response = h.desk.handle(request.clone()).await.unwrap();

		assert_eq!(
			response,
			ApiResponse::checkout_created("cs_test_1", "https://checkout.example/cs_test_1")
		);
		let sent = captured.lock().unwrap().clone().unwrap();
		assert_eq!(sent.amount_minor, 4550);
		assert_eq!(sent.description, "Rashguard M x1");
		assert_eq!(sent.customer_phone, "555-0100");

		let cached: OrderRequest = h
			.storage
			.retrieve(StorageKey::CheckoutSessions.as_str(), "cs_test_1")
			.await
			.unwrap();
		assert_eq!(cached, request);
		assert!(h.rows.lock().await.is_empty());
	}

	#[tokio::test]
	async fn test_provider_error_skips_cache() {
		let h = harness_with(
			Box::new(MockPayment::new(
				"https://pay.local",
				Some("Invalid API Key provided".into()),
			)),
			None,
			false,
		);

		let err = h
			.desk
			.handle(order("Stripe", Some("create_stripe_session")))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Stripe API error: Invalid API Key provided");
		assert_eq!(err.status_code(), 502);
		assert_eq!(h.writes.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_unconfigured_key_message() {
		let h = harness_with(
			Box::new(FailingPayment(|| PaymentError::NotConfigured)),
			None,
			false,
		);

		let err = h
			.desk
			.handle(order("Stripe", Some("create_stripe_session")))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Stripe API key not configured");
		assert_eq!(
			APIError::from(err).to_response(),
			ApiResponse::error("Stripe API key not configured")
		);
		assert_eq!(h.writes.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_network_failure_is_checkout_error() {
		let h = harness_with(
			Box::new(FailingPayment(|| PaymentError::Network("timed out".into()))),
			None,
			false,
		);

		let err = h
			.desk
			.handle(order("Stripe", Some("create_stripe_session")))
			.await
			.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Error creating checkout session: Network error: timed out"
		);
	}

	#[tokio::test]
	async fn test_invalid_request_rejected_before_side_effects() {
		let h = harness();
		let mut request = order("Venmo", None);
		request.address.street.clear();

		let err = h.desk.handle(request).await.unwrap_err();
		assert_eq!(err.to_string(), "Invalid order request: missing field 'street'");
		assert_eq!(err.status_code(), 400);
		assert!(h.rows.lock().await.is_empty());
		assert!(h.sent.lock().unwrap().is_empty());
	}

	#[test]
	fn test_malformed_body_is_validation_error() {
		let h = harness();
		let err = h.desk.parse_request("{not json").unwrap_err();
		assert!(matches!(err, EngineError::Validation(_)));
		assert!(matches!(
			APIError::from(err),
			APIError::BadRequest { .. }
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_task_runs() {
		let h = harness();
		h.storage
			.store_with_ttl("checkout_sessions", "old", &"x", Some(Duration::from_secs(5)))
			.await
			.unwrap();

		let handle = h.desk.spawn_cleanup();
		tokio::time::sleep(Duration::from_secs(61)).await;
		handle.abort();

		// The background pass at 60s already removed the entry.
		assert_eq!(h.storage.cleanup_expired().await.unwrap(), 0);
	}
}
