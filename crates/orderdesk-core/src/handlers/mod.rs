//! Handlers for the two order actions.

pub mod checkout;
pub mod record;

pub use checkout::{CheckoutError, CheckoutHandler};
pub use record::{NotificationOutcome, RecordError, RecordHandler, RecordOutcome};
