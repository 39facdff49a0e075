//! Core engine for the orderdesk system.
//!
//! Ties the storage, ledger, payment and notification services together
//! behind [`OrderDesk`], which validates each submission and runs either
//! checkout creation or order recording.

pub mod builder;
pub mod email;
pub mod engine;
pub mod handlers;
pub mod validation;

pub use builder::{BuilderError, OrderDeskBuilder, OrderDeskFactories};
pub use engine::{EngineError, OrderDesk};
pub use handlers::{NotificationOutcome, RecordOutcome};
