//! Utility functions for rendering order data.
//!
//! This module provides the string formatting shared by the checkout flow,
//! the ledger and the notification emails.

pub mod formatting;

pub use formatting::{checkout_description, record_summary, truncate_id};
