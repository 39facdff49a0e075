//! Request validation performed before any side effect.

use orderdesk_types::{OrderAction, OrderRequest};

/// Checks parsed order requests.
///
/// Identity and total are required for every action. Recording also needs
/// a complete shipping address and a payment method.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderValidator;

impl OrderValidator {
	pub fn new() -> Self {
		Self
	}

	/// Returns the first problem found, as a human-readable reason.
	pub fn validate(&self, request: &OrderRequest) -> Result<(), String> {
		for (field, value) in [
			("name", &request.name),
			("email", &request.email),
			("phone", &request.phone),
		] {
			if value.trim().is_empty() {
				return Err(format!("missing field '{}'", field));
			}
		}

		if !is_email(&request.email) {
			return Err(format!("invalid email '{}'", request.email));
		}

		if request.total.is_sign_negative() && !request.total.is_zero() {
			return Err(format!("total cannot be negative: {}", request.total));
		}

		if request.action() == OrderAction::RecordOrder {
			if let Some(field) = request.address.first_missing() {
				return Err(format!("missing field '{}'", field));
			}
			match &request.payment {
				Some(method) if !method.as_str().trim().is_empty() => {},
				_ => return Err("missing field 'payment'".to_string()),
			}
		}

		Ok(())
	}
}

fn is_email(value: &str) -> bool {
	match value.trim().split_once('@') {
		Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
		None => false,
	}
}
