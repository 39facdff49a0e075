//! Composition of the transactional emails.
//!
//! Two messages exist: the new-order notice to the shop owner and, for
//! orders paid outside the site, payment instructions to the customer.

use orderdesk_config::NotificationConfig;
use orderdesk_types::{EmailMessage, OrderRecord, OrderRequest, PaymentMethod};

/// Addresses, names and wording used when composing emails.
#[derive(Debug, Clone)]
pub struct EmailSettings {
	pub owner_email: String,
	pub sender_name: String,
	pub customer_sender_name: String,
	pub reply_to: Option<String>,
	pub instructions_subject: String,
	pub venmo_handle: String,
	pub zelle_address: String,
	pub instagram: Option<String>,
	pub contact_email: Option<String>,
	pub signature: String,
	pub brand: String,
	pub charity: String,
}

impl From<&NotificationConfig> for EmailSettings {
	fn from(config: &NotificationConfig) -> Self {
		Self {
			owner_email: config.owner_email.clone(),
			sender_name: config.sender_name.clone(),
			customer_sender_name: config.customer_sender_name.clone(),
			reply_to: config.reply_to.clone(),
			instructions_subject: config.instructions_subject.clone(),
			venmo_handle: config.venmo_handle.clone(),
			zelle_address: config.zelle_address.clone(),
			instagram: config.instagram.clone(),
			contact_email: config.contact_email.clone(),
			signature: config.signature.clone(),
			brand: config.brand.clone(),
			charity: config.charity.clone(),
		}
	}
}

/// Note the customer must attach to a Venmo or Zelle payment.
pub fn payment_memo(name: &str) -> String {
	format!("{} - Rashguard Order", name)
}

/// Builds email messages from an order.
#[derive(Debug, Clone)]
pub struct EmailComposer {
	settings: EmailSettings,
}

impl EmailComposer {
	pub fn new(settings: EmailSettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &EmailSettings {
		&self.settings
	}

	/// New-order notice for the shop owner.
	pub fn owner_notification(&self, request: &OrderRequest, record: &OrderRecord) -> EmailMessage {
		let total = record.total_display();
		let handle = request
			.handle
			.as_deref()
			.filter(|h| !h.is_empty())
			.unwrap_or("N/A");
		let closing = match &request.payment {
			Some(PaymentMethod::Stripe) => {
				"✅ Customer paid via Stripe - Check your Stripe dashboard".to_string()
			},
			_ => format!("⏳ Waiting for {} payment", request.payment_label()),
		};

		let body = format!(
			"You have received a new order!\n\n\
			ORDER DETAILS:\n\
			--------------\n\
			Customer: {name}\n\
			Email: {email}\n\
			Phone: {phone}\n\
			IG Handle: {handle}\n\n\
			{items}\n\n\
			PAYMENT:\n\
			--------\n\
			Payment Method: {method}\n\
			Total: {total}\n\
			Donation (15%): {donation}\n\
			Payment Status: {status}\n\n\
			{address}\n\n\
			{closing}\n\n\
			---\n\
			View all orders in the order ledger.\n",
			name = request.name,
			email = request.email,
			phone = request.phone,
			items = items_block("ITEMS ORDERED:", record),
			method = request.payment_label(),
			donation = record.donation_display(),
			status = record.payment_status,
			address = address_block(record),
		);

		EmailMessage {
			to: self.settings.owner_email.clone(),
			subject: format!("🎉 New Order: {} - {}", request.name, total),
			body,
			sender_name: self.settings.sender_name.clone(),
			reply_to: None,
		}
	}

	/// Payment instructions for the customer.
	///
	/// Shows Venmo or Zelle alone when that method was chosen, and both
	/// options for any other or missing method.
	pub fn payment_instructions(
		&self,
		request: &OrderRequest,
		record: &OrderRecord,
	) -> EmailMessage {
		let s = &self.settings;
		let total = record.total_display();

		let body = format!(
			"Hi {name},\n\n\
			Thank you for your order! Here are the details:\n\n\
			{items}\n\n\
			Total: {total}\n\
			Donation to {charity} (15%): {donation} (included)\n\n\
			{address}\n\n\
			{instructions}\n\
			Once payment is received, we'll process your order and send you a shipping confirmation.\n\
			{contact}\n\
			Thank you for supporting us and {charity}!\n\n\
			Yours sincerely,\n\
			{signature}\n\
			{brand}\n",
			name = request.name,
			items = items_block("ORDER SUMMARY:", record),
			charity = s.charity,
			donation = record.donation_display(),
			address = address_block(record),
			instructions = self.instruction_block(request.payment.as_ref(), &request.name, &total),
			contact = self.contact_block(),
			signature = s.signature,
			brand = s.brand,
		);

		EmailMessage {
			to: request.email.clone(),
			subject: s.instructions_subject.clone(),
			body,
			sender_name: s.customer_sender_name.clone(),
			reply_to: s.reply_to.clone(),
		}
	}

	/// The method-specific instruction block.
	pub fn instruction_block(
		&self,
		method: Option<&PaymentMethod>,
		name: &str,
		total: &str,
	) -> String {
		let s = &self.settings;
		let memo = payment_memo(name);
		let venmo = format!(
			"• Send {} to {}\n• In the note, include: \"{}\"\n",
			total, s.venmo_handle, memo
		);
		let zelle = format!(
			"• Send {} to {}\n• In the memo, include: \"{}\"\n",
			total, s.zelle_address, memo
		);

		match method {
			Some(PaymentMethod::Venmo) => format!(
				"VENMO PAYMENT INSTRUCTIONS:\n---------------------------\n{}",
				venmo
			),
			Some(PaymentMethod::Zelle) => format!(
				"ZELLE PAYMENT INSTRUCTIONS:\n---------------------------\n{}",
				zelle
			),
			_ => format!(
				"PAYMENT INSTRUCTIONS:\n---------------------\n\nOption 1: Venmo\n{}\nOption 2: Zelle\n{}",
				venmo, zelle
			),
		}
	}

	/// Contact lines, empty when no channel is configured.
	fn contact_block(&self) -> String {
		let s = &self.settings;
		if s.instagram.is_none() && s.contact_email.is_none() {
			return String::new();
		}
		let instagram = s
			.instagram
			.as_ref()
			.map(|ig| format!("• Instagram: {}\n", ig))
			.unwrap_or_default();
		let email = s
			.contact_email
			.as_ref()
			.map(|email| format!("• Email: {}\n", email))
			.unwrap_or_default();
		format!("\nQuestions? Contact us:\n{}{}", instagram, email)
	}
}

fn items_block(title: &str, record: &OrderRecord) -> String {
	format!(
		"{title}\n{rule}\nRashguard: {}\nShorts: {}",
		record.rashguard_orders,
		record.shorts_orders,
		rule = "-".repeat(title.chars().count()),
	)
}

fn address_block(record: &OrderRecord) -> String {
	format!(
		"SHIPPING ADDRESS:\n-----------------\n{}\n{}, {} {}\n{}",
		record.street, record.city, record.state, record.zipcode, record.country
	)
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) fn settings() -> EmailSettings {
		EmailSettings {
			owner_email: "owner@example.com".into(),
			sender_name: "Rashguard Order System".into(),
			customer_sender_name: "Shop Team - All Heart All In".into(),
			reply_to: Some("owner@example.com".into()),
			instructions_subject: "All Heart All In - Payment Instructions for Your Order".into(),
			venmo_handle: "@shop-venmo".into(),
			zelle_address: "pay@example.com".into(),
			instagram: Some("@shop.ig".into()),
			contact_email: None,
			signature: "Shop Team".into(),
			brand: "All Heart All In ❤️".into(),
			charity: "Tap Cancer Out".into(),
		}
	}

	fn order(payment: Option<&str>) -> (OrderRequest, OrderRecord) {
		let mut value = serde_json::json!({
			"name": "Ada",
			"email": "ada@example.com",
			"phone": "555-0100",
			"street": "1 Main St",
			"city": "Springfield",
			"state": "IL",
			"zipcode": "62701",
			"country": "USA",
			"items": {"rashguard": {"M": 2, "S": 0}},
			"total": 120
		});
		if let Some(method) = payment {
			value["payment"] = serde_json::Value::from(method);
		}
		let request: OrderRequest = serde_json::from_value(value).unwrap();
		let record = OrderRecord::from_request(&request, Default::default());
		(request, record)
	}

	fn composer() -> EmailComposer {
		EmailComposer::new(settings())
	}

	#[test]
	fn test_owner_notification_subject_and_recipient() {
		let (request, record) = order(Some("Venmo"));
		let message = composer().owner_notification(&request, &record);

		assert_eq!(message.subject, "🎉 New Order: Ada - $120");
		assert_eq!(message.to, "owner@example.com");
		assert_eq!(message.sender_name, "Rashguard Order System");
		assert!(message.body.contains("IG Handle: N/A"));
		assert!(message.body.contains("Rashguard: M x2, S x0"));
		assert!(message.body.contains("Shorts: None"));
		assert!(message.body.contains("Donation (15%): $18.00"));
		assert!(message.body.contains("Payment Status: Pending"));
		assert!(message.body.contains("Springfield, IL 62701"));
		assert!(message.body.contains("⏳ Waiting for Venmo payment"));
	}

	#[test]
	fn test_owner_notification_layout() {
		let (request, record) = order(Some("Venmo"));
		let body = composer().owner_notification(&request, &record).body;
		assert_eq!(
			body,
			"You have received a new order!\n\n\
			ORDER DETAILS:\n--------------\n\
			Customer: Ada\nEmail: ada@example.com\nPhone: 555-0100\nIG Handle: N/A\n\n\
			ITEMS ORDERED:\n--------------\nRashguard: M x2, S x0\nShorts: None\n\n\
			PAYMENT:\n--------\nPayment Method: Venmo\nTotal: $120\n\
			Donation (15%): $18.00\nPayment Status: Pending\n\n\
			SHIPPING ADDRESS:\n-----------------\n1 Main St\nSpringfield, IL 62701\nUSA\n\n\
			⏳ Waiting for Venmo payment\n\n---\nView all orders in the order ledger.\n"
		);
	}

	#[test]
	fn test_payment_instructions_layout() {
		let (request, record) = order(Some("Venmo"));
		let body = composer().payment_instructions(&request, &record).body;
		assert!(body.starts_with(
			"Hi Ada,\n\nThank you for your order! Here are the details:\n\n\
			ORDER SUMMARY:\n--------------\nRashguard: M x2, S x0\nShorts: None\n\n\
			Total: $120\n"
		));
		assert!(body.contains("(included)\n\nSHIPPING ADDRESS:\n"));
		assert!(body.contains("USA\n\nVENMO PAYMENT INSTRUCTIONS:\n"));
		assert!(body.contains("Rashguard Order\"\n\nOnce payment is received"));
		assert!(body.ends_with(
			"shipping confirmation.\n\n\
			Questions? Contact us:\n• Instagram: @shop.ig\n\n\
			Thank you for supporting us and Tap Cancer Out!\n\n\
			Yours sincerely,\nShop Team\nAll Heart All In ❤️\n"
		));
	}

	#[test]
	fn test_owner_notification_stripe_line() {
		let (request, record) = order(Some("Stripe"));
		let message = composer().owner_notification(&request, &record);
		assert!(message
			.body
			.contains("✅ Customer paid via Stripe - Check your Stripe dashboard"));
		assert!(!message.body.contains("Waiting for"));
	}

	#[test]
	fn test_venmo_only_instructions() {
		let (request, record) = order(Some("Venmo"));
		let message = composer().payment_instructions(&request, &record);

		assert_eq!(message.to, "ada@example.com");
		assert_eq!(message.reply_to.as_deref(), Some("owner@example.com"));
		assert_eq!(message.sender_name, "Shop Team - All Heart All In");
		assert!(message.body.contains("VENMO PAYMENT INSTRUCTIONS:"));
		assert!(message.body.contains("• Send $120 to @shop-venmo"));
		assert!(message
			.body
			.contains("• In the note, include: \"Ada - Rashguard Order\""));
		assert!(!message.body.contains("pay@example.com"));
		assert!(message
			.body
			.contains("Donation to Tap Cancer Out (15%): $18.00 (included)"));
	}

	#[test]
	fn test_zelle_only_instructions() {
		let (request, record) = order(Some("Zelle"));
		let body = composer().payment_instructions(&request, &record).body;
		assert!(body.contains("ZELLE PAYMENT INSTRUCTIONS:"));
		assert!(body.contains("• Send $120 to pay@example.com"));
		assert!(body.contains("• In the memo, include: \"Ada - Rashguard Order\""));
		assert!(!body.contains("@shop-venmo"));
	}

	#[test]
	fn test_unknown_or_missing_method_shows_both_options() {
		let composer = composer();
		for method in [None, Some(PaymentMethod::Other("Cash".into()))] {
			let block = composer.instruction_block(method.as_ref(), "Ada", "$120");
			assert!(block.starts_with("PAYMENT INSTRUCTIONS:"));
			assert!(block.contains("Option 1: Venmo\n• Send $120 to @shop-venmo"));
			assert!(block.contains("Option 2: Zelle\n• Send $120 to pay@example.com"));
		}

		let (request, record) = order(None);
		let body = composer.payment_instructions(&request, &record).body;
		assert!(body.contains("Option 1: Venmo"));
		assert!(body.contains("Option 2: Zelle"));
	}

	#[test]
	fn test_contact_block_lists_configured_channels() {
		let (request, record) = order(Some("Venmo"));
		let body = composer().payment_instructions(&request, &record).body;
		assert!(body.contains("Questions? Contact us:\n• Instagram: @shop.ig\n"));
		assert!(!body.contains("• Email:"));

		let mut bare = settings();
		bare.instagram = None;
		let body = EmailComposer::new(bare)
			.payment_instructions(&request, &record)
			.body;
		assert!(!body.contains("Questions?"));
	}
}
