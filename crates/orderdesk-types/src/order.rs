//! Inbound order request types.
//!
//! The web form posts one JSON document per submission. These types describe
//! that document with explicit required and optional fields. The total is
//! coerced to a fixed-point decimal at the boundary, and free-text fields a
//! browser may send as numbers (phone, zipcode, handle) are kept as text.

use rust_decimal::Decimal;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Action discriminator carried in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
	/// Create a hosted checkout session with the payment provider.
	CreateCheckoutSession,
	/// Append the order to the ledger and send notifications.
	RecordOrder,
}

impl OrderAction {
	/// Wire name for checkout creation.
	pub const CREATE_CHECKOUT_SESSION: &'static str = "create_stripe_session";
	/// Wire name for order recording.
	pub const RECORD_ORDER: &'static str = "record_order";

	/// Resolves the action field. Absent or unknown values resolve to
	/// recording, which is what pre-checkout front-ends expect.
	pub fn from_field(action: Option<&str>) -> Self {
		match action {
			Some(Self::CREATE_CHECKOUT_SESSION) => Self::CreateCheckoutSession,
			_ => Self::RecordOrder,
		}
	}

	/// Returns the wire name of the action.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::CreateCheckoutSession => Self::CREATE_CHECKOUT_SESSION,
			Self::RecordOrder => Self::RECORD_ORDER,
		}
	}
}

impl fmt::Display for OrderAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// How the customer intends to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
	Stripe,
	Venmo,
	Zelle,
	/// Any value the form sent that is not one of the known methods.
	Other(String),
}

impl PaymentMethod {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Stripe => "Stripe",
			Self::Venmo => "Venmo",
			Self::Zelle => "Zelle",
			Self::Other(s) => s,
		}
	}

	/// Venmo and Zelle are settled outside the site, so the customer needs
	/// instructions by email.
	pub fn needs_instructions(&self) -> bool {
		matches!(self, Self::Venmo | Self::Zelle)
	}
}

impl From<&str> for PaymentMethod {
	fn from(s: &str) -> Self {
		match s {
			"Stripe" => Self::Stripe,
			"Venmo" => Self::Venmo,
			"Zelle" => Self::Zelle,
			other => Self::Other(other.to_string()),
		}
	}
}

impl fmt::Display for PaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for PaymentMethod {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for PaymentMethod {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(PaymentMethod::from(s.as_str()))
	}
}

/// Size to quantity mapping for one garment category.
///
/// Entries keep the order in which the form listed them, which is the order
/// they appear in summaries and in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeQuantities(Vec<(String, u32)>);

impl SizeQuantities {
	pub fn new(entries: Vec<(String, u32)>) -> Self {
		Self(entries)
	}

	pub fn entries(&self) -> &[(String, u32)] {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Entries with a positive quantity.
	pub fn positive(&self) -> impl Iterator<Item = (&str, u32)> {
		self.0
			.iter()
			.filter(|(_, qty)| *qty > 0)
			.map(|(size, qty)| (size.as_str(), *qty))
	}
}

impl<S: Into<String>> FromIterator<(S, u32)> for SizeQuantities {
	fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(s, q)| (s.into(), q)).collect())
	}
}

impl Serialize for SizeQuantities {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		use serde::ser::SerializeMap;
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (size, qty) in &self.0 {
			map.serialize_entry(size, qty)?;
		}
		map.end()
	}
}

impl<'de> Deserialize<'de> for SizeQuantities {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct SizeQuantitiesVisitor;

		impl<'de> Visitor<'de> for SizeQuantitiesVisitor {
			type Value = SizeQuantities;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a map of size to non-negative quantity")
			}

			fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
				Ok(SizeQuantities::default())
			}

			fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
				Ok(SizeQuantities::default())
			}

			fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
				while let Some((size, qty)) = access.next_entry::<String, u32>()? {
					entries.push((size, qty));
				}
				Ok(SizeQuantities(entries))
			}
		}

		deserializer.deserialize_any(SizeQuantitiesVisitor)
	}
}

/// Items selected on the form, one mapping per garment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItems {
	#[serde(default)]
	pub rashguard: SizeQuantities,
	#[serde(default)]
	pub shorts: SizeQuantities,
}

impl OrderItems {
	/// Garment categories in display order, paired with their label.
	pub fn categories(&self) -> [(ItemCategory, &SizeQuantities); 2] {
		[
			(ItemCategory::Rashguard, &self.rashguard),
			(ItemCategory::Shorts, &self.shorts),
		]
	}
}

/// Garment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
	Rashguard,
	Shorts,
}

impl ItemCategory {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Rashguard => "Rashguard",
			Self::Shorts => "Shorts",
		}
	}
}

/// Accepts a string, a number or null for a text field.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	struct TextVisitor;

	impl<'de> Visitor<'de> for TextVisitor {
		type Value = String;

		fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
			f.write_str("a string or a number")
		}

		fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
			Ok(v.to_string())
		}

		fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
			Ok(v)
		}

		fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
			Ok(v.to_string())
		}

		fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
			Ok(v.to_string())
		}

		fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
			Ok(v.to_string())
		}

		fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
			Ok(String::new())
		}

		fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
			Ok(String::new())
		}
	}

	deserializer.deserialize_any(TextVisitor)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	string_or_number(deserializer).map(|text| Some(text).filter(|t| !t.is_empty()))
}

/// Shipping address fields. Only order recording requires them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
	#[serde(default)]
	pub street: String,
	#[serde(default)]
	pub city: String,
	#[serde(default)]
	pub state: String,
	#[serde(default, deserialize_with = "string_or_number")]
	pub zipcode: String,
	#[serde(default)]
	pub country: String,
}

impl ShippingAddress {
	/// Returns the name of the first empty field, if any.
	pub fn first_missing(&self) -> Option<&'static str> {
		[
			("street", &self.street),
			("city", &self.city),
			("state", &self.state),
			("zipcode", &self.zipcode),
			("country", &self.country),
		]
		.into_iter()
		.find(|(_, value)| value.trim().is_empty())
		.map(|(name, _)| name)
	}
}

/// One web-form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
	pub name: String,
	pub email: String,
	#[serde(default, deserialize_with = "string_or_number")]
	pub phone: String,
	#[serde(
		default,
		deserialize_with = "optional_string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentMethod>,
	#[serde(flatten)]
	pub address: ShippingAddress,
	#[serde(default)]
	pub items: OrderItems,
	pub total: Decimal,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
}

impl OrderRequest {
	/// Default value recorded when the form did not report a payment status.
	pub const DEFAULT_PAYMENT_STATUS: &'static str = "Pending";

	pub fn action(&self) -> OrderAction {
		OrderAction::from_field(self.action.as_deref())
	}

	/// Payment method as written in the ledger and emails.
	pub fn payment_label(&self) -> &str {
		self.payment.as_ref().map(|p| p.as_str()).unwrap_or("")
	}

	pub fn payment_status(&self) -> &str {
		self.payment_status
			.as_deref()
			.filter(|s| !s.is_empty())
			.unwrap_or(Self::DEFAULT_PAYMENT_STATUS)
	}

	pub fn handle(&self) -> &str {
		self.handle.as_deref().unwrap_or("")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn sample_json() -> &'static str {
		r#"{
			"name": "Ada",
			"email": "ada@example.com",
			"phone": "555-0100",
			"handle": "@ada",
			"payment": "Venmo",
			"street": "1 Main St",
			"city": "Springfield",
			"state": "IL",
			"zipcode": "62701",
			"country": "USA",
			"items": {
				"rashguard": {"M": 2, "S": 0, "L": 1},
				"shorts": {}
			},
			"total": 120
		}"#
	}

	#[test]
	fn test_parse_full_request() {
		let request: OrderRequest = serde_json::from_str(sample_json()).unwrap();
		assert_eq!(request.name, "Ada");
		assert_eq!(request.payment, Some(PaymentMethod::Venmo));
		assert_eq!(request.address.city, "Springfield");
		assert_eq!(request.total, Decimal::from(120));
		assert_eq!(request.action(), OrderAction::RecordOrder);
		assert_eq!(request.payment_status(), "Pending");
	}

	#[test]
	fn test_sizes_keep_document_order() {
		let request: OrderRequest = serde_json::from_str(sample_json()).unwrap();
		let sizes: Vec<&str> = request
			.items
			.rashguard
			.entries()
			.iter()
			.map(|(s, _)| s.as_str())
			.collect();
		assert_eq!(sizes, vec!["M", "S", "L"]);
	}

	#[test]
	fn test_total_accepts_string_and_fraction() {
		let request: OrderRequest =
			serde_json::from_str(r#"{"name":"a","email":"a@b.c","total":"45.50"}"#).unwrap();
		assert_eq!(request.total, Decimal::from_str("45.50").unwrap());

		let request: OrderRequest =
			serde_json::from_str(r#"{"name":"a","email":"a@b.c","total":45.5}"#).unwrap();
		assert_eq!(request.total, Decimal::from_str("45.5").unwrap());
	}

	#[test]
	fn test_numeric_zipcode_kept_as_text() {
		let request: OrderRequest = serde_json::from_str(
			r#"{"name":"a","email":"a@b.c","total":1,"zipcode":62701}"#,
		)
		.unwrap();
		assert_eq!(request.address.zipcode, "62701");
	}

	#[test]
	fn test_numeric_phone_kept_as_text() {
		let request: OrderRequest = serde_json::from_str(
			r#"{"name":"a","email":"a@b.c","total":1,"phone":5550100}"#,
		)
		.unwrap();
		assert_eq!(request.phone, "5550100");

		let request: OrderRequest =
			serde_json::from_str(r#"{"name":"a","email":"a@b.c","total":1,"phone":null}"#)
				.unwrap();
		assert_eq!(request.phone, "");
	}

	#[test]
	fn test_numeric_handle_kept_as_text() {
		let request: OrderRequest = serde_json::from_str(
			r#"{"name":"a","email":"a@b.c","total":1,"handle":1234}"#,
		)
		.unwrap();
		assert_eq!(request.handle(), "1234");

		let request: OrderRequest =
			serde_json::from_str(r#"{"name":"a","email":"a@b.c","total":1,"handle":null}"#)
				.unwrap();
		assert_eq!(request.handle, None);
	}

	#[test]
	fn test_null_category_is_empty() {
		let request: OrderRequest = serde_json::from_str(
			r#"{"name":"a","email":"a@b.c","total":1,"items":{"rashguard":null}}"#,
		)
		.unwrap();
		assert!(request.items.rashguard.is_empty());
		assert!(request.items.shorts.is_empty());
	}

	#[test]
	fn test_negative_quantity_rejected() {
		let result: Result<OrderRequest, _> = serde_json::from_str(
			r#"{"name":"a","email":"a@b.c","total":1,"items":{"shorts":{"M":-1}}}"#,
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_missing_total_rejected() {
		let result: Result<OrderRequest, _> =
			serde_json::from_str(r#"{"name":"a","email":"a@b.c"}"#);
		assert!(result.is_err());
	}

	#[test]
	fn test_action_dispatch_field() {
		assert_eq!(
			OrderAction::from_field(Some("create_stripe_session")),
			OrderAction::CreateCheckoutSession
		);
		assert_eq!(
			OrderAction::from_field(Some("record_order")),
			OrderAction::RecordOrder
		);
		assert_eq!(OrderAction::from_field(Some("refund")), OrderAction::RecordOrder);
		assert_eq!(OrderAction::from_field(None), OrderAction::RecordOrder);
	}

	#[test]
	fn test_unknown_payment_method_is_kept() {
		let method = PaymentMethod::from("Cash");
		assert_eq!(method, PaymentMethod::Other("Cash".to_string()));
		assert_eq!(method.to_string(), "Cash");
		assert!(!method.needs_instructions());
		assert!(PaymentMethod::Zelle.needs_instructions());
	}

	#[test]
	fn test_first_missing_address_field() {
		let mut address = ShippingAddress {
			street: "1 Main".into(),
			city: "Town".into(),
			state: "CA".into(),
			zipcode: " ".into(),
			country: "USA".into(),
		};
		assert_eq!(address.first_missing(), Some("zipcode"));
		address.zipcode = "90210".into();
		assert_eq!(address.first_missing(), None);
	}
}
