//! String formatting utilities.
//!
//! Checkout descriptions and ledger summaries render the same item mappings
//! differently: the description drops zero quantities and labels each entry,
//! the ledger summary lists every entry as sent and uses `None` for an empty
//! mapping.

use crate::order::{OrderItems, SizeQuantities};

/// Separator between entries of one category.
const ENTRY_SEPARATOR: &str = ", ";
/// Separator between categories in a checkout description.
const CATEGORY_SEPARATOR: &str = " • ";
/// Ledger value for a category with no entries.
const EMPTY_SUMMARY: &str = "None";

/// Utility function to truncate an identifier for display purposes.
///
/// Shows only the first 12 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(12) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Human-readable description sent to the payment provider.
///
/// e.g. `Rashguard M x2, Rashguard L x1 • Shorts S x1`
pub fn checkout_description(items: &OrderItems) -> String {
	items
		.categories()
		.iter()
		.map(|(category, sizes)| {
			sizes
				.positive()
				.map(|(size, qty)| format!("{} {} x{}", category.label(), size, qty))
				.collect::<Vec<_>>()
				.join(ENTRY_SEPARATOR)
		})
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join(CATEGORY_SEPARATOR)
}

/// Ledger summary of one category, e.g. `M x2, S x0`.
pub fn record_summary(sizes: &SizeQuantities) -> String {
	if sizes.is_empty() {
		return EMPTY_SUMMARY.to_string();
	}
	sizes
		.entries()
		.iter()
		.map(|(size, qty)| format!("{} x{}", size, qty))
		.collect::<Vec<_>>()
		.join(ENTRY_SEPARATOR)
}
