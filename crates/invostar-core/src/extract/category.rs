//! Payment and product categories.

use super::patterns::{PAYMENT_CATEGORY, PRODUCT_CATEGORY};
use super::NOT_SPECIFIED;

/// Category of a payment method. Empty names are "Not Specified"; names
/// matching no keyword are "Other".
pub fn extract_payment_category(payment_name: &str) -> &'static str {
    let name = payment_name.trim();
    if name.is_empty() {
        return NOT_SPECIFIED;
    }
    PAYMENT_CATEGORY.classify(name)
}

/// Category of a product from its description, "General" if none applies.
pub fn extract_product_category(description: &str) -> &'static str {
    PRODUCT_CATEGORY.classify(description.trim())
}
