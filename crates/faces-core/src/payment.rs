//! What the app hands to the external payment sheet, and what it gets back.
//!
//! The payment SDK itself is opaque; once it reports a completed payment the
//! two-phase purchase is run against the storefront API.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::api::{ApiError, StorefrontClient};
use crate::models::{OrderReceipt, Product};
use crate::utils::truncate_string;

/// Currency used when the config does not name one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Payment sheets reject longer descriptions
const MAX_SHORT_DESCRIPTION_LEN: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntent {
    Sale,
    Authorize,
    Order,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency_code: String,
    pub short_description: String,
    pub intent: PaymentIntent,
}

impl PaymentRequest {
    /// Request for buying a single product, described by its name
    pub fn for_product(product: &Product, currency_code: &str) -> Self {
        Self {
            amount: product.price,
            currency_code: currency_code.to_ascii_uppercase(),
            short_description: truncate_string(product.name.trim(), MAX_SHORT_DESCRIPTION_LEN),
            intent: PaymentIntent::Order,
        }
    }

    /// Whether the payment sheet would accept this request
    pub fn is_processable(&self) -> bool {
        self.amount > Decimal::ZERO
            && !self.short_description.trim().is_empty()
            && self.currency_code.len() == 3
            && self.currency_code.chars().all(|c| c.is_ascii_alphabetic())
    }
}

/// Result reported by the payment sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed { confirmation: Option<String> },
    Cancelled,
}

/// Run the purchase for a payment the sheet reported as completed.
///
/// Returns `Ok(None)` when the user cancelled; no order is created then.
pub async fn checkout(
    client: &StorefrontClient,
    product: &Product,
    outcome: PaymentOutcome,
) -> Result<Option<OrderReceipt>, ApiError> {
    match outcome {
        PaymentOutcome::Cancelled => {
            info!(product_id = product.id, "Payment cancelled");
            Ok(None)
        }
        PaymentOutcome::Completed { confirmation } => {
            info!(product_id = product.id, confirmation = ?confirmation, "Payment completed, placing order");
            client.purchase(product).await.map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(name: &str, price: &str) -> Product {
        Product {
            id: 7,
            name: name.to_string(),
            price: Decimal::from_str(price).expect("decimal"),
            description: String::new(),
            images: vec![],
        }
    }

    #[test]
    fn test_for_product() {
        let request = PaymentRequest::for_product(&product("iPhone 4", "21"), "eur");
        assert_eq!(request.amount, Decimal::from(21));
        assert_eq!(request.currency_code, "EUR");
        assert_eq!(request.short_description, "iPhone 4");
        assert_eq!(request.intent, PaymentIntent::Order);
        assert!(request.is_processable());
    }

    #[test]
    fn test_not_processable() {
        assert!(!PaymentRequest::for_product(&product("iPhone 4", "0"), "EUR").is_processable());
        assert!(!PaymentRequest::for_product(&product("iPhone 4", "-1.50"), "EUR").is_processable());
        assert!(!PaymentRequest::for_product(&product("   ", "21"), "EUR").is_processable());
        assert!(!PaymentRequest::for_product(&product("iPhone 4", "21"), "EURO").is_processable());
        assert!(!PaymentRequest::for_product(&product("iPhone 4", "21"), "E1R").is_processable());
    }

    #[test]
    fn test_long_description_truncated() {
        let name = "a".repeat(300);
        let request = PaymentRequest::for_product(&product(&name, "1"), DEFAULT_CURRENCY);
        assert_eq!(request.short_description.chars().count(), MAX_SHORT_DESCRIPTION_LEN);
        assert!(request.short_description.ends_with("..."));
    }
}
