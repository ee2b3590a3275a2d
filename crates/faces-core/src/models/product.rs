use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reference to a product picture (absolute URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "product_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Exact amount; accepted from JSON as a string or a number.
    pub price: Decimal,
    #[serde(default, alias = "desc")]
    pub description: String,
    /// Pictures in display order
    #[serde(default, alias = "images_url")]
    pub images: Vec<ImageRef>,
}
