use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST orders/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    pub product: i64,
    pub user: i64,
}

/// Response of `POST orders/`; the order is pending until completed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    pub id: i64,
}

/// Proof of a completed two-phase purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub product_id: i64,
    pub completed_at: DateTime<Utc>,
}
