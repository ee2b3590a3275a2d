//! Two-phase purchase: create an order, then complete it.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{ApiError, StorefrontClient};
use crate::models::{CreateOrderRequest, CreatedOrder, OrderReceipt, Product};

const ORDERS_PATH: &str = "orders/";

impl StorefrontClient {
    /// Buy a product for the user held by the session.
    ///
    /// Completion is only attempted once the order exists. If it fails the
    /// order stays pending server-side and the error carries its id
    /// ([`ApiError::OrderNotCompleted`]) so [`complete_order`](Self::complete_order)
    /// can be retried. Nothing is retried automatically.
    pub async fn purchase(&self, product: &Product) -> Result<OrderReceipt, ApiError> {
        let user_id = self.session().user_id().ok_or(ApiError::NotLoggedIn)?;

        let order = self.create_order(product.id, user_id).await?;

        if let Err(e) = self.complete_order(order.id).await {
            warn!(order_id = order.id, error = %e, "Order created but not completed");
            return Err(ApiError::OrderNotCompleted {
                order_id: order.id,
                source: Box::new(e),
            });
        }

        info!(order_id = order.id, product_id = product.id, "Purchase completed");
        Ok(OrderReceipt {
            order_id: order.id,
            product_id: product.id,
            completed_at: Utc::now(),
        })
    }

    /// Phase 1: reserve an order. The returned order is pending.
    pub async fn create_order(&self, product_id: i64, user_id: i64) -> Result<CreatedOrder, ApiError> {
        let body = CreateOrderRequest {
            product: product_id,
            user: user_id,
        };
        let order: CreatedOrder = self.post(ORDERS_PATH, &body).await?;
        info!(order_id = order.id, product_id, "Order created");
        Ok(order)
    }

    /// Phase 2: finalize a pending order. The response body is ignored.
    pub async fn complete_order(&self, order_id: i64) -> Result<(), ApiError> {
        let path = format!("{}{}/complete", ORDERS_PATH, order_id);
        self.post_raw(&path, &json!({})).await?;
        Ok(())
    }
}
