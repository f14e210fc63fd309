use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusUpdate},
    traits::{InsertOrderResult, OrderUpdateResult},
};

/// The contract of the order store.
///
/// Orders belong to the storefront, not to the settlement engine. The engine reads them and requests status
/// transitions, and must not assume it is the only writer.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Applies the requested transition(s) in a single conditional update.
    ///
    /// If every requested transition is legal from the order's current state, the update is applied and the new
    /// order returned as `Applied`. Otherwise nothing changes and the current order is returned as `Rejected`.
    /// An empty update is always `Rejected`.
    ///
    /// ## Failure modes
    /// * `OrderNotFound` if the order does not exist.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        update: OrderStatusUpdate,
    ) -> Result<OrderUpdateResult, OrderStoreError>;

    /// Stores a new, unpaid order. This is how the storefront hands orders to the order store; it is not part of the
    /// settlement flow itself.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStoreError {
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order store database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
