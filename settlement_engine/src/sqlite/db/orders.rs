use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusUpdate},
    traits::InsertOrderResult,
};

/// Inserts a new, unpaid order. If an order with the same `order_id` exists, nothing is written.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, sqlx::Error> {
    let result = sqlx::query_as(
        r#"INSERT INTO orders (order_id, user_id, total_price, delivery_address) VALUES (?, ?, ?, ?) RETURNING *"#,
    )
    .bind(order.order_id.as_str())
    .bind(order.user_id.as_str())
    .bind(order.total_price)
    .bind(order.delivery_address.as_deref())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(InsertOrderResult::Inserted(order)),
        Err(e) if is_unique_violation(&e) => Ok(InsertOrderResult::AlreadyExists(order.order_id)),
        Err(e) => Err(e),
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = ?")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Applies `update` to the order only if every requested transition is legal from the order's current state. The
/// check and the write are a single statement, so concurrent writers cannot interleave between them.
///
/// Returns the updated order, or `None` if the order does not exist or the transition was not legal.
pub async fn conditional_status_update(
    order_id: &OrderId,
    update: OrderStatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let payment_from = update.payment_status.map(|s| s.legal_predecessors()).unwrap_or_default();
    let status_from = update.order_status.map(|s| s.legal_predecessors()).unwrap_or_default();
    let unreachable = (update.payment_status.is_some() && payment_from.is_empty()) ||
        (update.order_status.is_some() && status_from.is_empty());
    if update.is_empty() || unreachable {
        debug!("📝️ Status update {update:?} for order {order_id} can never apply. Skipping query.");
        return Ok(None);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP");
    if let Some(status) = update.payment_status {
        builder.push(", payment_status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(status) = update.order_status {
        builder.push(", order_status = ");
        builder.push_bind(status.to_string());
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str().to_string());
    if update.payment_status.is_some() {
        builder.push(" AND payment_status IN (");
        let mut list = builder.separated(", ");
        for status in payment_from {
            list.push_bind(status.to_string());
        }
        list.push_unseparated(")");
    }
    if update.order_status.is_some() {
        builder.push(" AND order_status IN (");
        let mut list = builder.separated(", ");
        for status in status_from {
            list.push_bind(status.to_string());
        }
        list.push_unseparated(")");
    }
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}
