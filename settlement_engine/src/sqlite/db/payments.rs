use std::time::Duration;

use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentReference, PaymentStatus},
    traits::InsertPaymentResult,
};

pub async fn insert_payment(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, sqlx::Error> {
    let result = sqlx::query_as(
        r#"INSERT INTO payments (reference, order_id, user_id, amount, method, status)
        VALUES (?, ?, ?, ?, ?, 'Pending') RETURNING *"#,
    )
    .bind(payment.reference.as_str())
    .bind(payment.order_id.as_str())
    .bind(payment.user_id.as_str())
    .bind(payment.amount)
    .bind(payment.method.to_string())
    .fetch_one(conn)
    .await;
    match result {
        Ok(payment) => Ok(InsertPaymentResult::Inserted(payment)),
        Err(e) if is_unique_violation(&e) => Ok(InsertPaymentResult::AlreadyExists),
        Err(e) => Err(e),
    }
}

pub async fn fetch_payment(
    reference: &PaymentReference,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE reference = ?")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Moves the payment to `status`, but only if it is still pending. Returns `None` if nothing was updated.
pub async fn update_status_if_pending(
    reference: &PaymentReference,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE reference = ? AND status = 'Pending' \
         RETURNING *",
    )
    .bind(status.to_string())
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = ? ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn fetch_stale_pending(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    #[allow(clippy::cast_possible_wrap)]
    let age = older_than.as_secs() as i64;
    let payments = sqlx::query_as(
        "SELECT * FROM payments WHERE status = 'Pending' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) \
         >= ? ORDER BY id",
    )
    .bind(age)
    .fetch_all(conn)
    .await?;
    Ok(payments)
}

/// Failed wallet payments with a `Debit` in the journal and no matching `Refund`.
pub async fn fetch_unrefunded_failed_wallet(conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as(
        r#"SELECT p.* FROM payments p
        WHERE p.status = 'Failed' AND p.method = 'Wallet'
        AND EXISTS (SELECT 1 FROM ledger_entries d WHERE d.reference = p.reference AND d.entry_type = 'Debit')
        AND NOT EXISTS (SELECT 1 FROM ledger_entries r WHERE r.reference = p.reference AND r.entry_type = 'Refund')
        ORDER BY p.id"#,
    )
    .fetch_all(conn)
    .await?;
    Ok(payments)
}
