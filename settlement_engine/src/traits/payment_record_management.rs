use std::time::Duration;

use thiserror::Error;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentReference, PaymentStatus},
    traits::{InsertPaymentResult, PaymentStatusChange},
};

/// The Payment Record Store. One record per settlement attempt, keyed by a unique, immutable reference.
#[allow(async_fn_in_trait)]
pub trait PaymentRecordManagement {
    /// Stores a new payment in `Pending` status. If a payment with the same reference already exists, nothing is
    /// written and `AlreadyExists` is returned.
    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, PaymentRecordError>;

    async fn fetch_payment_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Payment>, PaymentRecordError>;

    /// Moves a `Pending` payment into the given terminal status. This is a single conditional update, so of any
    /// number of concurrent callers exactly one sees `Changed`. If the payment is already terminal, the stored record
    /// is returned as `Unchanged`.
    ///
    /// Requesting `Pending` is never a change.
    async fn update_payment_status(
        &self,
        reference: &PaymentReference,
        status: PaymentStatus,
    ) -> Result<PaymentStatusChange, PaymentRecordError>;

    /// All settlement attempts for the order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, PaymentRecordError>;

    /// Payments that have been `Pending` for at least `older_than`.
    async fn fetch_stale_pending_payments(&self, older_than: Duration) -> Result<Vec<Payment>, PaymentRecordError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentRecordError {
    #[error("The requested payment does not exist for reference {0}")]
    PaymentNotFound(PaymentReference),
    #[error("Payment database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PaymentRecordError {
    fn from(e: sqlx::Error) -> Self {
        PaymentRecordError::DatabaseError(e.to_string())
    }
}
