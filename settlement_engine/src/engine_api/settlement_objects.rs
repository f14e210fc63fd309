use serde::{Deserialize, Serialize};

use crate::db_types::{Kobo, OrderId, Payment, PaymentMethod, UserId};

/// A request to settle an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Kobo,
    /// Passed to the gateway, which uses it to identify the customer. Not needed for wallet payments.
    pub email: String,
    pub payment_method: PaymentMethod,
}

impl SettlementRequest {
    pub fn new(order_id: OrderId, user_id: UserId, amount: Kobo, payment_method: PaymentMethod) -> Self {
        Self { order_id, user_id, amount, email: String::default(), payment_method }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = email.into();
        self
    }
}

/// The result of a successful `settle` call.
///
/// Wallet payments are final (`Success`) by the time this is returned. Gateway payments are `Pending`, and the
/// customer must be sent to `payment_url` to complete them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub payment: Payment,
    pub payment_url: Option<String>,
}

/// What a sweep of stale pending payments did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Payments that were finalized as `Success`.
    pub succeeded: usize,
    /// Payments that were finalized as `Failed`.
    pub failed: usize,
    /// Payments that are still pending, e.g. because the customer has not finished paying yet.
    pub still_pending: usize,
    /// Failed wallet payments whose debit was returned to the wallet by this sweep.
    pub refunded: usize,
    /// Payments that could not be reconciled this time because of an error. They will be retried on the next sweep.
    pub errors: usize,
}

impl ReconciliationSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.still_pending + self.refunded + self.errors
    }
}
