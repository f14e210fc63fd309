use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// A payment has reached `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSucceededEvent {
    pub payment: Payment,
}

impl PaymentSucceededEvent {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }
}

/// A payment has reached `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub payment: Payment,
    pub reason: String,
}

impl PaymentFailedEvent {
    pub fn new<S: Into<String>>(payment: Payment, reason: S) -> Self {
        Self { payment, reason: reason.into() }
    }
}

/// An order has been marked as paid. This happens at most once per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentSucceeded(PaymentSucceededEvent),
    PaymentFailed(PaymentFailedEvent),
    OrderPaid(OrderPaidEvent),
}
