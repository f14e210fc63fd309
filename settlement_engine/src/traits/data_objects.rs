use crate::db_types::{Order, OrderId, Payment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPaymentResult {
    Inserted(Payment),
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(OrderId),
}

/// The outcome of a conditional `pending -> terminal` payment update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatusChange {
    /// The payment was pending and now carries the requested status.
    Changed(Payment),
    /// The payment was already terminal. The stored record is returned unchanged.
    Unchanged(Payment),
}

impl PaymentStatusChange {
    pub fn payment(&self) -> &Payment {
        match self {
            Self::Changed(p) | Self::Unchanged(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            Self::Changed(p) | Self::Unchanged(p) => p,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// The outcome of a requested order status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderUpdateResult {
    /// The transition was legal and has been applied. Contains the updated order.
    Applied(Order),
    /// The transition was illegal from the order's current state. Contains the order as it currently stands.
    Rejected(Order),
}

impl OrderUpdateResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Rejected(o) => o,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}
