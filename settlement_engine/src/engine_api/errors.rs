use thiserror::Error;

use crate::{
    db_types::{Kobo, OrderId, PaymentReference, UserId},
    traits::{GatewayError, LedgerError, OrderStoreError, PaymentRecordError},
};

/// Every way a settlement or reconciliation call can fail. Callers are expected to match on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("Payment amounts must be positive, but {0} was given")]
    InvalidAmount(Kobo),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} does not belong to user {user_id}")]
    OrderOwnershipMismatch { order_id: OrderId, user_id: UserId },
    #[error("Payment of {actual} does not match the order total of {expected}")]
    AmountMismatch { expected: Kobo, actual: Kobo },
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("Order {0} has been cancelled")]
    OrderCancelled(OrderId),
    #[error("No wallet exists for user {0}")]
    WalletNotFound(UserId),
    #[error("The wallet balance is insufficient to pay {0}")]
    InsufficientBalance(Kobo),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("The payment gateway did not respond in time. Payment {0} remains pending")]
    GatewayTimeout(PaymentReference),
    #[error("Could not allocate a unique payment reference. Last attempt: {0}")]
    DuplicateReference(PaymentReference),
    #[error("The requested payment does not exist for reference {0}")]
    PaymentNotFound(PaymentReference),
    #[error("Payment {0} is settled from a wallet and cannot be confirmed by the gateway")]
    UnexpectedConfirmation(PaymentReference),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for SettlementError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::WalletNotFound(user_id) => Self::WalletNotFound(user_id),
            LedgerError::InsufficientBalance { requested, .. } => Self::InsufficientBalance(requested),
            LedgerError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            LedgerError::DuplicateEntry(reference) => Self::DuplicateReference(PaymentReference::from(reference)),
            LedgerError::DatabaseError(e) => Self::DatabaseError(e),
        }
    }
}

impl From<PaymentRecordError> for SettlementError {
    fn from(e: PaymentRecordError) -> Self {
        match e {
            PaymentRecordError::PaymentNotFound(reference) => Self::PaymentNotFound(reference),
            PaymentRecordError::DatabaseError(e) => Self::DatabaseError(e),
        }
    }
}

impl From<OrderStoreError> for SettlementError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(order_id) => Self::OrderNotFound(order_id),
            OrderStoreError::DatabaseError(e) => Self::DatabaseError(e),
        }
    }
}

impl From<GatewayError> for SettlementError {
    fn from(e: GatewayError) -> Self {
        Self::GatewayUnavailable(e.to_string())
    }
}
