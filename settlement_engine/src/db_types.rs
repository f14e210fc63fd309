//! Data types shared by the settlement engine and its database backends.
//!
//! Enums are persisted as `TEXT` using their variant names, so the [`Display`] and [`FromStr`] implementations must
//! round-trip exactly.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use spg_common::Kobo;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        UserId         ---------------------------------------------------------
/// The identity of a storefront customer, as issued by the (external) user account service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   PaymentReference    ---------------------------------------------------------
/// The globally unique reference of a single settlement attempt. It is shared with the payment gateway and used to
/// key confirmations, and it is also the key of the ledger entries a wallet attempt produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentReference(pub String);

impl From<String> for PaymentReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for PaymentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PaymentReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  OrderPaymentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderPaymentStatus {
    /// No settlement attempt has been made, or none has progressed.
    Unpaid,
    /// A gateway transaction has been initiated and we are waiting for the confirmation.
    Pending,
    /// The order has been paid in full. This state is final.
    Paid,
    /// The last gateway transaction for the order failed. The customer may try again.
    Failed,
}

impl OrderPaymentStatus {
    /// The states from which a transition into `self` is legal. `Paid` never appears in this list, so it is absorbing.
    pub fn legal_predecessors(&self) -> &'static [OrderPaymentStatus] {
        use OrderPaymentStatus::*;
        match self {
            Unpaid => &[],
            Pending => &[Unpaid, Failed],
            Paid => &[Unpaid, Pending, Failed],
            Failed => &[Pending],
        }
    }

    pub fn can_transition_to(&self, next: OrderPaymentStatus) -> bool {
        next.legal_predecessors().contains(self)
    }
}

impl Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderPaymentStatus::Unpaid => write!(f, "Unpaid"),
            OrderPaymentStatus::Pending => write!(f, "Pending"),
            OrderPaymentStatus::Paid => write!(f, "Paid"),
            OrderPaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for OrderPaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order payment status: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed, but not paid for.
    Pending,
    /// Payment has been received and the merchant is processing the order.
    Processing,
    Preparing,
    OutForDelivery,
    Delivered,
    /// The order has been cancelled by the user or admin.
    Cancelled,
}

impl OrderStatusType {
    /// The states from which a transition into `self` is legal. Fulfilment is a linear chain, and any order that has
    /// not been delivered can be cancelled.
    pub fn legal_predecessors(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[],
            Processing => &[Pending],
            Preparing => &[Processing],
            OutForDelivery => &[Preparing],
            Delivered => &[OutForDelivery],
            Cancelled => &[Pending, Processing, Preparing, OutForDelivery],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        next.legal_predecessors().contains(self)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::OutForDelivery => write!(f, "OutForDelivery"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Preparing" => Ok(Self::Preparing),
            "OutForDelivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_price: Kobo,
    pub payment_status: OrderPaymentStatus,
    pub order_status: OrderStatusType,
    pub delivery_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == OrderPaymentStatus::Paid
    }

    pub fn is_cancelled(&self) -> bool {
        self.order_status == OrderStatusType::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_price: Kobo,
    pub delivery_address: Option<String>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: UserId, total_price: Kobo) -> Self {
        Self { order_id, user_id, total_price, delivery_address: None }
    }

    pub fn with_delivery_address<S: Into<String>>(mut self, address: S) -> Self {
        self.delivery_address = Some(address.into());
        self
    }
}

/// A request to move an order along one or both of its state machines. Fields that are `None` are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    pub payment_status: Option<OrderPaymentStatus>,
    pub order_status: Option<OrderStatusType>,
}

impl OrderStatusUpdate {
    pub fn paid_and_processing() -> Self {
        Self { payment_status: Some(OrderPaymentStatus::Paid), order_status: Some(OrderStatusType::Processing) }
    }

    pub fn payment_status(status: OrderPaymentStatus) -> Self {
        Self { payment_status: Some(status), order_status: None }
    }

    pub fn is_empty(&self) -> bool {
        self.payment_status.is_none() && self.order_status.is_none()
    }

    /// Returns true if every requested transition is legal from the order's current state.
    pub fn is_legal_for(&self, order: &Order) -> bool {
        let payment_ok = self.payment_status.map(|s| order.payment_status.can_transition_to(s)).unwrap_or(true);
        let status_ok = self.order_status.map(|s| order.order_status.can_transition_to(s)).unwrap_or(true);
        payment_ok && status_ok
    }
}

//--------------------------------------        Wallet         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: Kobo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LedgerEntryType {
    /// Funds were taken from the wallet to settle a payment.
    Debit,
    /// Funds were added to the wallet (a top-up).
    Credit,
    /// A debit was returned to the wallet because the payment could not be applied to its order.
    Refund,
    /// The reference was claimed without moving funds, so that it can never be debited.
    Void,
}

impl Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryType::Debit => write!(f, "Debit"),
            LedgerEntryType::Credit => write!(f, "Credit"),
            LedgerEntryType::Refund => write!(f, "Refund"),
            LedgerEntryType::Void => write!(f, "Void"),
        }
    }
}

/// A row in the append-only wallet journal. `amount` is signed: debits are negative.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: UserId,
    pub entry_type: LedgerEntryType,
    pub amount: Kobo,
    pub balance_after: Kobo,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settled synchronously from the customer's prepaid balance.
    Wallet,
    /// Settled by an external payment processor, confirmed asynchronously.
    Gateway,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Wallet => write!(f, "Wallet"),
            PaymentMethod::Gateway => write!(f, "Gateway"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wallet" => Ok(Self::Wallet),
            "gateway" => Ok(Self::Gateway),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------  ConfirmationStatus   ---------------------------------------------------------
/// The outcome of a gateway transaction, as delivered by a confirmation callback or a verification poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Success,
    Failed,
}

impl From<ConfirmationStatus> for PaymentStatus {
    fn from(value: ConfirmationStatus) -> Self {
        match value {
            ConfirmationStatus::Success => PaymentStatus::Success,
            ConfirmationStatus::Failed => PaymentStatus::Failed,
        }
    }
}

impl Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationStatus::Success => write!(f, "success"),
            ConfirmationStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub reference: PaymentReference,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Kobo,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub reference: PaymentReference,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Kobo,
    pub method: PaymentMethod,
}

impl NewPayment {
    pub fn new(
        reference: PaymentReference,
        order_id: OrderId,
        user_id: UserId,
        amount: Kobo,
        method: PaymentMethod,
    ) -> Self {
        Self { reference, order_id, user_id, amount, method }
    }
}
