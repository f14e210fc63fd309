//! Storefront Payment Settlement Engine
//!
//! The settlement engine takes a payment request against an order, settles it either from the customer's prepaid
//! wallet or through an external payment gateway, and reconciles order and payment state once the transaction
//! completes, including when the confirmation arrives out-of-band.
//!
//! The library is divided into these main sections:
//! 1. Storage contracts ([`mod@traits`]) and a SQLite backend ([`SqliteDatabase`]). Wallet balances are only ever
//!    changed by single conditional updates, payments are written as durable `Pending` intents before any money
//!    moves, and order transitions are applied only when they are legal from the order's current state.
//! 2. The engine APIs. [`SettlementApi`] is the payment orchestrator, [`ReconciliationApi`] applies gateway
//!    confirmations and sweeps stale pending payments, and [`WalletApi`] manages customer wallets.
//!
//! The engine also emits events when payments succeed or fail and when orders are paid. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod engine_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use engine_api::{
    config::{ConfirmationRetryPolicy, SettlementConfig},
    errors::SettlementError,
    reconciliation_api::ReconciliationApi,
    settlement_api::SettlementApi,
    settlement_objects::{ReconciliationSummary, SettlementOutcome, SettlementRequest},
    wallet_api::WalletApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    InsertOrderResult,
    InsertPaymentResult,
    LedgerManagement,
    OrderManagement,
    PaymentGateway,
    PaymentRecordManagement,
    SettlementDatabase,
};
