//! # Settlement storage and gateway contracts
//!
//! This module defines the interface contracts that settlement *backends* and *collaborators* must implement.
//!
//! * [`LedgerManagement`] persists wallet balances and their journal. Every balance change is a single conditional
//!   update, so a wallet can never go negative, even under concurrent debits.
//! * [`PaymentRecordManagement`] persists settlement attempts, keyed by their unique reference.
//! * [`OrderManagement`] is the contract of the order store. The settlement engine only reads orders and requests
//!   status transitions; the store applies a transition only if it is legal from the order's current state.
//! * [`SettlementDatabase`] groups the three stores into the single backend the engine APIs are generic over.
//! * [`PaymentGateway`] is the capability to start and verify transactions with an external payment processor.
mod data_objects;
mod ledger_management;
mod order_management;
mod payment_gateway;
mod payment_record_management;
mod settlement_database;

pub use data_objects::{InsertOrderResult, InsertPaymentResult, OrderUpdateResult, PaymentStatusChange};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{GatewayAuthorization, GatewayError, GatewayVerification, PaymentGateway};
pub use payment_record_management::{PaymentRecordError, PaymentRecordManagement};
pub use settlement_database::SettlementDatabase;
