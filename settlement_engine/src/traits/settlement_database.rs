use crate::{
    db_types::Payment,
    traits::{LedgerManagement, OrderManagement, PaymentRecordError, PaymentRecordManagement},
};

/// The complete storage backend for the settlement engine.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + LedgerManagement + PaymentRecordManagement + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Wallet payments that are `Failed` but whose debit was never returned to the wallet. This is what is left
    /// behind when a refund could not be written after the payment was failed.
    async fn fetch_unrefunded_wallet_payments(&self) -> Result<Vec<Payment>, PaymentRecordError>;

    /// Closes the database connection.
    async fn close(&mut self) {}
}
