//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, is_unique_violation, new_pool, orders, payments, wallets};
use crate::{
    db_types::{
        Kobo,
        LedgerEntry,
        LedgerEntryType,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusUpdate,
        Payment,
        PaymentReference,
        PaymentStatus,
        UserId,
        Wallet,
    },
    traits::{
        InsertOrderResult,
        InsertPaymentResult,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderStoreError,
        OrderUpdateResult,
        PaymentRecordError,
        PaymentRecordManagement,
        PaymentStatusChange,
        SettlementDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_unrefunded_wallet_payments(&self) -> Result<Vec<Payment>, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_unrefunded_failed_wallet(&mut conn).await?;
        Ok(payments)
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet(user_id, &mut conn).await?;
        Ok(wallet)
    }

    async fn open_wallet(&self, user_id: &UserId) -> Result<Wallet, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if wallets::create_wallet_if_missing(user_id, &mut conn).await? {
            info!("🗃️ Opened a new wallet for user {user_id}");
        }
        wallets::fetch_wallet(user_id, &mut conn).await?.ok_or_else(|| LedgerError::WalletNotFound(user_id.clone()))
    }

    async fn debit(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        let wallet = match wallets::conditional_debit(user_id, amount, &mut tx).await? {
            Some(w) => w,
            None => {
                let err = match wallets::fetch_wallet(user_id, &mut tx).await? {
                    Some(w) => {
                        debug!("🗃️ Debit of {amount} for [{reference}] refused. {user_id} only has {}", w.balance);
                        LedgerError::InsufficientBalance { user_id: user_id.clone(), requested: amount }
                    },
                    None => LedgerError::WalletNotFound(user_id.clone()),
                };
                return Err(err);
            },
        };
        wallets::insert_ledger_entry(user_id, LedgerEntryType::Debit, -amount, wallet.balance, reference, &mut tx)
            .await
            .map_err(|e| claim_error(e, reference))?;
        tx.commit().await?;
        debug!("🗃️ Debited {amount} from {user_id} for [{reference}]. Balance is now {}", wallet.balance);
        Ok(wallet)
    }

    async fn credit(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError> {
        self.increment(user_id, amount, reference, LedgerEntryType::Credit).await
    }

    async fn refund(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError> {
        self.increment(user_id, amount, reference, LedgerEntryType::Refund).await
    }

    async fn void_reference(&self, user_id: &UserId, reference: &str) -> Result<bool, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match wallets::insert_void_entry(user_id, reference, &mut conn).await {
            Ok(_) => {
                debug!("🗃️ Reference [{reference}] has been voided");
                Ok(true)
            },
            Err(e) if is_unique_violation(&e) => {
                let claim = wallets::fetch_claim(reference, &mut conn).await?;
                let voided = matches!(claim, Some(LedgerEntry { entry_type: LedgerEntryType::Void, .. }));
                debug!("🗃️ Reference [{reference}] was already claimed. Voided: {voided}");
                Ok(voided)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn ledger_entries_for_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = wallets::fetch_entries_for_reference(reference, &mut conn).await?;
        Ok(entries)
    }

    async fn ledger_history(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = wallets::fetch_entries_for_user(user_id, &mut conn).await?;
        Ok(entries)
    }
}

impl PaymentRecordManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        let reference = payment.reference.clone();
        let result = payments::insert_payment(payment, &mut conn).await?;
        match &result {
            InsertPaymentResult::Inserted(p) => {
                debug!("🗃️ Payment [{reference}] for order {} saved with id {}", p.order_id, p.id)
            },
            InsertPaymentResult::AlreadyExists => warn!("🗃️ Payment [{reference}] already exists"),
        }
        Ok(result)
    }

    async fn fetch_payment_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Payment>, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(reference, &mut conn).await?;
        Ok(payment)
    }

    async fn update_payment_status(
        &self,
        reference: &PaymentReference,
        status: PaymentStatus,
    ) -> Result<PaymentStatusChange, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        if status.is_terminal() {
            if let Some(payment) = payments::update_status_if_pending(reference, status, &mut conn).await? {
                debug!("🗃️ Payment [{reference}] is now {status}");
                return Ok(PaymentStatusChange::Changed(payment));
            }
        }
        let payment = payments::fetch_payment(reference, &mut conn)
            .await?
            .ok_or_else(|| PaymentRecordError::PaymentNotFound(reference.clone()))?;
        trace!("🗃️ Payment [{reference}] is {} already. {status} was not applied", payment.status);
        Ok(PaymentStatusChange::Unchanged(payment))
    }

    async fn fetch_payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_stale_pending_payments(&self, older_than: Duration) -> Result<Vec<Payment>, PaymentRecordError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_stale_pending(older_than, &mut conn).await?;
        Ok(payments)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        update: OrderStatusUpdate,
    ) -> Result<OrderUpdateResult, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(order) = orders::conditional_status_update(order_id, update, &mut conn).await? {
            debug!(
                "🗃️ Order {order_id} updated. Payment status: {}, order status: {}",
                order.payment_status, order.order_status
            );
            return Ok(OrderUpdateResult::Applied(order));
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut conn)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        debug!(
            "🗃️ Update {update:?} rejected for order {order_id} ({}, {})",
            order.payment_status, order.order_status
        );
        Ok(OrderUpdateResult::Rejected(order))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::insert_order(order, &mut conn).await?;
        if let InsertOrderResult::Inserted(o) = &result {
            debug!("🗃️ Order {} for {} saved with id {}", o.order_id, o.user_id, o.id);
        }
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn increment(
        &self,
        user_id: &UserId,
        amount: Kobo,
        reference: &str,
        entry_type: LedgerEntryType,
    ) -> Result<Wallet, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        let wallet = wallets::increment_balance(user_id, amount, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(user_id.clone()))?;
        wallets::insert_ledger_entry(user_id, entry_type, amount, wallet.balance, reference, &mut tx)
            .await
            .map_err(|e| claim_error(e, reference))?;
        tx.commit().await?;
        debug!("🗃️ {entry_type} of {amount} to {user_id} for [{reference}]. Balance is now {}", wallet.balance);
        Ok(wallet)
    }
}

fn claim_error(e: sqlx::Error, reference: &str) -> LedgerError {
    if is_unique_violation(&e) {
        LedgerError::DuplicateEntry(reference.to_string())
    } else {
        LedgerError::from(e)
    }
}
