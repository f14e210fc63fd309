use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Kobo, LedgerEntry, UserId, Wallet},
    traits::{LedgerError, LedgerManagement},
    SettlementError,
};

/// Customer-facing wallet operations. Debits only ever happen through [`crate::SettlementApi`].
#[derive(Clone)]
pub struct WalletApi<B> {
    db: B,
}

impl<B: Debug> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi ({:?})", self.db)
    }
}

impl<B> WalletApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> WalletApi<B>
where B: LedgerManagement
{
    pub async fn balance(&self, user_id: &UserId) -> Result<Kobo, SettlementError> {
        let wallet = self.wallet(user_id).await?;
        Ok(wallet.balance)
    }

    pub async fn wallet(&self, user_id: &UserId) -> Result<Wallet, SettlementError> {
        self.db.fetch_wallet(user_id).await?.ok_or_else(|| SettlementError::WalletNotFound(user_id.clone()))
    }

    pub async fn open_wallet(&self, user_id: &UserId) -> Result<Wallet, SettlementError> {
        let wallet = self.db.open_wallet(user_id).await?;
        Ok(wallet)
    }

    /// Adds funds to the wallet, opening it first if the user has none. The `reference` identifies the funding
    /// transaction: a reference that has already been credited is not credited again, and the wallet is returned as is.
    pub async fn top_up(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, SettlementError> {
        if !amount.is_positive() {
            return Err(SettlementError::InvalidAmount(amount));
        }
        self.open_wallet(user_id).await?;
        match self.db.credit(user_id, amount, reference).await {
            Ok(wallet) => {
                info!("👛️ Wallet of {user_id} topped up with {amount} [{reference}]. Balance: {}", wallet.balance);
                Ok(wallet)
            },
            Err(LedgerError::DuplicateEntry(_)) => {
                info!("👛️ Top-up [{reference}] for {user_id} was already applied");
                self.wallet(user_id).await
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn history(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, SettlementError> {
        let entries = self.db.ledger_history(user_id).await?;
        trace!("👛️ {} ledger entries for {user_id}", entries.len());
        Ok(entries)
    }
}
