use thiserror::Error;

use crate::db_types::{Kobo, LedgerEntry, UserId, Wallet};

/// The Ledger Store. Owns wallet balances and the append-only journal of every change made to them.
///
/// All mutating calls are keyed by a reference. A debit can only be made once per reference, and a reference that
/// has been voided can never be debited.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Fetches the wallet for the given user, if one exists.
    async fn fetch_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>, LedgerError>;

    /// Creates an empty wallet for the user if they do not have one already. This call is idempotent and returns
    /// the (possibly pre-existing) wallet.
    async fn open_wallet(&self, user_id: &UserId) -> Result<Wallet, LedgerError>;

    /// Atomically checks that the wallet holds at least `amount` and deducts it, recording a `Debit` journal entry
    /// under `reference`.
    ///
    /// ## Failure modes
    /// * `InvalidAmount` if `amount` is not positive.
    /// * `WalletNotFound` if the user has no wallet.
    /// * `InsufficientBalance` if the balance is less than `amount`. The balance is left untouched.
    /// * `DuplicateEntry` if `reference` has already been debited or voided.
    async fn debit(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError>;

    /// Unconditionally adds `amount` to the wallet (a top-up), recording a `Credit` journal entry.
    async fn credit(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError>;

    /// Returns a previously debited `amount` to the wallet, recording a `Refund` journal entry against the original
    /// reference. A reference can only be refunded once.
    async fn refund(&self, user_id: &UserId, amount: Kobo, reference: &str) -> Result<Wallet, LedgerError>;

    /// Claims `reference` so that it can never be debited.
    ///
    /// Returns `true` if the reference is (now, or already was) void, and `false` if it had already been debited, in
    /// which case nothing is changed.
    async fn void_reference(&self, user_id: &UserId, reference: &str) -> Result<bool, LedgerError>;

    /// All journal entries recorded under `reference`, oldest first.
    async fn ledger_entries_for_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// The journal for the user's wallet, oldest first.
    async fn ledger_history(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("No wallet exists for user {0}")]
    WalletNotFound(UserId),
    #[error("Wallet for user {user_id} has insufficient balance to cover {requested}")]
    InsufficientBalance { user_id: UserId, requested: Kobo },
    #[error("Ledger amounts must be positive, but {0} was given")]
    InvalidAmount(Kobo),
    #[error("A conflicting ledger entry already exists for reference {0}")]
    DuplicateEntry(String),
    #[error("Ledger database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
