use sqlx::SqliteConnection;

use crate::db_types::{Kobo, LedgerEntry, LedgerEntryType, UserId, Wallet};

pub async fn fetch_wallet(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet =
        sqlx::query_as("SELECT * FROM wallets WHERE user_id = ?").bind(user_id.as_str()).fetch_optional(conn).await?;
    Ok(wallet)
}

/// Creates an empty wallet if the user does not have one. Returns true if a wallet was created.
pub async fn create_wallet_if_missing(user_id: &UserId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO wallets (user_id) VALUES (?) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deducts `amount` only if the balance covers it. The balance check and the write are a single statement.
/// Returns `None` if the wallet does not exist or holds less than `amount`.
pub async fn conditional_debit(
    user_id: &UserId,
    amount: Kobo,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet = sqlx::query_as(
        "UPDATE wallets SET balance = balance - ?, updated_at = CURRENT_TIMESTAMP WHERE user_id = ? AND balance >= ? \
         RETURNING *",
    )
    .bind(amount)
    .bind(user_id.as_str())
    .bind(amount)
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}

/// Adds `amount` to the balance. Returns `None` if the wallet does not exist.
pub async fn increment_balance(
    user_id: &UserId,
    amount: Kobo,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet = sqlx::query_as(
        "UPDATE wallets SET balance = balance + ?, updated_at = CURRENT_TIMESTAMP WHERE user_id = ? RETURNING *",
    )
    .bind(amount)
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}

pub async fn insert_ledger_entry(
    user_id: &UserId,
    entry_type: LedgerEntryType,
    amount: Kobo,
    balance_after: Kobo,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"INSERT INTO ledger_entries (user_id, entry_type, amount, balance_after, reference)
        VALUES (?, ?, ?, ?, ?) RETURNING *"#,
    )
    .bind(user_id.as_str())
    .bind(entry_type.to_string())
    .bind(amount)
    .bind(balance_after)
    .bind(reference)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Records a zero-amount `Void` claim on `reference`. Fails with a unique violation if the reference has already
/// been debited or voided.
pub async fn insert_void_entry(
    user_id: &UserId,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"INSERT INTO ledger_entries (user_id, entry_type, amount, balance_after, reference)
        VALUES (?, 'Void', 0, COALESCE((SELECT balance FROM wallets WHERE user_id = ?), 0), ?) RETURNING *"#,
    )
    .bind(user_id.as_str())
    .bind(user_id.as_str())
    .bind(reference)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// The `Debit` or `Void` entry that claimed `reference`, if there is one.
pub async fn fetch_claim(reference: &str, conn: &mut SqliteConnection) -> Result<Option<LedgerEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM ledger_entries WHERE reference = ? AND entry_type IN ('Debit', 'Void')")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

pub async fn fetch_entries_for_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE reference = ? ORDER BY id")
        .bind(reference)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

pub async fn fetch_entries_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE user_id = ? ORDER BY id")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
