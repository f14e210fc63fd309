#![allow(dead_code)]

use std::time::Duration;

pub use fake_gateway::FakeGateway;
use log::*;
use settlement_engine::{
    db_types::{Kobo, NewOrder, Order, OrderId, UserId, Wallet},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ConfirmationRetryPolicy,
    InsertOrderResult,
    LedgerManagement,
    OrderManagement,
    ReconciliationApi,
    SettlementApi,
    SettlementConfig,
    SettlementDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

/// Short timeouts so that timeout scenarios finish quickly.
pub fn test_config() -> SettlementConfig {
    SettlementConfig {
        gateway_timeout: Duration::from_millis(250),
        confirmation_retries: ConfirmationRetryPolicy::new(3, Duration::from_millis(25)),
    }
}

pub fn settlement_api(db: &SqliteDatabase, gateway: &FakeGateway) -> SettlementApi<SqliteDatabase, FakeGateway> {
    SettlementApi::new(db.clone(), gateway.clone(), test_config(), EventProducers::default())
}

pub fn reconciliation_api(
    db: &SqliteDatabase,
    gateway: &FakeGateway,
) -> ReconciliationApi<SqliteDatabase, FakeGateway> {
    ReconciliationApi::new(db.clone(), gateway.clone(), test_config(), EventProducers::default())
}

pub async fn seed_order(db: &SqliteDatabase, order_id: &str, user_id: &str, naira: i64) -> Order {
    let order = NewOrder::new(OrderId::from(order_id), UserId::from(user_id), Kobo::from_naira(naira));
    match db.insert_order(order).await.expect("Error inserting order") {
        InsertOrderResult::Inserted(order) => order,
        InsertOrderResult::AlreadyExists(id) => panic!("Order {id} already exists"),
    }
}

pub async fn fund_wallet(db: &SqliteDatabase, user_id: &str, naira: i64) -> Wallet {
    let user_id = UserId::from(user_id);
    let wallet = db.open_wallet(&user_id).await.expect("Error opening wallet");
    if naira == 0 {
        return wallet;
    }
    let reference = format!("topup_{}_{}", user_id, rand::random::<u32>());
    db.credit(&user_id, Kobo::from_naira(naira), &reference).await.expect("Error funding wallet")
}

pub async fn balance(db: &SqliteDatabase, user_id: &str) -> Kobo {
    let wallet = db.fetch_wallet(&UserId::from(user_id)).await.expect("Error fetching wallet");
    wallet.expect("Wallet does not exist").balance
}

pub async fn fetch_order(db: &SqliteDatabase, order_id: &str) -> Order {
    db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order").expect("Order does not exist")
}
