use cucumber::given;
use settlement_engine::{
    db_types::{Kobo, NewOrder, OrderId, UserId},
    LedgerManagement,
    OrderManagement,
};

use crate::cucumber::{world::SettlementSystem, SettlementWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SettlementWorld) {
    let system = SettlementSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "customer '{word}' has a wallet with {int} NGN")]
async fn funded_wallet(world: &mut SettlementWorld, user_id: String, naira: i64) {
    let db = &world.system().db;
    let user_id = UserId::from(user_id);
    db.open_wallet(&user_id).await.expect("Error opening wallet");
    if naira > 0 {
        let reference = format!("topup_{user_id}");
        db.credit(&user_id, Kobo::from_naira(naira), &reference).await.expect("Error funding wallet");
    }
}

#[given(expr = "order {word} for customer '{word}' costs {int} NGN")]
async fn new_order(world: &mut SettlementWorld, order_id: String, user_id: String, naira: i64) {
    let order = NewOrder::new(OrderId::from(order_id), UserId::from(user_id), Kobo::from_naira(naira));
    world.system().db.insert_order(order).await.expect("Error inserting order");
}
