use std::{str::FromStr, time::Duration};

use cucumber::{then, when};
use futures_util::future::join_all;
use settlement_engine::{
    db_types::{
        ConfirmationStatus,
        Kobo,
        OrderId,
        OrderPaymentStatus,
        OrderStatusType,
        PaymentMethod,
        PaymentStatus,
        UserId,
    },
    traits::GatewayVerification,
    LedgerManagement,
    OrderManagement,
    SettlementRequest,
};

use crate::cucumber::SettlementWorld;

fn request(order_id: &str, user_id: &str, naira: i64, method: PaymentMethod) -> SettlementRequest {
    SettlementRequest::new(OrderId::from(order_id), UserId::from(user_id), Kobo::from_naira(naira), method)
        .with_email(format!("{user_id}@example.com"))
}

fn payment_method(method: &str) -> PaymentMethod {
    match method {
        "wallet" => PaymentMethod::Wallet,
        "gateway" => PaymentMethod::Gateway,
        m => panic!("Unknown payment method {m}"),
    }
}

#[when(expr = "'{word}' pays {int} NGN for order {word} with the {word}")]
async fn settle(world: &mut SettlementWorld, user_id: String, naira: i64, order_id: String, method: String) {
    let request = request(&order_id, &user_id, naira, payment_method(&method));
    let system = world.system_mut();
    let result = system.settlement.settle(request).await;
    system.record(OrderId::from(order_id), result);
}

#[when(expr = "'{word}' pays {int} NGN for orders {word} and {word} from the wallet at the same time")]
async fn concurrent_settle(world: &mut SettlementWorld, user_id: String, naira: i64, first: String, second: String) {
    let system = world.system_mut();
    let requests = [&first, &second].map(|id| request(id, &user_id, naira, PaymentMethod::Wallet));
    let results = join_all(requests.into_iter().map(|r| system.settlement.settle(r))).await;
    for (order_id, result) in [first, second].into_iter().zip(results) {
        system.record(OrderId::from(order_id), result);
    }
}

#[when(expr = "the gateway confirms the payment for order {word} as {word}")]
async fn confirm(world: &mut SettlementWorld, order_id: String, status: String) {
    let status = match status.as_str() {
        "success" => ConfirmationStatus::Success,
        "failed" => ConfirmationStatus::Failed,
        s => panic!("Unknown confirmation status {s}"),
    };
    let system = world.system();
    let reference = system.reference_for(&OrderId::from(order_id));
    system.reconciliation.apply_confirmation(&reference, status).await.expect("Error applying confirmation");
}

#[when("the gateway stops responding")]
async fn gateway_hangs(world: &mut SettlementWorld) {
    world.system().gateway.respond_after(Duration::from_secs(2));
}

#[when("the gateway recovers")]
async fn gateway_recovers(world: &mut SettlementWorld) {
    world.system().gateway.respond_after(Duration::ZERO);
}

#[when(expr = "the gateway reports the payment for order {word} as paid")]
async fn gateway_reports_paid(world: &mut SettlementWorld, order_id: String) {
    let system = world.system();
    let reference = system.reference_for(&OrderId::from(order_id));
    system.gateway.set_verdict(&reference, GatewayVerification::Success);
}

#[when("stale payments are reconciled")]
async fn reconcile(world: &mut SettlementWorld) {
    let system = world.system();
    system.reconciliation.reconcile_stale_payments(Duration::ZERO).await.expect("Error reconciling payments");
}

#[then(expr = "the payment for order {word} is {word}")]
async fn check_payment_status(world: &mut SettlementWorld, order_id: String, status: String) {
    let expected = PaymentStatus::from_str(&status).expect("Invalid payment status");
    let system = world.system();
    let reference = system.reference_for(&OrderId::from(order_id));
    let payment = system.settlement.fetch_payment(&reference).await.expect("Error fetching payment");
    assert_eq!(payment.status, expected);
}

#[then(expr = "the customer is sent to the checkout page for order {word}")]
async fn check_redirect(world: &mut SettlementWorld, order_id: String) {
    let order_id = OrderId::from(order_id);
    let (_, result) = world.system().results.iter().rev().find(|(id, _)| *id == order_id).expect("No payment made");
    let url = result.as_ref().ok().and_then(|o| o.payment_url.clone()).expect("No checkout URL");
    assert!(!url.is_empty());
}

#[then(expr = "the payment for order {word} is refused with {word}")]
async fn check_refused(world: &mut SettlementWorld, order_id: String, error: String) {
    let order_id = OrderId::from(order_id);
    let (_, result) = world.system().results.iter().rev().find(|(id, _)| *id == order_id).expect("No payment made");
    let err = result.as_ref().expect_err("Payment should have been refused");
    assert!(format!("{err:?}").starts_with(&error), "Expected {error}, got {err:?}");
}

#[then(expr = "exactly one payment succeeded and the other was refused with {word}")]
async fn check_one_winner(world: &mut SettlementWorld, error: String) {
    let results = &world.system().results;
    assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 1);
    let refused = results.iter().filter_map(|(_, r)| r.as_ref().err()).collect::<Vec<_>>();
    assert_eq!(refused.len(), 1);
    assert!(format!("{:?}", refused[0]).starts_with(&error), "Expected {error}, got {:?}", refused[0]);
}

#[then(expr = "the wallet of '{word}' holds {int} NGN")]
async fn check_balance(world: &mut SettlementWorld, user_id: String, naira: i64) {
    let wallet = world.system().db.fetch_wallet(&UserId::from(user_id)).await.expect("Error fetching wallet");
    assert_eq!(wallet.expect("Wallet does not exist").balance, Kobo::from_naira(naira));
}

#[then(expr = "order {word} is {word} and {word}")]
async fn check_order(world: &mut SettlementWorld, order_id: String, payment_status: String, order_status: String) {
    let expected_payment = OrderPaymentStatus::from_str(&payment_status).expect("Invalid order payment status");
    let expected_status = OrderStatusType::from_str(&order_status).expect("Invalid order status");
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    let order = order.expect("Order does not exist");
    assert_eq!(order.payment_status, expected_payment);
    assert_eq!(order.order_status, expected_status);
}
