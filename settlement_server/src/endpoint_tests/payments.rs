use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use settlement_engine::{
    events::EventProducers,
    traits::{GatewayAuthorization, GatewayError},
    SettlementApi,
    SqliteDatabase,
};

use super::{
    helpers::{fund_wallet, get_request, new_database, post_request, seed_order, test_config},
    mocks::MockGateway,
};
use crate::routes::{CreatePaymentRoute, PaymentByReferenceRoute, PaymentsForOrderRoute};

fn configure_with(db: &SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    let api = SettlementApi::new(db.clone(), gateway, test_config(), EventProducers::default());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api))
            .service(CreatePaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaymentByReferenceRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaymentsForOrderRoute::<SqliteDatabase, MockGateway>::new());
    }
}

fn payment_body(order_id: &str, user_id: &str, naira: i64, method: &str) -> String {
    serde_json::json!({
        "order_id": order_id,
        "user_id": user_id,
        "amount": naira * 100,
        "email": format!("{user_id}@example.com"),
        "payment_method": method,
    })
    .to_string()
}

#[actix_web::test]
async fn wallet_payment() {
    let db = new_database().await;
    seed_order(&db, "100", "alice", 1500).await;
    fund_wallet(&db, "alice", 5000).await;
    // A wallet payment must never touch the gateway
    let gateway = MockGateway::new();
    let body = payment_body("100", "alice", 1500, "wallet");
    let (status, body) =
        post_request("/payments", &body, &[], configure_with(&db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["payment"]["status"], "Success");
    assert_eq!(outcome["payment"]["method"], "wallet");
    assert_eq!(outcome["payment"]["amount"], 150000);
    assert!(outcome["payment_url"].is_null());
}

#[actix_web::test]
async fn gateway_payment() {
    let db = new_database().await;
    seed_order(&db, "101", "carol", 2000).await;
    let mut gateway = MockGateway::new();
    gateway.expect_initialize().times(1).returning(|reference, amount, email| {
        assert_eq!(amount.value(), 200000);
        assert_eq!(email, "carol@example.com");
        Ok(GatewayAuthorization::new(format!("https://checkout.paystack.com/{reference}")))
    });
    let body = payment_body("101", "carol", 2000, "gateway");
    let (status, body) =
        post_request("/payments", &body, &[], configure_with(&db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["payment"]["status"], "Pending");
    let reference = outcome["payment"]["reference"].as_str().unwrap();
    assert!(reference.starts_with("spg_"));
    assert_eq!(outcome["payment_url"], format!("https://checkout.paystack.com/{reference}"));
}

#[actix_web::test]
async fn insufficient_balance() {
    let db = new_database().await;
    seed_order(&db, "102", "bob", 1500).await;
    fund_wallet(&db, "bob", 1000).await;
    let body = payment_body("102", "bob", 1500, "wallet");
    let (status, body) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let err: Value = serde_json::from_str(&body).unwrap();
    assert!(err["error"].as_str().unwrap().contains("insufficient"), "{body}");
}

#[actix_web::test]
async fn unknown_order() {
    let db = new_database().await;
    let body = payment_body("404", "alice", 10, "wallet");
    let (status, _) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn someone_elses_order() {
    let db = new_database().await;
    seed_order(&db, "103", "alice", 100).await;
    fund_wallet(&db, "mallory", 500).await;
    let body = payment_body("103", "mallory", 100, "wallet");
    let (status, _) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_amounts() {
    let db = new_database().await;
    seed_order(&db, "104", "alice", 100).await;
    fund_wallet(&db, "alice", 500).await;
    let body = payment_body("104", "alice", 0, "wallet");
    let (status, _) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = payment_body("104", "alice", 99, "wallet");
    let (status, _) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_request() {
    let db = new_database().await;
    let body = r#"{"order_id": "105", "amount": 100, "payment_method": "cheque"}"#;
    let (status, _) =
        post_request("/payments", body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn gateway_refuses_the_transaction() {
    let db = new_database().await;
    seed_order(&db, "106", "erin", 800).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize()
        .returning(|_, _, _| Err(GatewayError::Rejected { status: 401, message: "Invalid key".into() }));
    let body = payment_body("106", "erin", 800, "gateway");
    let (status, body) =
        post_request("/payments", &body, &[], configure_with(&db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Invalid key"), "{body}");
}

#[actix_web::test]
async fn fetch_payments() {
    let db = new_database().await;
    seed_order(&db, "107", "alice", 300).await;
    fund_wallet(&db, "alice", 1000).await;
    let body = payment_body("107", "alice", 300, "wallet");
    let (_, body) =
        post_request("/payments", &body, &[], configure_with(&db, MockGateway::new())).await.expect("Request failed");
    let outcome: Value = serde_json::from_str(&body).unwrap();
    let reference = outcome["payment"]["reference"].as_str().unwrap().to_string();

    let path = format!("/payments/{reference}");
    let (status, body) = get_request(&path, configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["reference"], reference.as_str());
    assert_eq!(payment["order_id"], "107");
    assert_eq!(payment["status"], "Success");

    let (status, body) =
        get_request("/orders/107/payments", configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let payments: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["reference"], reference.as_str());

    let (status, body) =
        get_request("/orders/999/payments", configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn unknown_payment_reference() {
    let db = new_database().await;
    let (status, body) =
        get_request("/payments/spg_nope", configure_with(&db, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("spg_nope"), "{body}");
}
