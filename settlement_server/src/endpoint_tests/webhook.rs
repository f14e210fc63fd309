use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use settlement_engine::{
    db_types::{Kobo, OrderId, OrderPaymentStatus, PaymentMethod, PaymentReference, PaymentStatus, UserId},
    events::EventProducers,
    traits::GatewayAuthorization,
    OrderManagement,
    PaymentRecordManagement,
    ReconciliationApi,
    SettlementApi,
    SettlementRequest,
    SqliteDatabase,
};
use spg_common::Secret;

use super::{
    helpers::{new_database, post_request, seed_order, test_config},
    mocks::MockGateway,
};
use crate::{
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, PAYSTACK_SIGNATURE_HEADER},
    routes::PaystackWebhookRoute,
};

const SECRET: &str = "sk_test_4b1d6c0a2f";

fn configure_with(db: &SqliteDatabase, signature_checks: bool) -> impl FnOnce(&mut ServiceConfig) {
    // Confirmations never call the gateway
    let api = ReconciliationApi::new(db.clone(), MockGateway::new(), test_config(), EventProducers::default());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::paystack(Secret::new(SECRET.to_string()), signature_checks))
                .service(PaystackWebhookRoute::<SqliteDatabase, MockGateway>::new()),
        );
    }
}

/// Starts a gateway payment for a fresh order, as the customer would before paying on Paystack.
async fn pending_gateway_payment(db: &SqliteDatabase, order_id: &str) -> PaymentReference {
    seed_order(db, order_id, "carol", 2000).await;
    let mut gateway = MockGateway::new();
    gateway.expect_initialize().returning(|r, _, _| Ok(GatewayAuthorization::new(format!("https://pay.test/{r}"))));
    let api = SettlementApi::new(db.clone(), gateway, test_config(), EventProducers::default());
    let request = SettlementRequest::new(
        OrderId::from(order_id),
        UserId::from("carol"),
        Kobo::from_naira(2000),
        PaymentMethod::Gateway,
    )
    .with_email("carol@example.com");
    let outcome = api.settle(request).await.expect("Error starting gateway payment");
    outcome.payment.reference
}

fn charge_event(event: &str, reference: &PaymentReference) -> String {
    let status = if event == "charge.success" { "success" } else { "failed" };
    serde_json::json!({
        "event": event,
        "data": {
            "id": 4099260516u64,
            "status": status,
            "reference": reference.as_str(),
            "amount": 200000,
            "gateway_response": "Approved",
            "currency": "NGN",
        }
    })
    .to_string()
}

async fn signed_post(db: &SqliteDatabase, body: &str) -> Result<(StatusCode, String), String> {
    let signature = calculate_hmac(SECRET, body.as_bytes());
    post_request("/webhook/paystack", body, &[(PAYSTACK_SIGNATURE_HEADER, &signature)], configure_with(db, true)).await
}

#[actix_web::test]
async fn successful_charge_pays_the_order() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "200").await;
    let body = charge_event("charge.success", &reference);
    let (status, body) = signed_post(&db, &body).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    let order = db.fetch_order(&OrderId::from("200")).await.unwrap().unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Paid);
}

#[actix_web::test]
async fn repeated_notifications_are_harmless() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "201").await;
    let body = charge_event("charge.success", &reference);
    for _ in 0..3 {
        let (status, _) = signed_post(&db, &body).await.expect("Request failed");
        assert_eq!(status, StatusCode::OK);
    }
    let payments = db.fetch_payments_for_order(&OrderId::from("201")).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Success);
}

#[actix_web::test]
async fn failed_charge_reopens_the_order() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "202").await;
    let body = charge_event("charge.failed", &reference);
    let (status, _) = signed_post(&db, &body).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    let order = db.fetch_order(&OrderId::from("202")).await.unwrap().unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Failed);
}

#[actix_web::test]
async fn other_events_are_acknowledged() {
    let db = new_database().await;
    let body = r#"{"event":"transfer.success","data":{"amount":30000,"transfer_code":"TRF_1ptvuv321ahaa7q"}}"#;
    let (status, body) = signed_post(&db, body).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Event ignored."}"#);
}

#[actix_web::test]
async fn unknown_reference_is_not_acknowledged() {
    let db = new_database().await;
    let body = charge_event("charge.success", &PaymentReference::from("spg_unknown"));
    let (status, _) = signed_post(&db, &body).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn missing_signature() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "203").await;
    let body = charge_event("charge.success", &reference);
    let err = post_request("/webhook/paystack", &body, &[], configure_with(&db, true)).await.expect_err("Expected error");
    assert_eq!(err, "No signature found.");
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn forged_signature() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "204").await;
    let body = charge_event("charge.success", &reference);
    let signature = calculate_hmac("sk_test_not_the_key", body.as_bytes());
    let err =
        post_request("/webhook/paystack", &body, &[(PAYSTACK_SIGNATURE_HEADER, &signature)], configure_with(&db, true))
            .await
            .expect_err("Expected error");
    assert_eq!(err, "Invalid signature.");
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn signature_checks_can_be_disabled() {
    let db = new_database().await;
    let reference = pending_gateway_payment(&db, "205").await;
    let body = charge_event("charge.success", &reference);
    let (status, _) =
        post_request("/webhook/paystack", &body, &[], configure_with(&db, false)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
}
