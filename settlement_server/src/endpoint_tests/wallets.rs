use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use settlement_engine::{SqliteDatabase, WalletApi};

use super::helpers::{fund_wallet, get_request, new_database, post_request};
use crate::routes::{WalletBalanceRoute, WalletHistoryRoute, WalletTopUpRoute};

fn configure_with(db: &SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    let api = WalletApi::new(db.clone());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api))
            .service(WalletBalanceRoute::<SqliteDatabase>::new())
            .service(WalletTopUpRoute::<SqliteDatabase>::new())
            .service(WalletHistoryRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn wallet_balance() {
    let db = new_database().await;
    fund_wallet(&db, "alice", 5000).await;
    let (status, body) = get_request("/wallets/alice", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"user_id":"alice","balance":500000}"#);
}

#[actix_web::test]
async fn missing_wallet() {
    let db = new_database().await;
    let (status, body) = get_request("/wallets/nobody", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"No wallet exists for user nobody"}"#);
}

#[actix_web::test]
async fn top_up_opens_and_credits_a_wallet() {
    let db = new_database().await;
    let body = r#"{"amount":250000,"reference":"ps_fund_1"}"#;
    let (status, body) =
        post_request("/wallets/bob/top-ups", body, &[], configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"user_id":"bob","balance":250000}"#);

    let (status, body) = get_request("/wallets/bob", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"user_id":"bob","balance":250000}"#);
}

#[actix_web::test]
async fn repeated_top_up_is_credited_once() {
    let db = new_database().await;
    fund_wallet(&db, "carol", 100).await;
    let body = r#"{"amount":5000,"reference":"ps_fund_2"}"#;
    for _ in 0..2 {
        let (status, res) =
            post_request("/wallets/carol/top-ups", body, &[], configure_with(&db)).await.expect("Request failed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res, r#"{"user_id":"carol","balance":15000}"#);
    }
}

#[actix_web::test]
async fn top_up_must_be_positive() {
    let db = new_database().await;
    let body = r#"{"amount":0,"reference":"ps_fund_3"}"#;
    let (status, _) =
        post_request("/wallets/dave/top-ups", body, &[], configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_request("/wallets/dave", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn wallet_history() {
    let db = new_database().await;
    fund_wallet(&db, "erin", 40).await;
    let body = r#"{"amount":1000,"reference":"ps_fund_4"}"#;
    post_request("/wallets/erin/top-ups", body, &[], configure_with(&db)).await.expect("Request failed");

    let (status, body) = get_request("/wallets/erin/history", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let entries: Value = serde_json::from_str(&body).expect("Invalid JSON");
    let entries = entries.as_array().expect("Expected a list");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["entry_type"], "Credit");
    assert_eq!(entries[0]["amount"], 4000);
    assert_eq!(entries[1]["reference"], "ps_fund_4");
    assert_eq!(entries[1]["balance_after"], 5000);

    let (status, _) = get_request("/wallets/nobody/history", configure_with(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}
