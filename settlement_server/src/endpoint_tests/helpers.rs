use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;
use settlement_engine::{
    db_types::{Kobo, NewOrder, OrderId, UserId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ConfirmationRetryPolicy,
    LedgerManagement,
    OrderManagement,
    SettlementConfig,
    SqliteDatabase,
};

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn test_config() -> SettlementConfig {
    SettlementConfig { gateway_timeout: Duration::from_secs(1), confirmation_retries: ConfirmationRetryPolicy::no_retries() }
}

pub async fn seed_order(db: &SqliteDatabase, order_id: &str, user_id: &str, naira: i64) {
    let order = NewOrder::new(OrderId::from(order_id), UserId::from(user_id), Kobo::from_naira(naira));
    db.insert_order(order).await.expect("Error inserting order");
}

pub async fn fund_wallet(db: &SqliteDatabase, user_id: &str, naira: i64) {
    let user_id = UserId::from(user_id);
    db.open_wallet(&user_id).await.expect("Error opening wallet");
    let reference = format!("topup_{user_id}_{naira}");
    db.credit(&user_id, Kobo::from_naira(naira), &reference).await.expect("Error funding wallet");
}

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path).to_request();
    send(req, configure).await
}

pub async fn post_request<F>(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(body.to_string());
    for &(name, value) in headers {
        req = req.insert_header((name, value));
    }
    send(req.to_request(), configure).await
}

async fn send<F>(req: actix_http::Request, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
