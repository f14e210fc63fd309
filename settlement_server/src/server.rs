use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use settlement_engine::{
    events::EventProducers,
    ReconciliationApi,
    SettlementApi,
    SqliteDatabase,
    WalletApi,
};

use crate::{
    audit_hooks::create_audit_event_handlers,
    config::ServerConfig,
    errors::ServerError,
    middleware::HmacMiddlewareFactory,
    paystack::PaystackClient,
    reconciliation_worker::start_reconciliation_worker,
    routes::{
        health,
        CreatePaymentRoute,
        PaymentByReferenceRoute,
        PaymentsForOrderRoute,
        PaystackWebhookRoute,
        WalletBalanceRoute,
        WalletHistoryRoute,
        WalletTopUpRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackClient::new(&config.paystack, config.settlement.gateway_timeout)?;
    let handlers = create_audit_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_reconciliation_worker(
        db.clone(),
        gateway.clone(),
        config.settlement,
        producers.clone(),
        config.reconciliation_interval,
        config.stale_payment_age,
    );
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(ServerError::IOError)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackClient,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    info!("💻️ Paystack webhook signature checks enabled: {}", config.webhook_signature_checks);
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), gateway.clone(), config.settlement, producers.clone());
        let reconciliation_api =
            ReconciliationApi::new(db.clone(), gateway.clone(), config.settlement, producers.clone());
        let wallet_api = WalletApi::new(db.clone());
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::paystack(
                config.paystack.secret_key.clone(),
                config.webhook_signature_checks,
            ))
            .service(PaystackWebhookRoute::<SqliteDatabase, PaystackClient>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(wallet_api))
            .service(health)
            .service(CreatePaymentRoute::<SqliteDatabase, PaystackClient>::new())
            .service(PaymentByReferenceRoute::<SqliteDatabase, PaystackClient>::new())
            .service(PaymentsForOrderRoute::<SqliteDatabase, PaystackClient>::new())
            .service(WalletBalanceRoute::<SqliteDatabase>::new())
            .service(WalletTopUpRoute::<SqliteDatabase>::new())
            .service(WalletHistoryRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
