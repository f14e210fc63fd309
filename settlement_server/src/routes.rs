//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers must never block the current thread. Every
//! database and gateway call below is awaited, so a worker keeps serving other requests while one is in flight.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::Value;
use settlement_engine::{
    db_types::{ConfirmationStatus, OrderId, PaymentReference, UserId},
    LedgerManagement,
    PaymentGateway,
    ReconciliationApi,
    SettlementApi,
    SettlementDatabase,
    WalletApi,
};

use crate::{
    data_objects::{JsonResponse, NewPaymentRequest, PaystackWebhookEvent, TopUpRequest, WalletBalance},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments" impl SettlementDatabase, PaymentGateway);
/// Route handler for `POST /payments`.
///
/// Settles an order from the customer's wallet, or starts a gateway transaction for it. The response is `201 Created`
/// with the payment record and, for gateway payments, the `payment_url` the customer must be sent to.
///
/// A gateway that does not answer in time gives `504`, but the payment is still recorded as pending and will be
/// reconciled later, so clients should not simply retry with a new payment.
pub async fn create_payment<B, G>(
    body: web::Json<NewPaymentRequest>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!(
        "💻️ POST payment of {} for order {} by {} ({})",
        request.amount, request.order_id, request.user_id, request.payment_method
    );
    let outcome = api.settle(request.into()).await.map_err(|e| {
        info!("💻️ Payment refused. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(outcome))
}

route!(payment_by_reference => Get "/payments/{reference}" impl SettlementDatabase, PaymentGateway);
pub async fn payment_by_reference<B, G>(
    path: web::Path<String>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let reference = PaymentReference::from(path.into_inner());
    debug!("💻️ GET payment [{reference}]");
    let payment = api.fetch_payment(&reference).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(payments_for_order => Get "/orders/{order_id}/payments" impl SettlementDatabase, PaymentGateway);
/// Every payment attempt made against an order, oldest first. An order with no attempts gives an empty list.
pub async fn payments_for_order<B, G>(
    path: web::Path<String>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET payments for order {order_id}");
    let payments = api.payments_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

//----------------------------------------------   Wallets  ----------------------------------------------------
route!(wallet_balance => Get "/wallets/{user_id}" impl LedgerManagement);
pub async fn wallet_balance<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = UserId::from(path.into_inner());
    debug!("💻️ GET wallet balance for {user_id}");
    let balance = api.balance(&user_id).await?;
    Ok(HttpResponse::Ok().json(WalletBalance { user_id, balance }))
}

route!(wallet_top_up => Post "/wallets/{user_id}/top-ups" impl LedgerManagement);
/// Credits a customer's wallet. Repeating a top-up with the same reference does not credit it twice.
pub async fn wallet_top_up<B: LedgerManagement>(
    path: web::Path<String>,
    body: web::Json<TopUpRequest>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = UserId::from(path.into_inner());
    let TopUpRequest { amount, reference } = body.into_inner();
    debug!("💻️ POST top-up of {amount} for {user_id} [{reference}]");
    let wallet = api.top_up(&user_id, amount, &reference).await?;
    Ok(HttpResponse::Ok().json(WalletBalance { user_id, balance: wallet.balance }))
}

route!(wallet_history => Get "/wallets/{user_id}/history" impl LedgerManagement);
pub async fn wallet_history<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = UserId::from(path.into_inner());
    debug!("💻️ GET wallet history for {user_id}");
    api.wallet(&user_id).await?;
    let entries = api.history(&user_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(paystack_webhook => Post "/paystack" impl SettlementDatabase, PaymentGateway);
/// Route handler for Paystack event notifications.
///
/// Signatures are checked by the middleware wrapping the webhook scope, so anything reaching this handler came from
/// Paystack. `charge.success` and `charge.failed` are applied to the matching payment. Every other event is
/// acknowledged and ignored, otherwise Paystack keeps resending it.
///
/// Any non-2xx response makes Paystack retry the notification later. This is what we want when, for example, the
/// payment cannot be found yet.
pub async fn paystack_webhook<B, G>(
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let body = body.into_inner();
    let event_name = body["event"].as_str().unwrap_or_default().to_string();
    let status = match event_name.as_str() {
        "charge.success" => ConfirmationStatus::Success,
        "charge.failed" => ConfirmationStatus::Failed,
        _ => {
            debug!("💻️ Ignoring Paystack event '{event_name}'");
            return Ok(HttpResponse::Ok().json(JsonResponse::success("Event ignored.")));
        },
    };
    let event = serde_json::from_value::<PaystackWebhookEvent>(body).map_err(|e| {
        warn!("💻️ Could not read Paystack '{event_name}' event. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let reference = event.data.reference;
    info!("💻️ Paystack reports [{reference}] as {status}");
    let payment = api.apply_confirmation(&reference, status).await.map_err(|e| {
        warn!("💻️ Could not apply Paystack confirmation for [{reference}]. {e}");
        e
    })?;
    let message = format!("Payment {} is {}", payment.reference, payment.status);
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}
