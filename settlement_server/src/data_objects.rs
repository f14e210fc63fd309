use std::fmt::Display;

use serde::{Deserialize, Serialize};
use settlement_engine::{
    db_types::{Kobo, OrderId, PaymentMethod, PaymentReference, UserId},
    SettlementRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The body of `POST /payments`. Amounts are in kobo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Kobo,
    #[serde(default)]
    pub email: String,
    pub payment_method: PaymentMethod,
}

impl From<NewPaymentRequest> for SettlementRequest {
    fn from(req: NewPaymentRequest) -> Self {
        SettlementRequest::new(req.order_id, req.user_id, req.amount, req.payment_method).with_email(req.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub user_id: UserId,
    pub balance: Kobo,
}

/// The body of `POST /wallets/{user_id}/top-ups`. `reference` identifies the funding transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub amount: Kobo,
    pub reference: String,
}

/// A Paystack webhook notification. Only the fields the server acts on are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackWebhookEvent {
    pub event: String,
    pub data: PaystackEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackEventData {
    pub reference: PaymentReference,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}
