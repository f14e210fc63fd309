//! A [`PaymentGateway`] backed by the Paystack transaction API.
//!
//! Only two calls are needed:
//! * `POST /transaction/initialize` starts a transaction and returns the checkout URL for the customer.
//! * `GET /transaction/verify/{reference}` reports the current state of a transaction.
//!
//! Paystack wraps every response in a `{status, message, data}` envelope.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use settlement_engine::{
    db_types::{Kobo, PaymentReference},
    traits::{GatewayAuthorization, GatewayError, GatewayVerification},
    PaymentGateway,
};

use crate::{config::PaystackConfig, errors::ServerError};

#[derive(Clone)]
pub struct PaystackClient {
    base_url: String,
    callback_url: Option<String>,
    client: Arc<Client>,
}

impl std::fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaystackClient ({})", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct PaystackResponse<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

impl PaystackClient {
    pub fn new(config: &PaystackConfig, timeout: Duration) -> Result<Self, ServerError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, callback_url: config.callback_url.clone(), client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        trace!("🌐️ Sending Paystack request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Unavailable(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("🌐️ Paystack returned {status}. {message}");
            return Err(GatewayError::Rejected { status: status.as_u16(), message });
        }
        let envelope = response.json::<PaystackResponse<T>>().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::InvalidResponse(e.to_string())
            }
        })?;
        if !envelope.status {
            return Err(GatewayError::Rejected { status: status.as_u16(), message: envelope.message });
        }
        envelope.data.ok_or_else(|| GatewayError::InvalidResponse(format!("No data in response. {}", envelope.message)))
    }
}

impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        reference: &PaymentReference,
        amount: Kobo,
        email: &str,
    ) -> Result<GatewayAuthorization, GatewayError> {
        let body = InitializeRequest {
            email,
            amount: amount.value(),
            reference: reference.as_str(),
            callback_url: self.callback_url.as_deref(),
        };
        debug!("🌐️ Initializing Paystack transaction [{reference}] for {amount}");
        let data =
            self.rest_query::<InitializeData, _>(Method::POST, "/transaction/initialize", Some(body)).await?;
        info!("🌐️ Paystack transaction [{reference}] initialized");
        Ok(GatewayAuthorization { authorization_url: data.authorization_url, access_code: data.access_code })
    }

    async fn verify(&self, reference: &PaymentReference) -> Result<GatewayVerification, GatewayError> {
        let path = format!("/transaction/verify/{reference}");
        let data = self.rest_query::<VerifyData, ()>(Method::GET, &path, None).await?;
        let verdict = verification_from_status(&data.status);
        debug!("🌐️ Paystack reports transaction [{reference}] as '{}' ({verdict:?})", data.status);
        Ok(verdict)
    }
}

/// Paystack transaction states that are final. Everything else (`ongoing`, `pending`, `processing`, `queued`...) means
/// the customer may still complete the payment.
pub fn verification_from_status(status: &str) -> GatewayVerification {
    match status {
        "success" => GatewayVerification::Success,
        "failed" | "abandoned" | "reversed" => GatewayVerification::Failed,
        _ => GatewayVerification::Pending,
    }
}
