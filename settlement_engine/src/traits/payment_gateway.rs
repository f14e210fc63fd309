use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Kobo, PaymentReference};

/// Where to send the customer to complete a gateway transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAuthorization {
    pub authorization_url: String,
    pub access_code: Option<String>,
}

impl GatewayAuthorization {
    pub fn new<S: Into<String>>(authorization_url: S) -> Self {
        Self { authorization_url: authorization_url.into(), access_code: None }
    }
}

/// The gateway's view of a transaction when it is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayVerification {
    Success,
    Failed,
    /// The customer has not finished (or abandoned) the transaction yet.
    Pending,
}

/// An external payment processor.
///
/// Implementations must not retry on their own; the settlement engine bounds every call with its own timeout.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Starts a transaction for `amount` kobo, identified by `reference`.
    async fn initialize(
        &self,
        reference: &PaymentReference,
        amount: Kobo,
        email: &str,
    ) -> Result<GatewayAuthorization, GatewayError>;

    /// Asks the gateway for the current state of the transaction identified by `reference`.
    async fn verify(&self, reference: &PaymentReference) -> Result<GatewayVerification, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment gateway sent an invalid response. {0}")]
    InvalidResponse(String),
}
