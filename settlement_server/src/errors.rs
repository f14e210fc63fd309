use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use settlement_engine::SettlementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    SettlementError(#[from] SettlementError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SettlementError(e) => settlement_status_code(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn settlement_status_code(e: &SettlementError) -> StatusCode {
    match e {
        SettlementError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        SettlementError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
        SettlementError::OrderAlreadyPaid(_) => StatusCode::BAD_REQUEST,
        SettlementError::OrderCancelled(_) => StatusCode::BAD_REQUEST,
        SettlementError::UnexpectedConfirmation(_) => StatusCode::BAD_REQUEST,
        SettlementError::DuplicateReference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SettlementError::OrderOwnershipMismatch { .. } => StatusCode::FORBIDDEN,
        SettlementError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::WalletNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
        SettlementError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        SettlementError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SettlementError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
