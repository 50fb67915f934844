use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not valid for the entity's current lifecycle state
    /// (refunding a non-success transaction, re-settling, etc.).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body matching the ZeroPay wire format: `{"success": false, "message": ...}`.
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        AppError::Validation(rej.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        AppError::Validation(rej.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rej: PathRejection) -> Self {
        AppError::Validation(rej.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Extension for converting `Option<T>` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

/// User-facing message constants, shared between handlers and tests.
pub mod msg {
    pub const MERCHANT_NOT_FOUND: &str = "Merchant not found";
    pub const TRANSACTION_NOT_FOUND: &str = "Transaction not found";
    pub const PAYMENT_NOT_FOUND: &str = "Payment not found";
    pub const DISPUTE_NOT_FOUND: &str = "Dispute not found";
    pub const WEBHOOK_NOT_FOUND: &str = "Webhook not found";

    pub const INVALID_ORDER_ID: &str = "Invalid order ID format";
    pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be a positive number";
    pub const INVALID_CUSTOMER_EMAIL: &str = "Invalid customer email address";
    pub const MISSING_CUSTOMER_MESSAGE: &str = "Customer message is required";
    pub const MISSING_MERCHANT_RESPONSE: &str = "Merchant response is required";
    pub const INVALID_WEBHOOK_URL: &str = "Invalid URL format";
    pub const NO_WEBHOOK_EVENTS: &str = "At least one event is required";
    pub const INVALID_DECISION: &str = "Invalid decision. Must be 'merchant' or 'customer'";

    pub const ALREADY_PROCESSED: &str = "This payment has already been processed.";
    pub const ONLY_SUCCESS_REFUNDABLE: &str = "Only successful transactions can be refunded";
    pub const ALREADY_REFUNDED: &str = "Transaction has already been refunded";
    pub const REFUND_EXCEEDS_AMOUNT: &str = "Refund amount exceeds transaction amount";

    pub const DISPUTE_EXISTS: &str = "Transaction already has a dispute";
    pub const DISPUTE_ALREADY_RESOLVED: &str = "Dispute already resolved";
    pub const DISPUTE_UNDER_REVIEW: &str = "Dispute is already under review";
}
