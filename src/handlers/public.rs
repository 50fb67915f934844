//! Public checkout endpoints (no authentication).

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{PaymentMethod, PaymentStatus};
use crate::payment;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub status: PaymentStatus,
    pub order_id: String,
}

/// POST /payment/verify
/// Settle a pending payment (mock outcome) and return the final status.
///
/// Webhook fan-out and the customer email are dispatched after the status
/// commit; neither delays nor fails this response.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let conn = state.db.get()?;

    let transaction = payment::settle_payment(&conn, &request.order_id, state.settlement)?;

    if let Err(e) = state.webhooks.fan_out(&conn, &transaction) {
        tracing::error!(order_id = %transaction.order_id, "Webhook fan-out failed: {}", e);
    }
    if transaction.status == PaymentStatus::Success {
        state.email.spawn_payment_success(&transaction);
    }

    Ok(Json(VerifyPaymentResponse {
        success: true,
        status: transaction.status,
        order_id: transaction.order_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusPath {
    pub order_id: String,
}

/// Customer-visible transaction snapshot; internal fields are not exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusData {
    pub order_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub data: PaymentStatusData,
}

/// GET /payment/status/{order_id}
/// Poll the status of a payment from the checkout page.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(path): Path<StatusPath>,
) -> Result<Json<PaymentStatusResponse>> {
    let conn = state.db.get()?;

    let transaction = queries::get_transaction_by_order_id(&conn, &path.order_id)?
        .or_not_found(msg::PAYMENT_NOT_FOUND)?;

    Ok(Json(PaymentStatusResponse {
        success: true,
        data: PaymentStatusData {
            order_id: transaction.order_id,
            status: transaction.status,
            amount: transaction.amount,
            currency: transaction.currency,
            method: transaction.method,
        },
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/payment/verify", post(verify_payment))
        .route("/payment/status/{order_id}", get(payment_status))
}
