use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::MerchantContext;
use crate::models::{audit_action, CreatePayment, PaymentStatus};
use crate::payment::{self, RefundRequest};

use super::audit;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentData {
    pub order_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub customer_email: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: CreatePaymentData,
}

/// POST /payment/create
/// Create a new payment order in `pending`.
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<CreatePaymentResponse>)> {
    let conn = state.db.get()?;

    let transaction = payment::create_payment(&conn, &ctx.merchant, &input)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentResponse {
            success: true,
            message: "Payment order created successfully",
            data: CreatePaymentData {
                order_id: transaction.order_id,
                status: transaction.status,
                amount: transaction.amount,
                customer_email: transaction.customer_email,
            },
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    pub order_id: String,
    pub amount: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentData {
    pub order_id: String,
    pub refunded_amount: i64,
    pub refund_reason: String,
}

#[derive(Debug, Serialize)]
pub struct RefundPaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: RefundPaymentData,
}

/// POST /payment/refund
/// Refund a successful transaction, at most once. Fans out
/// `payment.refunded` and emails the customer after the commit.
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    headers: HeaderMap,
    Json(request): Json<RefundPaymentRequest>,
) -> Result<Json<RefundPaymentResponse>> {
    let conn = state.db.get()?;

    let transaction = payment::refund_payment(
        &conn,
        &ctx.merchant.id,
        RefundRequest {
            order_id: &request.order_id,
            amount: request.amount,
            reason: request.reason.as_deref(),
        },
    )?;

    if let Err(e) = state.webhooks.fan_out(&conn, &transaction) {
        tracing::error!(order_id = %transaction.order_id, "Webhook fan-out failed: {}", e);
    }
    state.email.spawn_refund(&transaction);

    audit(
        &state,
        &ctx.merchant.id,
        audit_action::REFUND_ISSUED,
        &format!(
            "Refunded {} on order {}",
            request.amount, transaction.order_id
        ),
        &headers,
    );

    Ok(Json(RefundPaymentResponse {
        success: true,
        message: "Refund processed",
        data: RefundPaymentData {
            order_id: transaction.order_id,
            refunded_amount: transaction.refunded_amount.unwrap_or(request.amount),
            refund_reason: transaction.refund_reason.unwrap_or_default(),
        },
    }))
}
