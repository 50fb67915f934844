use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::middleware::MerchantContext;
use crate::models::{audit_action, CreateWebhook, WebhookRegistration};

use super::audit;

#[derive(Debug, Serialize)]
pub struct WebhookListResponse {
    pub success: bool,
    pub data: Vec<WebhookRegistration>,
}

#[derive(Debug, Serialize)]
pub struct WebhookItemResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: WebhookRegistration,
}

#[derive(Debug, Serialize)]
pub struct WebhookAckResponse {
    pub success: bool,
    pub message: &'static str,
}

/// GET /webhooks
/// List the merchant's webhook registrations.
pub async fn list_webhooks(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
) -> Result<Json<WebhookListResponse>> {
    let conn = state.db.get()?;

    let webhooks = queries::list_webhooks_by_merchant(&conn, &ctx.merchant.id)?;

    Ok(Json(WebhookListResponse {
        success: true,
        data: webhooks,
    }))
}

/// POST /webhooks
/// Register a webhook endpoint. The signing secret is generated server-side
/// and returned with the registration.
pub async fn create_webhook(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    headers: HeaderMap,
    Json(input): Json<CreateWebhook>,
) -> Result<(StatusCode, Json<WebhookItemResponse>)> {
    if !input.url.starts_with("http://") && !input.url.starts_with("https://") {
        return Err(AppError::Validation(msg::INVALID_WEBHOOK_URL.into()));
    }
    if input.events.is_empty() {
        return Err(AppError::Validation(msg::NO_WEBHOOK_EVENTS.into()));
    }

    let conn = state.db.get()?;
    let webhook = queries::create_webhook(&conn, &ctx.merchant.id, &input)?;

    audit(
        &state,
        &ctx.merchant.id,
        audit_action::WEBHOOK_CREATED,
        &format!("Webhook {} registered for {}", webhook.id, webhook.url),
        &headers,
    );

    Ok((
        StatusCode::CREATED,
        Json(WebhookItemResponse {
            success: true,
            message: "Webhook created successfully",
            data: webhook,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct WebhookPath {
    pub webhook_id: String,
}

/// DELETE /webhooks/{webhook_id}
pub async fn delete_webhook(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Path(path): Path<WebhookPath>,
    headers: HeaderMap,
) -> Result<Json<WebhookAckResponse>> {
    let conn = state.db.get()?;

    if !queries::delete_webhook(&conn, &path.webhook_id, &ctx.merchant.id)? {
        return Err(AppError::NotFound(msg::WEBHOOK_NOT_FOUND.into()));
    }

    audit(
        &state,
        &ctx.merchant.id,
        audit_action::WEBHOOK_DELETED,
        &format!("Webhook {} deleted", path.webhook_id),
        &headers,
    );

    Ok(Json(WebhookAckResponse {
        success: true,
        message: "Webhook deleted",
    }))
}

/// POST /webhooks/{webhook_id}/test
/// Acknowledge a test request for the registration. Real gateways POST a
/// sample payload to the endpoint; the mock only confirms the registration
/// exists.
pub async fn test_webhook(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Path(path): Path<WebhookPath>,
) -> Result<Json<WebhookAckResponse>> {
    let conn = state.db.get()?;

    queries::get_webhook_for_merchant(&conn, &path.webhook_id, &ctx.merchant.id)?
        .or_not_found(msg::WEBHOOK_NOT_FOUND)?;

    Ok(Json(WebhookAckResponse {
        success: true,
        message: "Test event sent (mock)",
    }))
}
