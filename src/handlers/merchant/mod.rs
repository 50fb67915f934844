//! Merchant API: authenticated with the merchant's secret key.

mod account;
mod disputes;
mod payments;
mod transactions;
mod webhooks;

pub use account::*;
pub use disputes::*;
pub use payments::*;
pub use transactions::*;
pub use webhooks::*;

use axum::{
    http::HeaderMap,
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::db::{queries, AppState};
use crate::middleware::merchant_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payment/create", post(create_payment))
        .route("/payment/refund", post(refund_payment))
        .route("/transactions", get(list_transactions))
        .route("/disputes", get(list_disputes))
        .route("/disputes", post(create_dispute))
        .route("/disputes/{dispute_id}/respond", post(respond_to_dispute))
        .route("/webhooks", get(list_webhooks))
        .route("/webhooks", post(create_webhook))
        .route("/webhooks/{webhook_id}", delete(delete_webhook))
        .route("/webhooks/{webhook_id}/test", post(test_webhook))
        .route("/audit-logs", get(list_audit_logs))
        .route("/sandbox", post(toggle_sandbox))
        .layer(middleware::from_fn_with_state(state, merchant_auth))
}

/// Client metadata recorded in audit entries.
fn request_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    (ip, user_agent)
}

/// Best-effort audit write; failures are logged, never surfaced.
fn audit(state: &AppState, merchant_id: &str, action: &str, details: &str, headers: &HeaderMap) {
    let (ip, user_agent) = request_meta(headers);
    let result = state.audit.get().map_err(crate::error::AppError::from).and_then(|conn| {
        queries::create_audit_log(
            &conn,
            state.audit_log_enabled,
            merchant_id,
            action,
            details,
            ip.as_deref(),
            user_agent.as_deref(),
        )
    });
    if let Err(e) = result {
        tracing::warn!(merchant_id, action, "Failed to write audit log: {}", e);
    }
}
