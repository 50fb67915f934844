use axum::{extract::State, http::HeaderMap, Extension};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::middleware::MerchantContext;
use crate::models::{audit_action, AuditLog};
use crate::pagination::{Paginated, PaginationQuery};

use super::audit;

/// GET /audit-logs
/// The merchant's audit trail, newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<AuditLog>>> {
    let conn = state.audit.get()?;

    let limit = query.limit();
    let offset = query.offset();
    let (logs, total) =
        queries::list_audit_logs_by_merchant_paginated(&conn, &ctx.merchant.id, limit, offset)?;

    Ok(Json(Paginated::new(logs, total, limit, offset)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResponse {
    pub success: bool,
    pub sandbox_mode: bool,
}

/// POST /sandbox
/// Toggle the merchant's sandbox flag. New transactions copy the flag into
/// their test-mode marker.
pub async fn toggle_sandbox(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    headers: HeaderMap,
) -> Result<Json<SandboxResponse>> {
    let conn = state.db.get()?;

    let merchant =
        queries::set_merchant_sandbox_mode(&conn, &ctx.merchant.id, !ctx.merchant.sandbox_mode)?
            .or_not_found(msg::MERCHANT_NOT_FOUND)?;

    audit(
        &state,
        &merchant.id,
        audit_action::SANDBOX_TOGGLED,
        &format!("Sandbox mode set to {}", merchant.sandbox_mode),
        &headers,
    );

    Ok(Json(SandboxResponse {
        success: true,
        sandbox_mode: merchant.sandbox_mode,
    }))
}
