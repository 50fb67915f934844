use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path, Query};
use crate::middleware::MerchantContext;
use crate::models::{audit_action, Dispute, DisputeResponse, DisputeStatus, OpenDispute};
use crate::payment::disputes;

use super::audit;

#[derive(Debug, Serialize)]
pub struct DisputeListResponse {
    pub success: bool,
    pub data: Vec<Dispute>,
}

#[derive(Debug, Serialize)]
pub struct DisputeItemResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: Dispute,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListDisputesQuery {
    /// Filter by status; omit or "all" for everything.
    pub status: Option<String>,
}

pub(crate) fn parse_status_filter(raw: Option<&str>) -> Option<DisputeStatus> {
    match raw {
        None | Some("all") => None,
        Some(s) => s.parse().ok(),
    }
}

/// GET /disputes
/// List the merchant's disputes, newest first.
pub async fn list_disputes(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Query(query): Query<ListDisputesQuery>,
) -> Result<Json<DisputeListResponse>> {
    let conn = state.db.get()?;

    let status = parse_status_filter(query.status.as_deref());
    let disputes = queries::list_disputes_by_merchant(&conn, &ctx.merchant.id, status)?;

    Ok(Json(DisputeListResponse {
        success: true,
        data: disputes,
    }))
}

/// POST /disputes
/// Open a dispute against one of the merchant's transactions (the dashboard
/// simulates the customer side). At most one dispute per transaction.
pub async fn create_dispute(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    headers: HeaderMap,
    Json(input): Json<OpenDispute>,
) -> Result<(StatusCode, Json<DisputeItemResponse>)> {
    let conn = state.db.get()?;

    let dispute = disputes::open_dispute(&conn, &ctx.merchant.id, &input)?;

    state.email.spawn_dispute_opened(&ctx.merchant, &dispute);
    audit(
        &state,
        &ctx.merchant.id,
        audit_action::DISPUTE_OPENED,
        &format!(
            "Dispute {} opened for order {}",
            dispute.id, dispute.order_id
        ),
        &headers,
    );

    Ok((
        StatusCode::CREATED,
        Json(DisputeItemResponse {
            success: true,
            message: "Dispute created successfully",
            data: dispute,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DisputePath {
    pub dispute_id: String,
}

/// POST /disputes/{dispute_id}/respond
/// Submit the merchant's response and evidence; moves the dispute to
/// `under_review`.
pub async fn respond_to_dispute(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Path(path): Path<DisputePath>,
    headers: HeaderMap,
    Json(input): Json<DisputeResponse>,
) -> Result<Json<DisputeItemResponse>> {
    let conn = state.db.get()?;

    let dispute = disputes::respond_to_dispute(&conn, &ctx.merchant.id, &path.dispute_id, &input)?;

    audit(
        &state,
        &ctx.merchant.id,
        audit_action::DISPUTE_RESPONSE_SUBMITTED,
        &format!(
            "Merchant responded to dispute {} for order {}",
            dispute.id, dispute.order_id
        ),
        &headers,
    );

    Ok(Json(DisputeItemResponse {
        success: true,
        message: "Response submitted successfully",
        data: dispute,
    }))
}
