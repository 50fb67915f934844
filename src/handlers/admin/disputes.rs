use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::AdminContext;
use crate::models::{audit_action, Dispute, DisputeDecision};
use crate::payment::disputes;

#[derive(Debug, Deserialize)]
pub struct ResolvePath {
    pub dispute_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    pub decision: DisputeDecision,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveDisputeResponse {
    pub success: bool,
    pub message: String,
    pub data: Dispute,
}

/// POST /disputes/{dispute_id}/resolve
/// Record the admin decision. Deciding for the customer triggers the refund
/// step against the underlying transaction; if that transaction was already
/// refunded independently, the refund is a silent no-op so re-driving a
/// resolution stays idempotent from the admin's perspective.
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(path): Path<ResolvePath>,
    Json(request): Json<ResolveDisputeRequest>,
) -> Result<Json<ResolveDisputeResponse>> {
    let conn = state.db.get()?;

    let outcome = disputes::resolve_dispute(
        &conn,
        &path.dispute_id,
        request.decision,
        &admin.email,
        request.notes.as_deref().unwrap_or(""),
    )?;

    if let Some(refund) = &outcome.refund {
        match disputes::apply_dispute_refund(&conn, refund)? {
            Some(transaction) => {
                if let Err(e) = state.webhooks.fan_out(&conn, &transaction) {
                    tracing::error!(
                        order_id = %transaction.order_id,
                        "Webhook fan-out failed: {}",
                        e
                    );
                }
                state.email.spawn_refund(&transaction);
            }
            None => {
                tracing::info!(
                    dispute_id = %outcome.dispute.id,
                    transaction_id = %refund.transaction_id,
                    "Dispute refund skipped; transaction no longer refundable"
                );
            }
        }
    }

    // Resolution is an admin action on the merchant's record; file it under
    // the merchant so their audit trail shows the outcome.
    let audit_conn = state.audit.get();
    if let Ok(audit_conn) = audit_conn {
        use crate::db::queries;
        if let Err(e) = queries::create_audit_log(
            &audit_conn,
            state.audit_log_enabled,
            &outcome.dispute.merchant_id,
            audit_action::DISPUTE_RESOLVED,
            &format!(
                "Dispute {} resolved in favor of {}",
                outcome.dispute.id,
                request.decision.as_str()
            ),
            None,
            None,
        ) {
            tracing::warn!("Failed to write audit log: {}", e);
        }
    }

    Ok(Json(ResolveDisputeResponse {
        success: true,
        message: format!("Dispute resolved in favor of {}", request.decision.as_str()),
        data: outcome.dispute,
    }))
}
