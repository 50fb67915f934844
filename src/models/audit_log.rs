use serde::Serialize;

/// Append-only audit record for merchant-visible actions (dispute responses,
/// refunds, webhook changes). Stored in the separate audit database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub merchant_id: String,
    pub action: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: i64,
}

/// Audit action names, kept in one place so dashboards can filter on them.
pub mod audit_action {
    pub const REFUND_ISSUED: &str = "REFUND_ISSUED";
    pub const DISPUTE_OPENED: &str = "DISPUTE_OPENED";
    pub const DISPUTE_RESPONSE_SUBMITTED: &str = "DISPUTE_RESPONSE_SUBMITTED";
    pub const DISPUTE_RESOLVED: &str = "DISPUTE_RESOLVED";
    pub const WEBHOOK_CREATED: &str = "WEBHOOK_CREATED";
    pub const WEBHOOK_DELETED: &str = "WEBHOOK_DELETED";
    pub const SANDBOX_TOGGLED: &str = "SANDBOX_TOGGLED";
}
