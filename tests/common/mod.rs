//! Test utilities and fixtures for ZeroPay integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tokio::sync::mpsc::UnboundedReceiver;

pub use zeropay::db::{init_audit_db, init_db, queries, AppState, DbPool};
pub use zeropay::error::{msg, AppError};
pub use zeropay::handlers;
pub use zeropay::models::*;
pub use zeropay::notify::{
    sign_payload, EmailService, WebhookJob, WebhookNotifier, SIGNATURE_HEADER,
};
pub use zeropay::payment::{self, disputes, RefundRequest, SettlementPolicy};

pub const TEST_ADMIN_TOKEN: &str = "admin_test_token";
pub const TEST_ADMIN_EMAIL: &str = "admin@zeropay.com";

/// In-memory pool whose connections all share one database.
/// Shared-cache URIs keep the schema visible across pooled connections.
fn test_pool(name: &str) -> DbPool {
    let uri = format!("file:{}?mode=memory&cache=shared", name);
    let manager = SqliteConnectionManager::file(uri).with_flags(
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    );
    Pool::builder().max_size(4).build(manager).unwrap()
}

/// Create an AppState over fresh in-memory databases, with webhook jobs
/// captured on the returned channel instead of delivered over the network.
pub fn create_test_app_state_with_webhooks() -> (AppState, UnboundedReceiver<WebhookJob>) {
    let suffix = uuid::Uuid::new_v4().as_simple().to_string();

    let db = test_pool(&format!("zeropay_test_{}", suffix));
    {
        let conn = db.get().unwrap();
        init_db(&conn).unwrap();
    }

    let audit = test_pool(&format!("zeropay_audit_test_{}", suffix));
    {
        let conn = audit.get().unwrap();
        init_audit_db(&conn).unwrap();
    }

    let (webhooks, rx) = WebhookNotifier::channel();

    let state = AppState {
        db,
        audit,
        webhooks,
        email: Arc::new(EmailService::new(None, "test@zeropay.local".to_string())),
        settlement: SettlementPolicy::always_success(),
        audit_log_enabled: true,
        admin_token: TEST_ADMIN_TOKEN.to_string(),
        admin_email: TEST_ADMIN_EMAIL.to_string(),
    };

    (state, rx)
}

/// AppState without webhook capture (deliveries are dropped with a log).
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_webhooks().0
}

/// Full router: public checkout + merchant API + admin surface.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::merchant::router(state.clone()))
        .merge(handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Create a test merchant with fresh API keys.
pub fn create_test_merchant(conn: &rusqlite::Connection, name: &str) -> Merchant {
    let input = CreateMerchant {
        name: name.to_string(),
        email: format!(
            "{}-{}@test.local",
            name.to_lowercase().replace(' ', "-"),
            &uuid::Uuid::new_v4().as_simple().to_string()[..8]
        ),
    };
    queries::create_merchant(conn, &input).expect("Failed to create test merchant")
}

/// Create a pending transaction for a merchant.
pub fn create_pending_transaction(
    conn: &rusqlite::Connection,
    merchant: &Merchant,
    amount: i64,
    method: PaymentMethod,
) -> Transaction {
    let input = CreatePayment {
        amount,
        method,
        customer_email: "customer@example.com".to_string(),
        currency: None,
    };
    queries::create_transaction(conn, merchant, &input).expect("Failed to create test transaction")
}

/// Create a transaction already settled to `success`.
pub fn create_success_transaction(
    conn: &rusqlite::Connection,
    merchant: &Merchant,
    amount: i64,
) -> Transaction {
    let transaction = create_pending_transaction(conn, merchant, amount, PaymentMethod::Card);
    queries::settle_transaction(conn, &transaction.order_id, PaymentStatus::Success)
        .expect("Failed to settle test transaction")
        .expect("Test transaction was not pending")
}

/// Register a webhook endpoint for a merchant.
pub fn create_test_webhook(
    conn: &rusqlite::Connection,
    merchant_id: &str,
    url: &str,
    events: Vec<WebhookEventType>,
) -> WebhookRegistration {
    let input = CreateWebhook {
        url: url.to_string(),
        events,
    };
    queries::create_webhook(conn, merchant_id, &input).expect("Failed to create test webhook")
}

/// Open a dispute against a transaction.
pub fn open_test_dispute(
    conn: &rusqlite::Connection,
    merchant_id: &str,
    transaction: &Transaction,
    reason: DisputeReason,
) -> Dispute {
    let input = OpenDispute {
        transaction_id: transaction.id.clone(),
        reason,
        customer_message: "I never received the product".to_string(),
    };
    disputes::open_dispute(conn, merchant_id, &input).expect("Failed to open test dispute")
}

/// Bearer header value for a merchant's secret key.
pub fn bearer(key: &str) -> String {
    format!("Bearer {}", key)
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}
