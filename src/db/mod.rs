mod from_row;
mod schema;

pub mod queries;

pub use schema::{init_audit_db, init_db};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::notify::{EmailService, WebhookNotifier};
use crate::payment::SettlementPolicy;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state. Explicitly constructed at process start and injected
/// everywhere; there is no global connection singleton.
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (merchants, transactions, disputes, webhooks)
    pub db: DbPool,
    /// Audit log database pool (separate file to isolate growth)
    pub audit: DbPool,
    /// Outbound webhook delivery queue
    pub webhooks: WebhookNotifier,
    /// Best-effort transactional email
    pub email: Arc<EmailService>,
    /// How the mock settlement decides success vs failure
    pub settlement: SettlementPolicy,
    pub audit_log_enabled: bool,
    /// Bearer token for the admin surface
    pub admin_token: String,
    /// Recorded as `resolvedBy` on dispute resolutions
    pub admin_email: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
