//! Database operations.
//!
//! Every lifecycle transition is a single compare-and-set UPDATE guarded on
//! the current status (`WHERE status = ... RETURNING ...`). Zero affected
//! rows means a concurrent writer got there first; callers map that to the
//! appropriate state-machine error instead of re-reading and clobbering.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::id::{self, EntityType};
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, AUDIT_LOG_COLS, DISPUTE_COLS, MERCHANT_COLS, TRANSACTION_COLS,
    WEBHOOK_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Merchants ============

/// Create a merchant with freshly generated API keys.
pub fn create_merchant(conn: &Connection, input: &CreateMerchant) -> Result<Merchant> {
    let merchant = Merchant {
        id: EntityType::Merchant.gen_id(),
        name: input.name.clone(),
        email: input.email.trim().to_lowercase(),
        public_key: id::gen_public_key(),
        secret_key: id::gen_secret_key(),
        sandbox_mode: true,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO merchants (id, name, email, public_key, secret_key, sandbox_mode, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &merchant.id,
            &merchant.name,
            &merchant.email,
            &merchant.public_key,
            &merchant.secret_key,
            merchant.sandbox_mode,
            merchant.created_at,
        ],
    )?;

    Ok(merchant)
}

pub fn get_merchant_by_id(conn: &Connection, id: &str) -> Result<Option<Merchant>> {
    query_one(
        conn,
        &format!("SELECT {} FROM merchants WHERE id = ?1", MERCHANT_COLS),
        &[&id],
    )
}

/// Lookup by secret key, used for request authentication.
pub fn get_merchant_by_secret_key(conn: &Connection, secret_key: &str) -> Result<Option<Merchant>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM merchants WHERE secret_key = ?1",
            MERCHANT_COLS
        ),
        &[&secret_key],
    )
}

pub fn list_merchants_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Merchant>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM merchants", [], |row| row.get(0))?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM merchants ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            MERCHANT_COLS
        ),
        &[&limit, &offset],
    )?;
    Ok((items, total))
}

/// Flip the sandbox flag. Returns the updated merchant, or None if not found.
pub fn set_merchant_sandbox_mode(
    conn: &Connection,
    id: &str,
    sandbox_mode: bool,
) -> Result<Option<Merchant>> {
    conn.query_row(
        &format!(
            "UPDATE merchants SET sandbox_mode = ?2 WHERE id = ?1 RETURNING {}",
            MERCHANT_COLS
        ),
        params![id, sandbox_mode],
        Merchant::from_row,
    )
    .optional()
    .map_err(Into::into)
}

// ============ Transactions ============

/// Create a pending transaction with a fresh order reference.
/// The test-mode flag is copied from the merchant's sandbox setting.
pub fn create_transaction(
    conn: &Connection,
    merchant: &Merchant,
    input: &CreatePayment,
) -> Result<Transaction> {
    let transaction = Transaction {
        id: EntityType::Transaction.gen_id(),
        order_id: id::gen_order_reference(),
        merchant_id: merchant.id.clone(),
        amount: input.amount,
        currency: input
            .currency
            .clone()
            .unwrap_or_else(|| "INR".to_string()),
        method: input.method,
        status: PaymentStatus::Pending,
        customer_email: input.customer_email.trim().to_string(),
        is_test_mode: merchant.sandbox_mode,
        has_dispute: false,
        refunded_amount: None,
        refund_reason: None,
        refund_date: None,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO transactions (id, order_id, merchant_id, amount, currency, method, status,
                                   customer_email, is_test_mode, has_dispute, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &transaction.id,
            &transaction.order_id,
            &transaction.merchant_id,
            transaction.amount,
            &transaction.currency,
            transaction.method.as_str(),
            transaction.status.as_str(),
            &transaction.customer_email,
            transaction.is_test_mode,
            transaction.has_dispute,
            transaction.created_at,
        ],
    )?;

    Ok(transaction)
}

pub fn get_transaction_by_id(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

pub fn get_transaction_by_order_id(
    conn: &Connection,
    order_id: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE order_id = ?1",
            TRANSACTION_COLS
        ),
        &[&order_id],
    )
}

/// Merchant-scoped lookup by internal ID. Another merchant's transaction
/// reads as absent, so ownership failures surface as NotFound.
pub fn get_transaction_for_merchant(
    conn: &Connection,
    id: &str,
    merchant_id: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE id = ?1 AND merchant_id = ?2",
            TRANSACTION_COLS
        ),
        &[&id, &merchant_id],
    )
}

/// Merchant-scoped lookup by order reference.
pub fn get_transaction_by_order_for_merchant(
    conn: &Connection,
    order_id: &str,
    merchant_id: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE order_id = ?1 AND merchant_id = ?2",
            TRANSACTION_COLS
        ),
        &[&order_id, &merchant_id],
    )
}

fn transaction_filter_sql(filters: &TransactionFilters) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(status) = filters.status {
        clauses.push("status = ?");
        values.push(status.as_str().to_string());
    }
    if let Some(method) = filters.method {
        clauses.push("method = ?");
        values.push(method.as_str().to_string());
    }
    let sql = clauses
        .iter()
        .map(|c| format!(" AND {}", c))
        .collect::<String>();
    (sql, values)
}

pub fn list_transactions_by_merchant_paginated(
    conn: &Connection,
    merchant_id: &str,
    filters: &TransactionFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Transaction>, i64)> {
    let (filter_sql, filter_values) = transaction_filter_sql(filters);

    let mut params: Vec<&dyn rusqlite::ToSql> = vec![&merchant_id];
    for v in &filter_values {
        params.push(v);
    }

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM transactions WHERE merchant_id = ?1{}",
            filter_sql
        ),
        params.as_slice(),
        |row| row.get(0),
    )?;

    params.push(&limit);
    params.push(&offset);
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE merchant_id = ?1{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLS, filter_sql
        ),
        params.as_slice(),
    )?;

    Ok((items, total))
}

/// Admin listing across all merchants.
pub fn list_transactions_paginated(
    conn: &Connection,
    filters: &TransactionFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Transaction>, i64)> {
    let (filter_sql, filter_values) = transaction_filter_sql(filters);

    let mut params: Vec<&dyn rusqlite::ToSql> = Vec::new();
    for v in &filter_values {
        params.push(v);
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions WHERE 1=1{}", filter_sql),
        params.as_slice(),
        |row| row.get(0),
    )?;

    params.push(&limit);
    params.push(&offset);
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE 1=1{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLS, filter_sql
        ),
        params.as_slice(),
    )?;

    Ok((items, total))
}

/// Settle a pending transaction to `success` or `failed`.
///
/// Compare-and-set on `status = 'pending'`: returns None if the transaction
/// does not exist or was already resolved, guaranteeing exactly one
/// resolution decision even under concurrent verify calls.
pub fn settle_transaction(
    conn: &Connection,
    order_id: &str,
    outcome: PaymentStatus,
) -> Result<Option<Transaction>> {
    debug_assert!(matches!(
        outcome,
        PaymentStatus::Success | PaymentStatus::Failed
    ));
    conn.query_row(
        &format!(
            "UPDATE transactions SET status = ?2
             WHERE order_id = ?1 AND status = 'pending'
             RETURNING {}",
            TRANSACTION_COLS
        ),
        params![order_id, outcome.as_str()],
        Transaction::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Refund a successful transaction, recording the refund sub-fields.
///
/// Compare-and-set on `status = 'success'`: a second refund (or a refund
/// racing a dispute resolution) finds zero matching rows and returns None.
pub fn refund_transaction_by_id(
    conn: &Connection,
    transaction_id: &str,
    amount: i64,
    reason: &str,
) -> Result<Option<Transaction>> {
    conn.query_row(
        &format!(
            "UPDATE transactions
             SET status = 'refunded', refunded_amount = ?2, refund_reason = ?3, refund_date = ?4
             WHERE id = ?1 AND status = 'success'
             RETURNING {}",
            TRANSACTION_COLS
        ),
        params![transaction_id, amount, reason, now()],
        Transaction::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Merchant-scoped refund by order reference. See [`refund_transaction_by_id`].
pub fn refund_transaction_by_order(
    conn: &Connection,
    order_id: &str,
    merchant_id: &str,
    amount: i64,
    reason: &str,
) -> Result<Option<Transaction>> {
    conn.query_row(
        &format!(
            "UPDATE transactions
             SET status = 'refunded', refunded_amount = ?3, refund_reason = ?4, refund_date = ?5
             WHERE order_id = ?1 AND merchant_id = ?2 AND status = 'success'
             RETURNING {}",
            TRANSACTION_COLS
        ),
        params![order_id, merchant_id, amount, reason, now()],
        Transaction::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Flip the dispute flag on a transaction.
///
/// Compare-and-set on `has_dispute = 0`: exactly one of two concurrent
/// dispute-open attempts wins. Returns false if the flag was already set.
pub fn mark_transaction_disputed(conn: &Connection, transaction_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE transactions SET has_dispute = 1 WHERE id = ?1 AND has_dispute = 0",
        params![transaction_id],
    )?;
    Ok(affected > 0)
}

// ============ Disputes ============

/// Insert an open dispute, denormalizing display fields from the transaction.
pub fn create_dispute(
    conn: &Connection,
    transaction: &Transaction,
    reason: DisputeReason,
    customer_message: &str,
) -> Result<Dispute> {
    let now = now();
    let dispute = Dispute {
        id: EntityType::Dispute.gen_id(),
        transaction_id: transaction.id.clone(),
        merchant_id: transaction.merchant_id.clone(),
        order_id: transaction.order_id.clone(),
        amount: transaction.amount,
        reason,
        status: DisputeStatus::Open,
        customer_email: transaction.customer_email.clone(),
        customer_message: customer_message.to_string(),
        merchant_response: None,
        evidence: None,
        resolution: None,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO disputes (id, transaction_id, merchant_id, order_id, amount, reason, status,
                               customer_email, customer_message, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &dispute.id,
            &dispute.transaction_id,
            &dispute.merchant_id,
            &dispute.order_id,
            dispute.amount,
            dispute.reason.as_str(),
            dispute.status.as_str(),
            &dispute.customer_email,
            &dispute.customer_message,
            dispute.created_at,
            dispute.updated_at,
        ],
    )?;

    Ok(dispute)
}

pub fn get_dispute_by_id(conn: &Connection, id: &str) -> Result<Option<Dispute>> {
    query_one(
        conn,
        &format!("SELECT {} FROM disputes WHERE id = ?1", DISPUTE_COLS),
        &[&id],
    )
}

/// Merchant-scoped dispute lookup.
pub fn get_dispute_for_merchant(
    conn: &Connection,
    id: &str,
    merchant_id: &str,
) -> Result<Option<Dispute>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM disputes WHERE id = ?1 AND merchant_id = ?2",
            DISPUTE_COLS
        ),
        &[&id, &merchant_id],
    )
}

/// Recent disputes for a merchant, optionally filtered by status.
pub fn list_disputes_by_merchant(
    conn: &Connection,
    merchant_id: &str,
    status: Option<DisputeStatus>,
) -> Result<Vec<Dispute>> {
    match status {
        Some(status) => query_all(
            conn,
            &format!(
                "SELECT {} FROM disputes WHERE merchant_id = ?1 AND status = ?2
                 ORDER BY created_at DESC LIMIT 100",
                DISPUTE_COLS
            ),
            &[&merchant_id, &status.as_str()],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM disputes WHERE merchant_id = ?1
                 ORDER BY created_at DESC LIMIT 100",
                DISPUTE_COLS
            ),
            &[&merchant_id],
        ),
    }
}

/// Admin listing across all merchants.
pub fn list_disputes(conn: &Connection, status: Option<DisputeStatus>) -> Result<Vec<Dispute>> {
    match status {
        Some(status) => query_all(
            conn,
            &format!(
                "SELECT {} FROM disputes WHERE status = ?1 ORDER BY created_at DESC LIMIT 100",
                DISPUTE_COLS
            ),
            &[&status.as_str()],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM disputes ORDER BY created_at DESC LIMIT 100",
                DISPUTE_COLS
            ),
            &[],
        ),
    }
}

/// Record the merchant's response and move the dispute to `under_review`.
///
/// Compare-and-set on `status = 'open'`: responding to an already-reviewed
/// or resolved dispute returns None.
pub fn submit_dispute_response(
    conn: &Connection,
    id: &str,
    merchant_id: &str,
    merchant_response: &str,
    evidence: Option<&DisputeEvidence>,
) -> Result<Option<Dispute>> {
    let evidence_json = evidence.map(serde_json::to_string).transpose()?;
    conn.query_row(
        &format!(
            "UPDATE disputes
             SET status = 'under_review', merchant_response = ?3, evidence = ?4, updated_at = ?5
             WHERE id = ?1 AND merchant_id = ?2 AND status = 'open'
             RETURNING {}",
            DISPUTE_COLS
        ),
        params![id, merchant_id, merchant_response, evidence_json, now()],
        Dispute::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Record the admin decision and move the dispute to its terminal state.
///
/// Compare-and-set on `status IN ('open', 'under_review')`: a second
/// resolution attempt returns None. Only `won`/`lost` are ever written.
pub fn resolve_dispute(
    conn: &Connection,
    id: &str,
    decision: DisputeDecision,
    resolved_by: &str,
    notes: &str,
) -> Result<Option<Dispute>> {
    let status = match decision {
        DisputeDecision::Merchant => DisputeStatus::Won,
        DisputeDecision::Customer => DisputeStatus::Lost,
    };
    let now = now();
    conn.query_row(
        &format!(
            "UPDATE disputes
             SET status = ?2, resolution_decision = ?3, resolved_by = ?4, resolved_at = ?5,
                 resolution_notes = ?6, updated_at = ?5
             WHERE id = ?1 AND status IN ('open', 'under_review')
             RETURNING {}",
            DISPUTE_COLS
        ),
        params![
            id,
            status.as_str(),
            decision.as_str(),
            resolved_by,
            now,
            notes
        ],
        Dispute::from_row,
    )
    .optional()
    .map_err(Into::into)
}

// ============ Webhooks ============

/// Register a webhook endpoint with a freshly generated signing secret.
pub fn create_webhook(
    conn: &Connection,
    merchant_id: &str,
    input: &CreateWebhook,
) -> Result<WebhookRegistration> {
    let registration = WebhookRegistration {
        id: EntityType::Webhook.gen_id(),
        merchant_id: merchant_id.to_string(),
        url: input.url.clone(),
        secret: id::gen_webhook_secret(),
        events: input.events.clone(),
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO webhooks (id, merchant_id, url, secret, events, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &registration.id,
            &registration.merchant_id,
            &registration.url,
            &registration.secret,
            serde_json::to_string(&registration.events)?,
            registration.created_at,
        ],
    )?;

    Ok(registration)
}

pub fn list_webhooks_by_merchant(
    conn: &Connection,
    merchant_id: &str,
) -> Result<Vec<WebhookRegistration>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM webhooks WHERE merchant_id = ?1 ORDER BY created_at DESC",
            WEBHOOK_COLS
        ),
        &[&merchant_id],
    )
}

pub fn get_webhook_for_merchant(
    conn: &Connection,
    id: &str,
    merchant_id: &str,
) -> Result<Option<WebhookRegistration>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM webhooks WHERE id = ?1 AND merchant_id = ?2",
            WEBHOOK_COLS
        ),
        &[&id, &merchant_id],
    )
}

/// Delete a registration. Returns true if it existed and belonged to the merchant.
pub fn delete_webhook(conn: &Connection, id: &str, merchant_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM webhooks WHERE id = ?1 AND merchant_id = ?2",
        params![id, merchant_id],
    )?;
    Ok(deleted > 0)
}

/// Registrations of one merchant subscribed to the given event type.
/// Events are a JSON column, so the subscription filter runs in Rust.
pub fn webhooks_for_event(
    conn: &Connection,
    merchant_id: &str,
    event: WebhookEventType,
) -> Result<Vec<WebhookRegistration>> {
    let hooks = list_webhooks_by_merchant(conn, merchant_id)?;
    Ok(hooks
        .into_iter()
        .filter(|h| h.is_subscribed_to(event))
        .collect())
}

// ============ Audit logs ============

/// Append an audit record. No-op when auditing is disabled.
#[allow(clippy::too_many_arguments)]
pub fn create_audit_log(
    conn: &Connection,
    enabled: bool,
    merchant_id: &str,
    action: &str,
    details: &str,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO audit_logs (id, merchant_id, action, details, ip_address, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            EntityType::AuditLog.gen_id(),
            merchant_id,
            action,
            details,
            ip_address,
            user_agent,
            now(),
        ],
    )?;
    Ok(())
}

pub fn list_audit_logs_by_merchant_paginated(
    conn: &Connection,
    merchant_id: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AuditLog>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM audit_logs WHERE merchant_id = ?1",
        params![merchant_id],
        |row| row.get(0),
    )?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM audit_logs WHERE merchant_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            AUDIT_LOG_COLS
        ),
        &[&merchant_id, &limit, &offset],
    )?;
    Ok((items, total))
}
