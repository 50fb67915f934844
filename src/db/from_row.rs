//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{types::Type, Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?
        .parse::<T>()
        .map_err(|_| rusqlite::Error::InvalidColumnType(col, col_name.to_string(), Type::Text))
}

/// Parse an optional JSON text column into `T`.
fn parse_json<T: serde::de::DeserializeOwned>(
    row: &Row,
    col: usize,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(col)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const MERCHANT_COLS: &str =
    "id, name, email, public_key, secret_key, sandbox_mode, created_at";

pub const TRANSACTION_COLS: &str = "id, order_id, merchant_id, amount, currency, method, status, customer_email, is_test_mode, has_dispute, refunded_amount, refund_reason, refund_date, created_at";

pub const DISPUTE_COLS: &str = "id, transaction_id, merchant_id, order_id, amount, reason, status, customer_email, customer_message, merchant_response, evidence, resolution_decision, resolved_by, resolved_at, resolution_notes, created_at, updated_at";

pub const WEBHOOK_COLS: &str = "id, merchant_id, url, secret, events, created_at";

pub const AUDIT_LOG_COLS: &str =
    "id, merchant_id, action, details, ip_address, user_agent, created_at";

// ============ FromRow Implementations ============

impl FromRow for Merchant {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Merchant {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            public_key: row.get(3)?,
            secret_key: row.get(4)?,
            sandbox_mode: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for Transaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            order_id: row.get(1)?,
            merchant_id: row.get(2)?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            method: parse_enum(row, 5, "method")?,
            status: parse_enum(row, 6, "status")?,
            customer_email: row.get(7)?,
            is_test_mode: row.get(8)?,
            has_dispute: row.get(9)?,
            refunded_amount: row.get(10)?,
            refund_reason: row.get(11)?,
            refund_date: row.get(12)?,
            created_at: row.get(13)?,
        })
    }
}

impl FromRow for Dispute {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Resolution columns are written together; decision present means
        // the full record is.
        let decision: Option<String> = row.get(11)?;
        let resolution = match decision {
            Some(raw) => {
                let decision = raw.parse::<DisputeDecision>().map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        11,
                        "resolution_decision".to_string(),
                        Type::Text,
                    )
                })?;
                Some(DisputeResolution {
                    decision,
                    resolved_by: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                    resolved_at: row.get::<_, Option<i64>>(13)?.unwrap_or_default(),
                    notes: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
                })
            }
            None => None,
        };

        Ok(Dispute {
            id: row.get(0)?,
            transaction_id: row.get(1)?,
            merchant_id: row.get(2)?,
            order_id: row.get(3)?,
            amount: row.get(4)?,
            reason: parse_enum(row, 5, "reason")?,
            status: parse_enum(row, 6, "status")?,
            customer_email: row.get(7)?,
            customer_message: row.get(8)?,
            merchant_response: row.get(9)?,
            evidence: parse_json(row, 10)?,
            resolution,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}

impl FromRow for WebhookRegistration {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let events: Vec<WebhookEventType> = parse_json(row, 4)?.unwrap_or_default();
        Ok(WebhookRegistration {
            id: row.get(0)?,
            merchant_id: row.get(1)?,
            url: row.get(2)?,
            secret: row.get(3)?,
            events,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for AuditLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AuditLog {
            id: row.get(0)?,
            merchant_id: row.get(1)?,
            action: row.get(2)?,
            details: row.get(3)?,
            ip_address: row.get(4)?,
            user_agent: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
