//! The payment lifecycle state machine.
//!
//! Transactions move pending -> success | failed -> refunded (refund only
//! from success). Each transition is validated here and committed as a
//! compare-and-set update in [`queries`], so concurrent requests cannot
//! double-settle or double-refund. Webhook fan-out and email are dispatched
//! by the HTTP layer after the transition commits; they never gate it.

pub mod disputes;
mod settlement;

pub use settlement::SettlementPolicy;

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{msg, AppError, OptionExt, Result};
use crate::id::is_valid_order_reference;
use crate::models::{CreatePayment, Merchant, PaymentStatus, Transaction};

/// Cheap plausibility check for customer emails; real verification belongs
/// to the (out-of-scope) notification pipeline.
fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Create a new payment order in `pending`.
pub fn create_payment(
    conn: &Connection,
    merchant: &Merchant,
    input: &CreatePayment,
) -> Result<Transaction> {
    if input.amount <= 0 {
        return Err(AppError::Validation(msg::AMOUNT_NOT_POSITIVE.into()));
    }
    if !is_plausible_email(&input.customer_email) {
        return Err(AppError::Validation(msg::INVALID_CUSTOMER_EMAIL.into()));
    }

    // The middleware already resolved the merchant, but re-check against the
    // directory so seed/test callers get the same contract.
    let merchant = queries::get_merchant_by_id(conn, &merchant.id)?
        .or_not_found(msg::MERCHANT_NOT_FOUND)?;

    queries::create_transaction(conn, &merchant, input)
}

/// Settle a pending transaction, resolving it to `success` or `failed`
/// according to the given policy.
///
/// Exactly one resolution per transaction: if the transaction is not in
/// `pending` the call fails with `InvalidState` rather than re-resolving.
pub fn settle_payment(
    conn: &Connection,
    order_id: &str,
    policy: SettlementPolicy,
) -> Result<Transaction> {
    if !is_valid_order_reference(order_id) {
        return Err(AppError::Validation(msg::INVALID_ORDER_ID.into()));
    }

    let transaction = queries::get_transaction_by_order_id(conn, order_id)?
        .or_not_found(msg::TRANSACTION_NOT_FOUND)?;

    if transaction.status != PaymentStatus::Pending {
        return Err(AppError::InvalidState(msg::ALREADY_PROCESSED.into()));
    }

    let outcome = policy.decide();

    // CAS: a concurrent verify may have resolved it between the read above
    // and this write; the guard makes the loser fail instead of re-resolving.
    queries::settle_transaction(conn, order_id, outcome)?
        .ok_or_else(|| AppError::InvalidState(msg::ALREADY_PROCESSED.into()))
}

/// Refund request parameters (merchant-initiated path).
#[derive(Debug, Clone)]
pub struct RefundRequest<'a> {
    pub order_id: &'a str,
    pub amount: i64,
    pub reason: Option<&'a str>,
}

/// Refund a successful transaction, at most once.
pub fn refund_payment(
    conn: &Connection,
    merchant_id: &str,
    request: RefundRequest<'_>,
) -> Result<Transaction> {
    if request.amount <= 0 {
        return Err(AppError::Validation(msg::AMOUNT_NOT_POSITIVE.into()));
    }

    let transaction =
        queries::get_transaction_by_order_for_merchant(conn, request.order_id, merchant_id)?
            .or_not_found(msg::TRANSACTION_NOT_FOUND)?;

    match transaction.status {
        PaymentStatus::Success => {}
        PaymentStatus::Refunded => {
            return Err(AppError::InvalidState(msg::ALREADY_REFUNDED.into()));
        }
        _ => {
            return Err(AppError::InvalidState(msg::ONLY_SUCCESS_REFUNDABLE.into()));
        }
    }
    if request.amount > transaction.amount {
        return Err(AppError::Validation(msg::REFUND_EXCEEDS_AMOUNT.into()));
    }

    let reason = request.reason.unwrap_or("Refund requested by merchant");

    // CAS: if a dispute resolution or concurrent refund got there first,
    // zero rows match and the caller sees the already-refunded error.
    queries::refund_transaction_by_order(
        conn,
        request.order_id,
        merchant_id,
        request.amount,
        reason,
    )?
    .ok_or_else(|| AppError::InvalidState(msg::ALREADY_REFUNDED.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("customer@example.com"));
        assert!(is_plausible_email("  padded@example.co.in "));

        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@nodot"));
        assert!(!is_plausible_email("a@trailing."));
        assert!(!is_plausible_email("spaced name@example.com"));
    }
}
