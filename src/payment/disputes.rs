//! The dispute state machine and its coupling to the refund step.
//!
//! Disputes move open -> under_review -> won | lost. Opening a dispute sets
//! the transaction's dispute flag (the one-dispute-per-transaction guard);
//! resolving in the customer's favor produces an explicit [`DisputeRefund`]
//! command that the caller applies as a second step. Splitting resolution
//! from the refund keeps the already-refunded no-op guard independently
//! testable.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{msg, AppError, OptionExt, Result};
use crate::models::{
    Dispute, DisputeDecision, DisputeResponse, DisputeStatus, OpenDispute, Transaction,
};

/// Open a dispute against a merchant's transaction.
///
/// The dispute flag flip is a compare-and-set; losing it means another
/// dispute already exists and the call fails with `Conflict`.
pub fn open_dispute(conn: &Connection, merchant_id: &str, input: &OpenDispute) -> Result<Dispute> {
    if input.customer_message.trim().is_empty() {
        return Err(AppError::Validation(msg::MISSING_CUSTOMER_MESSAGE.into()));
    }

    let transaction =
        queries::get_transaction_for_merchant(conn, &input.transaction_id, merchant_id)?
            .or_not_found(msg::TRANSACTION_NOT_FOUND)?;

    if transaction.has_dispute {
        return Err(AppError::Conflict(msg::DISPUTE_EXISTS.into()));
    }
    if !queries::mark_transaction_disputed(conn, &transaction.id)? {
        return Err(AppError::Conflict(msg::DISPUTE_EXISTS.into()));
    }

    queries::create_dispute(conn, &transaction, input.reason, &input.customer_message)
}

/// Submit the merchant's response, moving the dispute to `under_review`.
pub fn respond_to_dispute(
    conn: &Connection,
    merchant_id: &str,
    dispute_id: &str,
    input: &DisputeResponse,
) -> Result<Dispute> {
    if input.merchant_response.trim().is_empty() {
        return Err(AppError::Validation(msg::MISSING_MERCHANT_RESPONSE.into()));
    }

    let dispute = queries::get_dispute_for_merchant(conn, dispute_id, merchant_id)?
        .or_not_found(msg::DISPUTE_NOT_FOUND)?;

    match dispute.status {
        DisputeStatus::Open => {}
        DisputeStatus::UnderReview => {
            return Err(AppError::InvalidState(msg::DISPUTE_UNDER_REVIEW.into()));
        }
        DisputeStatus::Won | DisputeStatus::Lost => {
            return Err(AppError::InvalidState(msg::DISPUTE_ALREADY_RESOLVED.into()));
        }
    }

    queries::submit_dispute_response(
        conn,
        dispute_id,
        merchant_id,
        input.merchant_response.trim(),
        input.evidence.as_ref(),
    )?
    .ok_or_else(|| AppError::InvalidState(msg::DISPUTE_UNDER_REVIEW.into()))
}

/// Refund command produced when a dispute resolves in the customer's favor.
///
/// Applying it is idempotent from the admin's perspective: a transaction
/// that is no longer `success` makes [`apply_dispute_refund`] a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeRefund {
    pub transaction_id: String,
    pub amount: i64,
    pub reason: String,
}

/// Result of an admin resolution: the terminal dispute plus the refund
/// command to apply when the customer won.
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub dispute: Dispute,
    pub refund: Option<DisputeRefund>,
}

/// Resolve a dispute. Decision `merchant` -> `won`; `customer` -> `lost`
/// plus a [`DisputeRefund`] for the dispute's amount.
pub fn resolve_dispute(
    conn: &Connection,
    dispute_id: &str,
    decision: DisputeDecision,
    resolved_by: &str,
    notes: &str,
) -> Result<ResolutionOutcome> {
    let dispute =
        queries::get_dispute_by_id(conn, dispute_id)?.or_not_found(msg::DISPUTE_NOT_FOUND)?;

    if dispute.status.is_terminal() {
        return Err(AppError::Conflict(msg::DISPUTE_ALREADY_RESOLVED.into()));
    }

    // CAS: only one resolution wins even if two admins race.
    let dispute = queries::resolve_dispute(conn, dispute_id, decision, resolved_by, notes)?
        .ok_or_else(|| AppError::Conflict(msg::DISPUTE_ALREADY_RESOLVED.into()))?;

    let refund = match decision {
        DisputeDecision::Merchant => None,
        DisputeDecision::Customer => Some(DisputeRefund {
            transaction_id: dispute.transaction_id.clone(),
            amount: dispute.amount,
            reason: format!(
                "Dispute resolved in favor of customer: {}",
                dispute.reason
            ),
        }),
    };

    Ok(ResolutionOutcome { dispute, refund })
}

/// Apply a dispute-triggered refund.
///
/// Returns the refunded transaction, or None when the transaction was
/// already refunded (or otherwise left `success`) — a silent no-op, so
/// re-driving a resolution never double-refunds or errors.
pub fn apply_dispute_refund(
    conn: &Connection,
    refund: &DisputeRefund,
) -> Result<Option<Transaction>> {
    queries::refund_transaction_by_id(conn, &refund.transaction_id, refund.amount, &refund.reason)
}
