use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::middleware::MerchantContext;
use crate::models::{PaymentMethod, PaymentStatus, Transaction, TransactionFilters};
use crate::pagination::Paginated;

#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by status (pending, success, failed, refunded)
    pub status: Option<PaymentStatus>,
    /// Filter by payment method
    pub method: Option<PaymentMethod>,
    /// Max results to return (default 50, max 100)
    pub limit: Option<i64>,
    /// Offset for pagination (default 0)
    pub offset: Option<i64>,
}

impl ListTransactionsQuery {
    pub(crate) fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub(crate) fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub(crate) fn to_filters(&self) -> TransactionFilters {
        TransactionFilters {
            status: self.status,
            method: self.method,
        }
    }
}

/// GET /transactions
/// List the merchant's transactions, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<MerchantContext>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Paginated<Transaction>>> {
    let conn = state.db.get()?;

    let limit = query.limit();
    let offset = query.offset();
    let (transactions, total) = queries::list_transactions_by_merchant_paginated(
        &conn,
        &ctx.merchant.id,
        &query.to_filters(),
        limit,
        offset,
    )?;

    Ok(Json(Paginated::new(transactions, total, limit, offset)))
}
