use axum::extract::State;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::{Dispute, Merchant, Transaction};
use crate::pagination::{Paginated, PaginationQuery};

use crate::handlers::merchant::{parse_status_filter, ListDisputesQuery, ListTransactionsQuery};

/// GET /admin/transactions
/// All transactions across merchants, newest first.
pub async fn list_all_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Paginated<Transaction>>> {
    let conn = state.db.get()?;

    let limit = query.limit();
    let offset = query.offset();
    let (transactions, total) =
        queries::list_transactions_paginated(&conn, &query.to_filters(), limit, offset)?;

    Ok(Json(Paginated::new(transactions, total, limit, offset)))
}

#[derive(Debug, Serialize)]
pub struct AdminDisputeListResponse {
    pub success: bool,
    pub data: Vec<Dispute>,
}

/// GET /admin/disputes
/// All disputes across merchants, newest first.
pub async fn list_all_disputes(
    State(state): State<AppState>,
    Query(query): Query<ListDisputesQuery>,
) -> Result<Json<AdminDisputeListResponse>> {
    let conn = state.db.get()?;

    let status = parse_status_filter(query.status.as_deref());
    let disputes = queries::list_disputes(&conn, status)?;

    Ok(Json(AdminDisputeListResponse {
        success: true,
        data: disputes,
    }))
}

/// GET /admin/merchants
/// Merchant directory listing (secret keys are never serialized).
pub async fn list_merchants(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Merchant>>> {
    let conn = state.db.get()?;

    let limit = query.limit();
    let offset = query.offset();
    let (merchants, total) = queries::list_merchants_paginated(&conn, limit, offset)?;

    Ok(Json(Paginated::new(merchants, total, limit, offset)))
}
