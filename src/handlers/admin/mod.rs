//! Admin oversight surface: dispute resolution and cross-merchant listings.

mod disputes;
mod oversight;

pub use disputes::*;
pub use oversight::*;

use axum::{middleware, routing::get, routing::post, Router};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/disputes/{dispute_id}/resolve", post(resolve_dispute))
        .route("/admin/transactions", get(list_all_transactions))
        .route("/admin/disputes", get(list_all_disputes))
        .route("/admin/merchants", get(list_merchants))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
