use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::Merchant;

/// Authenticated merchant, inserted as a request extension.
#[derive(Clone)]
pub struct MerchantContext {
    pub merchant: Merchant,
}

/// Bearer secret-key authentication for the merchant API.
///
/// The key format is checked before the database lookup so garbage never
/// hits the directory.
pub async fn merchant_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let secret_key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    if !secret_key.starts_with("sk_test_") {
        return Err(AppError::Unauthorized);
    }

    let conn = state.db.get()?;
    let merchant =
        queries::get_merchant_by_secret_key(&conn, secret_key)?.ok_or(AppError::Unauthorized)?;
    // Release the pooled connection before running the handler.
    drop(conn);

    request.extensions_mut().insert(MerchantContext { merchant });

    Ok(next.run(request).await)
}
