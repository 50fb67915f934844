use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::error::AppError;

/// Authenticated admin, inserted as a request extension.
#[derive(Clone)]
pub struct AdminContext {
    /// Recorded as `resolvedBy` on dispute resolutions.
    pub email: String,
}

/// Bearer token authentication for the admin surface.
///
/// The token is compared in constant time; response timing reveals nothing
/// about how much of a guess matched.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let expected = state.admin_token.as_bytes();
    let provided = token.as_bytes();

    // Length is not secret; only the comparison itself must be constant-time.
    if expected.len() != provided.len() || expected.ct_eq(provided).unwrap_u8() == 0 {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(AdminContext {
        email: state.admin_email.clone(),
    });

    Ok(next.run(request).await)
}
