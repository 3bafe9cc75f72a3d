//! services/api/src/web/middleware.rs
//!
//! Session-cookie authentication for the protected router.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Pulls the session id out of a Cookie header value. Browsers send all
/// cookies in one header, so this has to scan past unrelated pairs.
pub(crate) fn session_id_from_cookies(header: &str) -> Option<&str> {
    header
        .split(';')
        .find_map(|pair| pair.trim().strip_prefix("session="))
}

/// Resolves the `session` cookie to a user id and stores it in the
/// request extensions, where handlers read it via `Extension<Uuid>`.
/// Anything short of a valid, unexpired session is a 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_session_id = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookies)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_found_among_others() {
        let header = "theme=dark; session=abc-123; lang=en";
        assert_eq!(session_id_from_cookies(header), Some("abc-123"));
    }

    #[test]
    fn missing_session_cookie_yields_none() {
        assert_eq!(session_id_from_cookies("theme=dark; lang=en"), None);
        assert_eq!(session_id_from_cookies(""), None);
    }

    #[test]
    fn lookalike_cookie_names_do_not_match() {
        assert_eq!(session_id_from_cookies("mysession=abc"), None);
    }
}
