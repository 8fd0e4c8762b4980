//! Password gate and session cookie handling

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::server::ServerState;
use crate::session::SESSION_COOKIE_NAME;

/// Session gate
///
/// With a password configured:
/// 1. `/login` always passes
/// 2. requests with a valid session cookie pass
/// 3. `/api/*` and `/ws` get 401
/// 4. anything else is redirected to `/login`
pub async fn auth_middleware(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.auth_enabled() {
        return next.run(request).await;
    }

    let path = request.uri().path();
    if path == "/login" {
        return next.run(request).await;
    }

    if state.has_valid_session(request.headers()) {
        return next.run(request).await;
    }

    if path.starts_with("/api/") || path == "/ws" {
        tracing::debug!("Unauthenticated request to {}", path);
        return ApiError::Unauthorized.into_response();
    }

    redirect("/login")
}

/// Session token carried by the request's cookies, if any
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a freshly issued session
pub fn session_cookie(token: &str, max_age_secs: Option<u64>) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax",
        SESSION_COOKIE_NAME, token
    );
    if let Some(secs) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", secs));
    }
    cookie
}

/// `Set-Cookie` value that deletes the session cookie
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    )
}

/// `302 Found` to `location`
pub(crate) fn redirect(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `302 Found` to `location` that also sets a cookie
pub(crate) fn redirect_with_cookie(location: &'static str, cookie: String) -> Response {
    let mut response = redirect(location);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        Err(e) => ApiError::Internal(format!("invalid cookie header: {}", e)).into_response(),
    }
}
