//! Session resolution helpers
//!
//! Sessions are identified by the `shop_session` cookie. Requests without one
//! get a fresh id, which is handed back with `Set-Cookie`.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "shop_session";

/// Returns the session id of the request and whether it was just minted.
pub fn resolve_session_id(headers: &HeaderMap) -> (String, bool) {
    match session_from_cookies(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().simple().to_string(), true),
    }
}

fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Attaches the session cookie to `response` when the session is new.
pub fn with_session_cookie(mut response: Response, session_id: &str, is_new: bool) -> Response {
    if !is_new {
        return response;
    }

    let cookie = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, session_id);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; shop_session=abc123"),
        );

        assert_eq!(resolve_session_id(&headers), ("abc123".to_string(), false));
    }

    #[test]
    fn test_mints_new_session_without_cookie() {
        let (id, is_new) = resolve_session_id(&HeaderMap::new());
        assert!(is_new);
        assert_eq!(id.len(), 32);
    }

    #[test]
    fn test_cookie_only_set_for_new_sessions() {
        let fresh = with_session_cookie(Response::default(), "s1", true);
        assert_eq!(
            fresh.headers().get(header::SET_COOKIE).unwrap(),
            "shop_session=s1; Path=/; HttpOnly"
        );

        let known = with_session_cookie(Response::default(), "s1", false);
        assert!(known.headers().get(header::SET_COOKIE).is_none());
    }
}
