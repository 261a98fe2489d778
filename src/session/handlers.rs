//! REST API handlers for the session itself

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::delete,
    Json, Router,
};
use serde_json::json;

use super::{helpers::SESSION_COOKIE, resolve_session_id, SharedState};

/// Creates routes for session lifecycle operations
pub fn routes() -> Router<SharedState> {
    Router::new().route("/session", delete(end_session))
}

/// Endpoint: DELETE /session
/// Forgets the session: its cart, its search term and any catalog load in
/// flight. The cookie is expired so the next request starts afresh.
async fn end_session(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, _) = resolve_session_id(&headers);
    let ended = state.end_session(&session_id);
    tracing::info!(session_id = %session_id, ended, "session ended");

    let mut response = Json(json!({ "ended": ended })).into_response();
    let expired = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
