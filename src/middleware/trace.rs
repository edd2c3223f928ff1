//! Request logging hooks for `tower_http::trace::TraceLayer`.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header::USER_AGENT, Request, Response},
};
use std::{net::SocketAddr, time::Duration};
use tracing::Span;

use crate::auth::AuthUser;

pub fn make_span(request: &Request<Body>) -> Span {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        user_agent,
        ip = %ip,
    )
}

/// `user#<id>` when the auth middleware accepted a token, `anonymous` otherwise.
pub fn principal<B>(response: &Response<B>) -> String {
    match response.extensions().get::<AuthUser>() {
        Some(user) => format!("user#{}", user.user_id),
        None => "anonymous".to_string(),
    }
}

pub fn on_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    tracing::info!(
        status = response.status().as_u16(),
        user_id = %principal(response),
        latency_ms = latency.as_millis() as u64,
        "Request completed"
    );
}
