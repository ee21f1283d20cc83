use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use tracing::warn;

use crate::error::ApiError;

pub const LOCALHOST_DENIED: &str = "Access denied. This endpoint is only accessible from localhost.";

const LOOPBACK_ADDRESSES: [&str; 3] = ["127.0.0.1", "::ffff:127.0.0.1", "::1"];

/// Reject requests that do not come from the local machine.
pub async fn localhost_only(req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer);
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok());

    if !is_localhost(ip.as_deref(), host) {
        warn!("Rejected non-local request from {:?} (host {:?})", ip, host);
        return ApiError::forbidden(LOCALHOST_DENIED).into_response();
    }

    next.run(req).await
}

/// Proxy headers first, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header_value("x-forwarded-for") {
        return forwarded.split(',').next().map(|ip| ip.trim().to_string());
    }
    if let Some(real_ip) = header_value("x-real-ip") {
        return Some(real_ip.to_string());
    }
    peer.map(|addr| addr.ip().to_string())
}

pub fn is_localhost(ip: Option<&str>, host: Option<&str>) -> bool {
    if ip.is_some_and(|ip| LOOPBACK_ADDRESSES.contains(&ip)) {
        return true;
    }

    host.is_some_and(|host| host.contains("localhost") || host.contains("127.0.0.1"))
}
