use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

/// Best-effort client address.
///
/// First valid IP in `X-Forwarded-For`, then `X-Real-IP`, then the socket
/// peer. Headers are client-controlled, so this is for bookkeeping only and
/// must never be used for access decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

const UNKNOWN: &str = "unknown";

fn from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').find_map(|ip| ip.trim().parse().ok()));
    if forwarded.is_some() {
        return forwarded;
    }

    headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = from_headers(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        });

        Ok(ClientIp(
            ip.map(|ip| ip.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ))
    }
}
