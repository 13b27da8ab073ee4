use axum::http::{HeaderMap, header};

/// Path prefix served by the streaming proxy.
pub const PROXY_PREFIX: &str = "/proxy/image";

/// Base URL clients should use to reach this server.
///
/// The configured public URL wins. Otherwise it is rebuilt from
/// `X-Forwarded-Proto` (default `http`) and `Host`.
pub fn base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("X-Forwarded-Proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| matches!(*v, "http" | "https"))
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

pub fn proxy_url(base: &str, blob_handle: &str) -> String {
    format!("{base}{PROXY_PREFIX}/{blob_handle}")
}
