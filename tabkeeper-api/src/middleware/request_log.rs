/// Request logging middleware
///
/// Emits one `tracing` event per request once the handler has produced a response:
/// method, path, client origin, status and elapsed milliseconds. The response passes
/// through untouched.
///
/// The origin is the first `X-Forwarded-For` address, else the peer address from
/// `ConnectInfo`, else `unknown` (as in tests that call the router directly).
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use tabkeeper_api::middleware::request_log::log_requests;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "OK" }))
///     .layer(middleware::from_fn(log_requests));
/// ```

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, time::Instant};
use tracing::info;

/// Resolves the client origin for a request
pub fn client_origin(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }

    match connect_info {
        Some(ConnectInfo(addr)) => addr.to_string(),
        None => "unknown".to_string(),
    }
}

/// Logs every request after it completes
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = client_origin(req.headers(), req.extensions().get::<ConnectInfo<SocketAddr>>());
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        origin = %origin,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );

    response
}
