/// Middleware modules for the API server
///
/// - `request_log`: per-request method/path/origin/status/latency logging
///
/// The `Authorization` gate lives in `tabkeeper_shared::auth::middleware` and is wired in
/// [`crate::app`].

pub mod request_log;
