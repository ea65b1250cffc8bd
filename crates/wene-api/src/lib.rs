//! WeNe API — the HTTP surface of the participation ledger: request
//! dispatch and audit-on-every-mutation (spec §4.I), readiness probes
//! (spec §4.J), and the full route table (spec §6).

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod readiness;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::http::{HeaderName, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

fn cors_layer(cors_origin: Option<String>) -> CorsLayer {
    let allow_origin = match cors_origin {
        Some(origin) if origin != "*" => origin.parse().map(AllowOrigin::exact).unwrap_or(AllowOrigin::any()),
        _ => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([HeaderName::from_static("content-type"), HeaderName::from_static("authorization")])
}

/// Builds the full router: route table, dispatcher middleware (applied
/// inside `routes::build_router`), security headers, CORS, and request
/// tracing, in that order from innermost to outermost.
pub fn create_router(state: std::sync::Arc<AppState>) -> Router {
    let cors = cors_layer(state.cors_origin.clone());
    routes::build_router(state)
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
