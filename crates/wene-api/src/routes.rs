//! Route table (spec §6): every handler wired to its path, with the
//! request dispatcher applied as a single outer middleware layer.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::dispatch::dispatch_middleware;
use crate::handlers;
use crate::readiness;
use crate::state::AppState;

/// The school-facing surface: event CRUD, claim intake, PoP issuance, and
/// the three readiness probes.
fn school_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(handlers::school::list_events).post(handlers::school::create_event))
        .route("/events/:eventId", get(handlers::school::get_event))
        .route("/events/:eventId/claimants", get(handlers::school::claimants))
        .route("/claims", post(handlers::claims::claim_by_wallet))
        .route("/pop-proof", post(handlers::claims::pop_proof))
        .route("/pop-status", get(readiness::pop_status))
        .route("/audit-status", get(readiness::audit_status))
        .route("/runtime-status", get(readiness::runtime_status))
}

/// The public/user-facing surface: registration, login verification, event
/// claims by subject, and receipt verification.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(handlers::claims::register_user))
        .route("/auth/verify", post(handlers::claims::verify_auth))
        .route("/events/:eventId/claim", post(handlers::claims::claim_by_user))
        .route("/audit/receipts/verify", post(handlers::audit::verify_receipt_body))
        .route("/audit/receipts/verify-code", post(handlers::audit::verify_receipt_by_code))
        .nest("/admin", admin_routes())
        .nest("/master", master_routes())
}

/// Operator surface: login plus invite lifecycle.
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(handlers::admin::login))
        .route("/invite", post(handlers::admin::create_invite))
        .route("/rename", post(handlers::admin::rename_invite))
        .route("/revoke", post(handlers::admin::revoke_invite))
        .route("/invites", get(handlers::admin::list_invites))
        .route("/transfers", get(handlers::admin::transfers))
}

/// Master-only surface: audit log export, integrity checks, and the
/// cross-admin disclosure/search views.
fn master_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/audit-logs", get(handlers::master::audit_logs))
        .route("/audit-integrity", get(handlers::master::audit_integrity))
        .route("/transfers", get(handlers::master::admin_disclosures))
        .route("/admin-disclosures", get(handlers::master::admin_disclosures))
        .route("/search", get(handlers::master::search))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/v1/school", school_routes())
        .nest("/api", api_routes())
        .route("/metadata/:filename", get(handlers::audit::mint_metadata))
        .layer(axum::middleware::from_fn_with_state(state.clone(), dispatch_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn router_builds_and_serves_runtime_status() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let router = build_router(Arc::new(test_state()));
        let response = router
            .oneshot(Request::builder().uri("/v1/school/runtime-status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let router = build_router(Arc::new(test_state()));
        let response = router
            .oneshot(Request::builder().uri("/v1/school/does-not-exist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
