//! Security-header middleware applied on top of the request dispatcher
//! (spec §4.I's dispatcher owns timing, audit, and fail-closed logic;
//! this stays a separate layer since it is unconditional and has nothing
//! to do with auditing).

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert("Referrer-Policy", "strict-origin-when-cross-origin".parse().unwrap());
    headers.insert("Cache-Control", "no-store, no-cache, must-revalidate".parse().unwrap());
    response
}
