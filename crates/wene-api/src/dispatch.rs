//! Request dispatcher middleware: path templating for audit event naming,
//! actor classification, fail-closed preflight, body redaction, and the
//! post-handler `API_*` audit append (spec §4.I), modeled on the teacher's
//! `middleware.rs` timing/security-header layers.

use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{json, Value};
use wene_types::{Actor, ActorType, CanonicalValue};

use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1_000_000;
const REDACTION_DEPTH: u32 = 4;
const MAX_ARRAY_ITEMS: usize = 20;
const MAX_OBJECT_KEYS: usize = 50;
const MAX_STRING_CHARS: usize = 160;

/// `{POST /api/admin/login|invite|rename|revoke}` — the only routes allowed
/// to proceed without a ready primary audit sink, since master/invite auth
/// itself has to work before anything else can.
fn is_fail_closed_exempt(method: &Method, path: &str) -> bool {
    method == Method::POST
        && matches!(
            path,
            "/api/admin/login" | "/api/admin/invite" | "/api/admin/rename" | "/api/admin/revoke"
        )
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Collapses a concrete path to its audit-naming template (spec §4.I).
fn templated_path(path: &str) -> String {
    match path_segments(path).as_slice() {
        ["v1", "school", "events", _event_id] => "/v1/school/events/:eventId".to_string(),
        ["v1", "school", "events", _event_id, "claimants"] => {
            "/v1/school/events/:eventId/claimants".to_string()
        }
        ["api", "events", _event_id, "claim"] => "/api/events/:eventId/claim".to_string(),
        _ => path.to_string(),
    }
}

fn audit_event_name(method: &Method, templated: &str) -> String {
    let mut slug = String::new();
    for c in templated.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_uppercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    format!("API_{}_{}", method.as_str(), slug.trim_matches('_'))
}

/// `eventId` for the per-stream audit chain, when the path names one;
/// routes without a natural event scope chain under `"dispatch"`.
fn event_id_from_path(path: &str) -> String {
    match path_segments(path).as_slice() {
        ["v1", "school", "events", event_id] => event_id.to_string(),
        ["v1", "school", "events", event_id, "claimants"] => event_id.to_string(),
        ["api", "events", event_id, "claim"] => event_id.to_string(),
        _ => "dispatch".to_string(),
    }
}

fn classify_actor(method: &Method, path: &str) -> ActorType {
    if path.starts_with("/api/admin/") || path.starts_with("/api/master/") {
        return ActorType::Operator;
    }
    if path.starts_with("/api/audit/receipts/verify") {
        return ActorType::Auditor;
    }
    if path == "/v1/school/claims" {
        return ActorType::Wallet;
    }
    if path.starts_with("/api/events/") && path.ends_with("/claim") {
        return ActorType::User;
    }
    if path.starts_with("/api/users/") || path == "/api/auth/verify" {
        return ActorType::User;
    }
    if path == "/v1/school/events/claimants" {
        return ActorType::Operator;
    }
    if path.starts_with("/v1/school/events") && method == Method::POST {
        return ActorType::Operator;
    }
    if path_segments(path).last() == Some(&"claimants") {
        return ActorType::Operator;
    }
    if path.starts_with("/v1/school/") {
        return ActorType::School;
    }
    ActorType::System
}

fn mask_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        address.to_string()
    }
}

fn actor_id(actor_type: ActorType, headers: &axum::http::HeaderMap, body: &Option<Value>) -> String {
    match actor_type {
        ActorType::Operator => headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|token| {
                let token = token.trim_start_matches("Bearer ").trim_start_matches("bearer ");
                token.chars().take(8).collect::<String>()
            })
            .unwrap_or_else(|| "anonymous".to_string()),
        ActorType::Wallet => body
            .as_ref()
            .and_then(|b| b.get("walletAddress"))
            .and_then(|v| v.as_str())
            .map(mask_wallet)
            .unwrap_or_else(|| "unknown".to_string()),
        ActorType::User => body
            .as_ref()
            .and_then(|b| b.get("userId").or_else(|| b.get("subject")))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| "anonymous".to_string()),
        ActorType::Auditor => "auditor".to_string(),
        ActorType::School => "anonymous".to_string(),
        ActorType::System => "system".to_string(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower == "code"
        || lower.ends_with("_code")
        || ["password", "pin", "token", "authorization", "secret", "private"]
            .iter()
            .any(|needle| lower.contains(needle))
}

/// Redacts sensitive keys and bounds depth/width/length, spec §4.I.
fn sanitize(value: &Value, depth: u32) -> Value {
    if depth == 0 {
        return json!("[TRUNCATED]");
    }
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map.iter().take(MAX_OBJECT_KEYS) {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), json!("[REDACTED]"));
                } else {
                    out.insert(key.clone(), sanitize(val, depth - 1));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().take(MAX_ARRAY_ITEMS).map(|v| sanitize(v, depth - 1)).collect())
        }
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            Value::String(s.chars().take(MAX_STRING_CHARS).collect())
        }
        other => other.clone(),
    }
}

fn is_json_content_type(req: &Request) -> bool {
    req.headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

fn fail_closed_response(detail: impl Into<String>) -> Response {
    let body = json!({"error": "audit log persistence failed", "detail": detail.into()});
    axum::response::IntoResponse::into_response((StatusCode::SERVICE_UNAVAILABLE, axum::Json(body)))
}

pub async fn dispatch_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();
    let query = uri.query().map(str::to_string);
    let headers = req.headers().clone();
    let has_authorization = headers.contains_key("authorization");
    let origin = headers
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let templated = templated_path(&path);
    let event_name = audit_event_name(&method, &templated);
    let event_id = event_id_from_path(&path);
    let actor_type = classify_actor(&method, &path);
    let mutating = matches!(method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE);
    let exempt = is_fail_closed_exempt(&method, &path);

    if mutating
        && !exempt
        && state.audit.mode() == wene_types::ImmutableMode::Required
        && !state.audit.sinks().has_primary()
    {
        return fail_closed_response("primary immutable sink is not configured");
    }

    let (req, body_json) = if mutating && is_json_content_type(&req) {
        let (parts, body) = req.into_parts();
        match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => {
                let parsed = serde_json::from_slice::<Value>(&bytes)
                    .unwrap_or_else(|_| json!({"parseError": "invalid_json"}));
                let rebuilt = Request::from_parts(parts, Body::from(bytes));
                (rebuilt, Some(parsed))
            }
            Err(_) => (Request::from_parts(parts, Body::empty()), None),
        }
    } else {
        (req, None)
    };

    let actor = Actor {
        actor_type,
        id: actor_id(actor_type, &headers, &body_json),
    };

    let start = Instant::now();
    let response = next.run(req).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    let mut data_fields = vec![
        ("route", CanonicalValue::string(templated.clone())),
        ("method", CanonicalValue::string(method.as_str())),
        ("status", CanonicalValue::Number(serde_json::Number::from(status.as_u16()))),
        (
            "statusClass",
            CanonicalValue::string(format!("{}xx", status.as_u16() / 100)),
        ),
        (
            "durationMs",
            CanonicalValue::Number(serde_json::Number::from(duration_ms)),
        ),
        ("hasAuthorization", CanonicalValue::Bool(has_authorization)),
    ];
    if let Some(origin) = &origin {
        data_fields.push(("origin", CanonicalValue::string(origin.clone())));
    }
    if let Some(query) = &query {
        data_fields.push(("query", CanonicalValue::string(query.clone())));
    }
    if let Some(body) = &body_json {
        let sanitized: CanonicalValue = sanitize(body, REDACTION_DEPTH).into();
        data_fields.push(("requestBody", sanitized));
    }
    if status.is_client_error() || status.is_server_error() {
        data_fields.push((
            "errorMessage",
            CanonicalValue::string(format!("http {}", status.as_u16())),
        ));
    }
    let data = CanonicalValue::object(data_fields);

    match state.audit.append(&event_name, &event_id, actor, data).await {
        Ok(_) => response,
        Err(err) => {
            if mutating && !exempt {
                fail_closed_response(err.to_string())
            } else {
                tracing::warn!(error = %err, route = %templated, "dispatcher audit append failed (non-blocking)");
                response
            }
        }
    }
}
