//! `/v1/school/runtime-status` readiness check (spec §4.J): aggregates
//! master-password, PoP signer, and audit-sink configuration into a single
//! blocking/warning report, grounded on the teacher's health-check handler
//! shape (one big serializable report, no partial credit).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use wene_types::ImmutableMode;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RuntimeChecks {
    pub admin_password_configured: bool,
    pub pop_enforced: bool,
    pub pop_signer_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pop_signer_pubkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pop_signer_error: Option<String>,
    pub audit_mode: ImmutableMode,
    pub audit_operational_ready: bool,
    pub audit_primary_sink_configured: bool,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RuntimeStatus {
    pub ready: bool,
    pub checked_at: String,
    pub checks: RuntimeChecks,
    pub blocking_issues: Vec<String>,
    pub warnings: Vec<String>,
}

const CORS_ORIGIN_PLACEHOLDER: &str = "*";

/// Builds the report without touching axum types, so `services/wene-server`
/// can call it directly for a startup log line as well as the HTTP route.
pub fn build_runtime_status(state: &AppState) -> RuntimeStatus {
    let mut blocking_issues = Vec::new();
    let mut warnings = Vec::new();

    let admin_password_configured = state.identity.config().master_configured();
    if !admin_password_configured {
        blocking_issues.push("master password is not configured".to_string());
    }

    let pop_enforced = state.pop.signer().enforce_onchain_pop();
    let (pop_signer_configured, pop_signer_pubkey, pop_signer_error) = match state.pop.signer().state() {
        Ok(signer_state) => (true, Some(signer_state.keypair.public_key_base58()), None),
        Err(err) => (false, None, Some(err.to_string())),
    };
    if pop_enforced && !pop_signer_configured {
        blocking_issues.push(format!(
            "PoP is enforced but the signer is misconfigured: {}",
            pop_signer_error.clone().unwrap_or_default()
        ));
    }

    let audit_mode = state.audit.mode();
    let audit_primary_sink_configured = state.audit.sinks().has_primary();
    let audit_operational_ready = audit_primary_sink_configured;
    if audit_mode == ImmutableMode::Required && !audit_operational_ready {
        blocking_issues.push("audit mode is required but the primary immutable sink is not operational".to_string());
    }

    let cors_origin = state.cors_origin.clone();
    match &cors_origin {
        None => warnings.push("CORS_ORIGIN is not set".to_string()),
        Some(origin) if origin == CORS_ORIGIN_PLACEHOLDER => {
            warnings.push("CORS_ORIGIN is still the default placeholder".to_string())
        }
        Some(_) => {}
    }

    RuntimeStatus {
        ready: blocking_issues.is_empty(),
        checked_at: chrono::Utc::now().to_rfc3339(),
        checks: RuntimeChecks {
            admin_password_configured,
            pop_enforced,
            pop_signer_configured,
            pop_signer_pubkey,
            pop_signer_error,
            audit_mode,
            audit_operational_ready,
            audit_primary_sink_configured,
            cors_origin,
        },
        blocking_issues,
        warnings,
    }
}

pub async fn runtime_status(State(state): State<Arc<AppState>>) -> Json<RuntimeStatus> {
    Json(build_runtime_status(&state))
}

#[derive(Debug, Serialize)]
pub struct PopStatus {
    pub enforced: bool,
    pub signer_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_pubkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_error: Option<String>,
}

/// `GET /v1/school/pop-status` — the PoP slice of [`RuntimeStatus`].
pub async fn pop_status(State(state): State<Arc<AppState>>) -> Json<PopStatus> {
    let report = build_runtime_status(&state);
    Json(PopStatus {
        enforced: report.checks.pop_enforced,
        signer_configured: report.checks.pop_signer_configured,
        signer_pubkey: report.checks.pop_signer_pubkey,
        signer_error: report.checks.pop_signer_error,
    })
}

#[derive(Debug, Serialize)]
pub struct AuditStatus {
    pub mode: ImmutableMode,
    pub primary_sink_configured: bool,
    pub operational_ready: bool,
}

/// `GET /v1/school/audit-status` — the audit slice of [`RuntimeStatus`].
pub async fn audit_status(State(state): State<Arc<AppState>>) -> Json<AuditStatus> {
    let report = build_runtime_status(&state);
    Json(AuditStatus {
        mode: report.checks.audit_mode,
        primary_sink_configured: report.checks.audit_primary_sink_configured,
        operational_ready: report.checks.audit_operational_ready,
    })
}
