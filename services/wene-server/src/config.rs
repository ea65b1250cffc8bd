//! Server configuration, read once at startup from the environment
//! (`.env` loaded via `dotenvy`, overridable by CLI flags), grounded on the
//! teacher's `ServerConfig`/`ServerSettings` split.

use std::net::SocketAddr;
use std::time::Duration;

use wene_types::constants::DEFAULT_INGEST_TIMEOUT_MS;
use wene_types::ImmutableMode;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(default_port()),
            shutdown_timeout_secs: std::env::var("SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().expect("invalid HOST/PORT")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// `wene-audit`'s immutable-sink fan-out config; read here rather than in
/// `wene-audit` itself so the crate stays free of env-reading concerns
/// (spec §4.B leaves sink wiring to the deployment, not the core).
#[derive(Debug, Clone)]
pub struct AuditSinkSettings {
    pub mode: ImmutableMode,
    pub ingest_url: Option<String>,
    pub ingest_token: Option<String>,
    pub ingest_timeout_ms: u64,
    pub source: String,
}

impl AuditSinkSettings {
    pub fn from_env() -> Self {
        Self {
            mode: ImmutableMode::parse(&std::env::var("AUDIT_IMMUTABLE_MODE").unwrap_or_default()),
            ingest_url: std::env::var("AUDIT_IMMUTABLE_INGEST_URL").ok(),
            ingest_token: std::env::var("AUDIT_IMMUTABLE_INGEST_TOKEN").ok(),
            ingest_timeout_ms: std::env::var("AUDIT_IMMUTABLE_INGEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_INGEST_TIMEOUT_MS),
            source: std::env::var("AUDIT_SOURCE").unwrap_or_else(|_| "wene".to_string()),
        }
    }
}

/// `CORS_ORIGIN` is surfaced as-is (including the unset/placeholder cases)
/// so [`wene_api::readiness`] can turn it into a warning instead of this
/// module silently normalizing it away.
pub fn cors_origin_from_env() -> Option<String> {
    std::env::var("CORS_ORIGIN").ok()
}

pub fn log_level_from_env() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}
