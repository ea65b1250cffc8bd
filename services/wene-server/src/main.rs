//! WeNe participation-ledger API server.
//!
//! Wires every domain crate's service into one [`wene_api::state::AppState`],
//! builds the router, and serves it with graceful shutdown — the same shape
//! as the teacher's `openibank-api-server`, stripped of the pieces (Postgres
//! pool, JWT auth service, Prometheus exporter) this domain has no use for.

mod config;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wene_audit::{AuditChain, ImmutableSinkSet, ReqwestIngestSink};
use wene_identity::IdentityConfig;
use wene_pop::{PopChainStore, PopSigner};
use wene_receipts::{ClaimService, ConfirmationCodeReservation, ReceiptStore, UserRegistry};
use wene_search::SearchService;
use wene_store::{AdminCodeRepo, ClaimRepo, EventRepo, MemoryKvStore};

use wene_api::readiness::build_runtime_status;
use wene_api::state::{AppState, AppStateDeps};

use crate::config::{cors_origin_from_env, AuditSinkSettings, ServerSettings};

#[derive(Parser, Debug)]
#[command(name = "wene-server")]
#[command(author, version, about = "WeNe participation-ledger API server", long_about = None)]
struct Args {
    #[arg(long, env = "HOST")]
    host: Option<String>,

    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    init_logging();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting wene-server");

    let mut server = ServerSettings::from_env();
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    let state = Arc::new(build_state());

    let report = build_runtime_status(&state);
    if !report.ready {
        for issue in &report.blocking_issues {
            tracing::error!(issue = %issue, "startup readiness check failed");
        }
    }
    for warning in &report.warnings {
        tracing::warn!(warning = %warning, "startup readiness warning");
    }

    let app = wene_api::create_router(state);

    let addr = server.socket_addr();
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server.shutdown_timeout()))
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config::log_level_from_env()));
    tracing_subscriber::registry().with(env_filter).with(fmt::layer().with_target(true)).init();
}

/// Builds every domain service over one in-process `MemoryKvStore` backend
/// (the one production-shaped `KvStore` this workspace ships; a durable
/// backend is a deployment-time concern, spec §1 Non-goals).
fn build_state() -> AppState {
    let store = MemoryKvStore::shared();

    let sink_settings = AuditSinkSettings::from_env();
    let sinks = match &sink_settings.ingest_url {
        Some(url) => ImmutableSinkSet {
            object_store: None,
            kv_index: None,
            http_ingest: Some(Arc::new(ReqwestIngestSink::new(
                url.clone(),
                sink_settings.ingest_token.clone(),
                sink_settings.ingest_timeout_ms,
            ))),
        },
        None => ImmutableSinkSet::none(),
    };
    let audit = Arc::new(AuditChain::new(store.clone(), sinks, sink_settings.mode, sink_settings.source));

    let events = EventRepo::new(store.clone());
    let claims_repo = ClaimRepo::new(store.clone());
    let admin_codes = AdminCodeRepo::new(store.clone());

    let claims = ClaimService::new(
        events.clone(),
        claims_repo.clone(),
        ConfirmationCodeReservation::new(store.clone()),
        ReceiptStore::new(store.clone()),
        audit.clone(),
    );
    let pop = wene_pop::PopService::new(
        events.clone(),
        PopChainStore::new(store.clone()),
        audit.clone(),
        PopSigner::from_env(),
    );
    let search = SearchService::new(admin_codes.clone(), events.clone(), audit.clone());

    AppState::new(AppStateDeps {
        audit,
        events,
        claims_repo,
        claims,
        receipts: ReceiptStore::new(store.clone()),
        users: UserRegistry::new(store.clone()),
        pop,
        identity_config: IdentityConfig::from_env(),
        admin_codes,
        search,
        cors_origin: cors_origin_from_env(),
    })
}

async fn shutdown_signal(timeout: std::time::Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }

    tokio::time::sleep(timeout).await;
}
