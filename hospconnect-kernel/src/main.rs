/**
 * HOSPCONNECT KERNEL - Point d'entrée du service
 *
 * RÔLE : Charge la configuration, ouvre le Record Store (fichiers JSON ou
 * mémoire), insère les données de démo si besoin, puis sert l'API REST.
 *
 * LOGS : tracing-subscriber, filtre via RUST_LOG (hospconnect_kernel=info
 * par défaut).
 */

use anyhow::Context;
use hospconnect_kernel::config::load_config;
use hospconnect_kernel::seed::seed_demo_data;
use hospconnect_kernel::{build_router, AppState, DocumentStore, JsonStore};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env facultatif
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hospconnect_kernel=info")),
        )
        .init();

    let cfg = load_config().await;

    let store = match &cfg.data_dir {
        Some(dir) => JsonStore::open(dir)
            .with_context(|| format!("failed to open record store in {}", dir.display()))?,
        None => {
            tracing::warn!("no data_dir configured, records are kept in memory only");
            JsonStore::in_memory()
        }
    };
    let store: Arc<dyn DocumentStore> = Arc::new(store);

    if cfg.seed_demo_data {
        seed_demo_data(store.as_ref(), OffsetDateTime::now_utc()).context("failed to seed demo data")?;
    }

    let app = build_router(AppState::new(store, cfg.data_dir.is_some()));

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    tracing::info!(addr = %cfg.bind, "listening");
    axum::serve(listener, app).await.context("http server failed")?;
    Ok(())
}
