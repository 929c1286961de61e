use std::sync::Arc;

use anyhow::Context;
use market_sim_server::{build_router, config::AppConfig, AppState};
use tracing::info;

// ========================================
// メイン
// ========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let bind_addr = config.bind_addr.clone();

    info!(
        "🛒 Catalog: cap={} price={}..{} {}",
        config.catalog.total_cap,
        config.catalog.min_price,
        config.catalog.max_price,
        config.catalog.currency
    );
    match &config.upstream_url {
        Some(url) => info!("🌐 Upstream catalog: {} (timeout {:?})", url, config.upstream_timeout),
        None => info!("🌐 No upstream catalog configured, serving simulated items only"),
    }

    let state = Arc::new(AppState::new(config).context("failed to build upstream client")?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("🚀 Market Simulation Server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
