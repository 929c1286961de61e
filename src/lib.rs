//! Market Simulation Server
//! 決定的に生成されるマーケットプレイスカタログを配信する API

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod upstream;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::catalog::{Catalog, CatalogError};
use crate::config::AppConfig;
use crate::models::{PageRequest, PageResult};
use crate::upstream::{Source, UpstreamClient, UpstreamError};

// ========================================
// 共有状態
// ========================================

pub struct AppState {
    pub config: AppConfig,
    pub catalog: Catalog,
    pub upstream: Option<UpstreamClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, UpstreamError> {
        let upstream = match &config.upstream_url {
            Some(url) => Some(UpstreamClient::new(
                url.clone(),
                config.upstream_timeout,
                config.catalog.clone(),
            )?),
            None => None,
        };
        Ok(Self::with_upstream(config, upstream))
    }

    pub fn with_upstream(config: AppConfig, upstream: Option<UpstreamClient>) -> Self {
        let catalog = Catalog::new(config.catalog.clone());
        Self {
            config,
            catalog,
            upstream,
        }
    }

    /// 上流があればそちらを優先し、失敗したらシミュレーションで代替
    pub async fn load_page(
        &self,
        request: &PageRequest,
    ) -> Result<(PageResult, Source), CatalogError> {
        catalog::validate_request(request)?;

        if let Some(upstream) = &self.upstream {
            match upstream.fetch_page(request).await {
                Ok(result) => return Ok((result, Source::Upstream)),
                Err(e) => warn!(
                    "⚠️  Upstream {} unavailable, serving simulated page: {}",
                    upstream.base_url(),
                    e
                ),
            }
        }

        let result = self.catalog.page(request)?;
        Ok((result, Source::Simulated))
    }
}

// ========================================
// ルーター
// ========================================

pub fn build_router(state: Arc<AppState>) -> Router {
    use handlers::market;

    Router::new()
        .route("/api/health", get(market::health_check))
        .route("/api/market/items", get(market::list_items))
        .route("/api/market/item/:item_id", get(market::get_item))
        .route("/api/market/categories", get(market::list_categories))
        .route("/api/market/browse", get(market::browse))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
