//! Upstream Catalog Client
//! 上流の /api/market/items を呼び、失敗時はシミュレーションにフォールバックする

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::adapter::{self, AdapterError};
use crate::config::CatalogConfig;
use crate::models::{PageRequest, PageResult};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("upstream payload rejected: {0}")]
    Payload(#[from] AdapterError),
}

/// レスポンスに載せるデータ出所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Upstream,
    Simulated,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    catalog: CatalogConfig,
}

impl UpstreamClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        catalog: CatalogConfig,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("market-sim-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, catalog))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        catalog: CatalogConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            catalog,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET {base}/api/market/items
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, UpstreamError> {
        let url = format!("{}/api/market/items", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("page", request.page.to_string()),
            ("page_size", request.page_size.to_string()),
        ];
        if let Some(q) = &request.query {
            params.push(("q", q.clone()));
        }
        if let Some(category) = &request.category {
            params.push(("category", category.clone()));
        }
        if let Some(min) = request.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = request.max_price {
            params.push(("max_price", max.to_string()));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let payload: serde_json::Value = response.json().await?;
        let result = adapter::page_from_value(&payload, request.page_size, &self.catalog)?;

        info!(
            "📦 Upstream page {} served {} entries (more={})",
            request.page,
            result.entries.len(),
            result.more
        );
        Ok(result)
    }
}
