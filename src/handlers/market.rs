//! Market API Handlers
//! /api/market エンドポイント

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{self, CatalogError};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::feed::{FeedEvent, FeedFilters, FeedState};
use crate::models::{CatalogEntry, Category, PageRequest};
use crate::upstream::Source;
use crate::AppState;

// ========================================
// Response Types
// ========================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub success: bool,
    pub items: Vec<CatalogEntry>,
    pub more: bool,
    pub page: u64,
    pub page_size: u64,
    pub total_estimate: u64,
    pub source: Source,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ItemDetailResponse {
    pub success: bool,
    pub item: CatalogEntry,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub base_name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub success: bool,
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub success: bool,
    pub items: Vec<CatalogEntry>,
    pub next_page: Option<u64>,
    pub exhausted: bool,
    pub pages_scanned: u64,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

// ========================================
// Query Parameters
// ========================================

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_items: Option<u64>,
    pub max_pages: Option<u64>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ========================================
// Handlers
// ========================================

/// GET /api/health - ヘルスチェック
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "market-sim-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/market/items - ページ単位のアイテム一覧
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListItemsQuery>, QueryRejection>,
) -> ApiResult<ItemsResponse> {
    let Query(query) = query.map_err(query_error)?;
    let page = resolve_page(query.page).map_err(catalog_error)?;
    let page_size =
        resolve_page_size(query.page_size, state.config.max_page_size).map_err(catalog_error)?;

    let request = PageRequest {
        page,
        page_size,
        query: query.q,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };

    let (result, source) = state.load_page(&request).await.map_err(catalog_error)?;
    debug!(
        "Items page={} size={} matched={} more={} source={:?}",
        page,
        page_size,
        result.entries.len(),
        result.more,
        source
    );

    Ok(Json(ItemsResponse {
        success: true,
        items: result.entries,
        more: result.more,
        page,
        page_size,
        total_estimate: state.catalog.total_cap(),
        source,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/market/item/:item_id - アイテム詳細（nli-0000001 形式）
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> ApiResult<ItemDetailResponse> {
    let index = catalog::parse_entry_id(&item_id).map_err(catalog_error)?;
    let item = state.catalog.generate(index).map_err(catalog_error)?;

    Ok(Json(ItemDetailResponse {
        success: true,
        item,
    }))
}

/// GET /api/market/categories - カテゴリ一覧
pub async fn list_categories() -> Json<CategoryListResponse> {
    let categories = Category::ALL
        .into_iter()
        .map(|c| CategoryInfo {
            name: c.label(),
            base_name: c.base_name(),
        })
        .collect();

    Json(CategoryListResponse {
        success: true,
        categories,
    })
}

/// GET /api/market/browse - 複数ページをまたいで min_items 件まで集める
pub async fn browse(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> ApiResult<BrowseResponse> {
    let Query(query) = query.map_err(query_error)?;
    let page_size =
        resolve_page_size(query.page_size, state.config.max_page_size).map_err(catalog_error)?;
    let min_items = query.min_items.unwrap_or(page_size);
    let page_limit = state.config.browse_max_pages;
    let max_pages = query.max_pages.unwrap_or(page_limit).min(page_limit).max(1);

    let filters = FeedFilters {
        query: query.q,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };
    let mut feed = FeedState::new(filters, page_size);

    while feed.pages_loaded < max_pages && (feed.entries.len() as u64) < min_items {
        let Some(request) = feed.next_request() else {
            break;
        };
        let (result, _) = state.load_page(&request).await.map_err(catalog_error)?;
        feed = feed.reduce(FeedEvent::PageLoaded {
            page: request.page,
            result,
        });
    }

    info!(
        "🔎 Browse collected {} items over {} pages (exhausted={})",
        feed.entries.len(),
        feed.pages_loaded,
        feed.exhausted
    );

    let next_page = (!feed.exhausted).then_some(feed.next_page);
    Ok(Json(BrowseResponse {
        success: true,
        items: feed.entries,
        next_page,
        exhausted: feed.exhausted,
        pages_scanned: feed.pages_loaded,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

// ========================================
// Helper Functions
// ========================================

fn resolve_page(page: Option<i64>) -> Result<u64, CatalogError> {
    let page = page.unwrap_or(1);
    u64::try_from(page)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or(CatalogError::InvalidPage(page))
}

fn resolve_page_size(page_size: Option<i64>, max_page_size: u64) -> Result<u64, CatalogError> {
    let requested = page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
    let size = u64::try_from(requested)
        .ok()
        .filter(|s| *s >= 1)
        .ok_or(CatalogError::InvalidPageSize(requested))?;
    if size > max_page_size {
        debug!("page_size {} clamped to {}", size, max_page_size);
    }
    Ok(size.min(max_page_size))
}

fn query_error(e: QueryRejection) -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::BAD_REQUEST, e.body_text())
}

fn catalog_error(e: CatalogError) -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::BAD_REQUEST, e.to_string())
}

fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<ErrorResponse>) {
    warn!("API Error: {}", message);
    (status, Json(ErrorResponse { success: false, error: message }))
}
