//! Feed State
//! 無限スクロールの蓄積バッファとページカーソルを reducer として表現する

use tracing::debug;

use crate::models::{CatalogEntry, PageRequest, PageResult};

/// フィード共通のフィルタ
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// フィルタ変更（蓄積をクリアして 1 ページ目から）
    Reset(FeedFilters),
    PageLoaded { page: u64, result: PageResult },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub filters: FeedFilters,
    pub page_size: u64,
    pub entries: Vec<CatalogEntry>,
    pub next_page: u64,
    pub exhausted: bool,
    pub pages_loaded: u64,
}

impl FeedState {
    pub fn new(filters: FeedFilters, page_size: u64) -> Self {
        Self {
            filters,
            page_size,
            entries: Vec::new(),
            next_page: 1,
            exhausted: false,
            pages_loaded: 0,
        }
    }

    /// 次に取得すべきページ（枯渇していれば None）
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.exhausted {
            return None;
        }
        Some(PageRequest {
            page: self.next_page,
            page_size: self.page_size,
            query: self.filters.query.clone(),
            category: self.filters.category.clone(),
            min_price: self.filters.min_price,
            max_price: self.filters.max_price,
        })
    }

    pub fn reduce(self, event: FeedEvent) -> Self {
        match event {
            FeedEvent::Reset(filters) => Self::new(filters, self.page_size),
            FeedEvent::PageLoaded { page, .. } if self.exhausted || page != self.next_page => {
                debug!(page, expected = self.next_page, "ignoring stale feed page");
                self
            }
            FeedEvent::PageLoaded { result, .. } => {
                let mut entries = self.entries;
                entries.extend(result.entries);
                Self {
                    entries,
                    next_page: self.next_page + 1,
                    // an empty page with more=true still advances
                    exhausted: !result.more,
                    pages_loaded: self.pages_loaded + 1,
                    ..self
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{entry_id, Catalog};
    use crate::config::CatalogConfig;
    use pretty_assertions::assert_eq;

    fn load(state: FeedState, catalog: &Catalog) -> FeedState {
        let request = state.next_request().expect("feed exhausted");
        let result = catalog.page(&request).unwrap();
        state.reduce(FeedEvent::PageLoaded {
            page: request.page,
            result,
        })
    }

    #[test]
    fn accumulates_pages_in_order() {
        let catalog = Catalog::default();
        let state = FeedState::new(FeedFilters::default(), 5);
        let state = load(load(state, &catalog), &catalog);

        let ids: Vec<String> = state.entries.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<String> = (1..=10).map(entry_id).collect();
        assert_eq!(ids, expected);
        assert_eq!(state.next_page, 3);
        assert_eq!(state.pages_loaded, 2);
        assert!(!state.exhausted);
    }

    #[test]
    fn empty_page_with_more_keeps_going() {
        let catalog = Catalog::default();
        let filters = FeedFilters {
            category: Some("AI Tools".to_string()),
            ..FeedFilters::default()
        };
        // first window 1..=5 holds no AI Tools entry
        let state = load(FeedState::new(filters, 5), &catalog);
        assert!(state.entries.is_empty());
        assert!(!state.exhausted);
        assert_eq!(state.next_page, 2);

        let state = load(state, &catalog);
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].id, "nli-0000010");
    }

    #[test]
    fn stops_at_catalog_end() {
        let catalog = Catalog::new(CatalogConfig {
            total_cap: 7,
            ..CatalogConfig::default()
        });
        let state = load(load(FeedState::new(FeedFilters::default(), 4), &catalog), &catalog);
        assert_eq!(state.entries.len(), 7);
        assert!(state.exhausted);
        assert_eq!(state.next_request(), None);
    }

    #[test]
    fn stale_pages_are_ignored() {
        let state = FeedState::new(FeedFilters::default(), 24);
        let result = Catalog::default().page(&PageRequest::new(3, 24)).unwrap();
        let after = state.clone().reduce(FeedEvent::PageLoaded { page: 3, result });
        assert_eq!(after, state);
    }

    #[test]
    fn reset_clears_accumulation() {
        let catalog = Catalog::default();
        let state = load(FeedState::new(FeedFilters::default(), 10), &catalog);
        let filters = FeedFilters {
            query: Some("studio".to_string()),
            ..FeedFilters::default()
        };
        let state = state.reduce(FeedEvent::Reset(filters.clone()));
        assert_eq!(state, FeedState::new(filters.clone(), 10));
        assert_eq!(
            state.next_request().and_then(|r| r.query),
            Some("studio".to_string())
        );
    }
}
