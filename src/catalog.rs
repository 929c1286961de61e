//! Catalog Generator & Paginator
//! index から商品を決定的に生成し、ページ単位でフィルタして返す

use std::ops::Range;
use thiserror::Error;

use crate::config::CatalogConfig;
use crate::models::{CatalogEntry, Category, PageRequest, PageResult, Rarity};

pub const ENTRY_ID_PREFIX: &str = "nli-";
const PRICE_JITTER: f64 = 49.99;
const PRICE_STEPS: u64 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("index {index} is outside the catalog range 1..={cap}")]
    IndexOutOfRange { index: u64, cap: u64 },

    #[error("page must be at least 1 (got {0})")]
    InvalidPage(i64),

    #[error("page_size must be at least 1 (got {0})")]
    InvalidPageSize(i64),

    #[error("invalid entry id: {0:?}")]
    InvalidEntryId(String),
}

// ========================================
// Draw
// ========================================

/// Integer avalanche over the seed; returns the low 32 bits.
///
/// Intermediate products are kept at full width and only the final value is
/// truncated, so `mix(1) == 2973555223`.
pub fn mix(seed: u64) -> u32 {
    let mut s = u128::from((seed as u32).wrapping_add(0x6D2B_79F5));
    s = (s ^ (s >> 16)) * 0x045D_9F3B;
    s = (s ^ (s >> 16)) * 0x045D_9F3B;
    s ^= s >> 16;
    (s & 0xFFFF_FFFF) as u32
}

/// index ごとの疑似乱数 `[0, 1)`
pub fn draw(index: u64) -> f64 {
    f64::from(mix(index)) / 4_294_967_296.0
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

pub fn rating_for_draw(r: f64) -> f64 {
    round_to(3.0 + r * 2.0, 1)
}

// ========================================
// Entry ids
// ========================================

pub fn entry_id(index: u64) -> String {
    format!("{}{:07}", ENTRY_ID_PREFIX, index)
}

/// `nli-0000042` → 42
pub fn parse_entry_id(id: &str) -> Result<u64, CatalogError> {
    let digits = id
        .strip_prefix(ENTRY_ID_PREFIX)
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| CatalogError::InvalidEntryId(id.to_string()))?;
    digits
        .parse()
        .map_err(|_| CatalogError::InvalidEntryId(id.to_string()))
}

pub fn image_for_seed(seed: &str) -> String {
    format!("https://picsum.photos/seed/{}/400/300", seed)
}

// ========================================
// Catalog
// ========================================

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn total_cap(&self) -> u64 {
        self.config.total_cap
    }

    /// 商品を1件生成（範囲外の index はエラー、丸めない）
    pub fn generate(&self, index: u64) -> Result<CatalogEntry, CatalogError> {
        if index < 1 || index > self.config.total_cap {
            return Err(CatalogError::IndexOutOfRange {
                index,
                cap: self.config.total_cap,
            });
        }

        let r = draw(index);
        let category = Category::for_index(index);
        let step = (self.config.max_price - self.config.min_price) / PRICE_STEPS as f64;
        let price = round_to(
            self.config.min_price + (index % PRICE_STEPS) as f64 * step + r * PRICE_JITTER,
            2,
        );

        Ok(CatalogEntry {
            id: entry_id(index),
            name: format!("{} #{}", category.base_name(), index),
            category,
            // a floor with more than 2 decimals could round below itself
            price: price.max(self.config.min_price),
            currency: self.config.currency.clone(),
            rating: rating_for_draw(r),
            description: category.description(),
            image: image_for_seed(&format!("neuraluxe{}", index)),
            rarity: Rarity::from_draw(r),
        })
    }

    /// `[(page-1)*size + 1, page*size + 1)` clipped to the catalog range.
    ///
    /// The window is empty when it starts above the cap.
    pub fn window(&self, page: u64, page_size: u64) -> Range<u64> {
        let start = page
            .saturating_sub(1)
            .saturating_mul(page_size)
            .saturating_add(1);
        let end = page.saturating_mul(page_size).saturating_add(1);
        let cap_end = self.config.total_cap.saturating_add(1);
        start.min(cap_end)..end.min(cap_end)
    }

    /// ページ取得（window 内を昇順に生成し、category → price → query の順でフィルタ）
    pub fn page(&self, request: &PageRequest) -> Result<PageResult, CatalogError> {
        validate_request(request)?;
        let filter = PageFilter::from_request(request);

        let window = self.window(request.page, request.page_size);
        // inclusive upper edge of the unclipped window
        let upper_edge = request.page.saturating_mul(request.page_size);

        let mut scanned = 0u64;
        let mut entries = Vec::new();
        for index in window {
            let entry = self.generate(index)?;
            scanned += 1;
            if filter.matches(&entry) {
                entries.push(entry);
            }
        }

        let more = scanned >= request.page_size && upper_edge < self.config.total_cap;
        tracing::debug!(
            page = request.page,
            page_size = request.page_size,
            scanned,
            matched = entries.len(),
            more,
            "catalog page generated"
        );

        Ok(PageResult { entries, more })
    }
}

pub fn validate_request(request: &PageRequest) -> Result<(), CatalogError> {
    if request.page == 0 {
        return Err(CatalogError::InvalidPage(0));
    }
    if request.page_size == 0 {
        return Err(CatalogError::InvalidPageSize(0));
    }
    Ok(())
}

// ========================================
// Filters
// ========================================

/// 正規化済みフィルタ
#[derive(Debug, Default)]
struct PageFilter {
    category: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    query: Option<String>,
}

impl PageFilter {
    fn from_request(request: &PageRequest) -> Self {
        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_lowercase);
        let query = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        Self {
            category,
            min_price: request.min_price,
            max_price: request.max_price,
            query,
        }
    }

    fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(category) = &self.category {
            if entry.category.label().to_lowercase() != *category {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| entry.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| entry.price > max) {
            return false;
        }
        if let Some(query) = &self.query {
            if !entry.search_text().contains(query.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::default()
    }

    #[test]
    fn mix_matches_reference_values() {
        assert_eq!(mix(1), 2_973_555_223);
        assert_eq!(mix(2), 2_005_476_897);
        assert_eq!(mix(1000), 2_280_729_308);
    }

    #[test]
    fn generate_first_entry() {
        let entry = catalog().generate(1).unwrap();
        assert_eq!(
            entry,
            CatalogEntry {
                id: "nli-0000001".to_string(),
                name: "AutoFlow Bot #1".to_string(),
                category: Category::AutomationBots,
                price: 1064.57,
                currency: "USD".to_string(),
                rating: 4.4,
                description: "A premium automation bots designed for instant productivity and AI-enhanced workflows.".to_string(),
                image: "https://picsum.photos/seed/neuraluxe1/400/300".to_string(),
                rarity: Rarity::Ultra,
            }
        );
        assert_ne!(entry.id, catalog().generate(2).unwrap().id);
    }

    #[test]
    fn generate_reference_values() {
        let c = catalog();

        let low = c.generate(3).unwrap();
        assert_eq!(low.category, Category::FreelancerTools);
        assert_eq!(low.price, 3031.13);
        assert_eq!(low.rating, 3.0);
        assert_eq!(low.rarity, Rarity::Common);

        // index % 1000 == 0 sits at the bottom of the price scale
        let wrapped = c.generate(1000).unwrap();
        assert_eq!(wrapped.category, Category::AiTools);
        assert_eq!(wrapped.price, 56.54);

        let last = c.generate(1_000_000).unwrap();
        assert_eq!(last.id, "nli-1000000");
        assert_eq!(last.price, 31.66);
        assert_eq!(last.rarity, Rarity::Common);
    }

    #[test]
    fn generate_rejects_out_of_range() {
        let c = catalog();
        assert_eq!(
            c.generate(0),
            Err(CatalogError::IndexOutOfRange { index: 0, cap: 1_000_000 })
        );
        assert_eq!(
            c.generate(1_000_001),
            Err(CatalogError::IndexOutOfRange { index: 1_000_001, cap: 1_000_000 })
        );
    }

    #[test]
    fn entry_ids_round_trip_through_parser() {
        assert_eq!(parse_entry_id("nli-0000042"), Ok(42));
        assert_eq!(parse_entry_id(&entry_id(1_000_000)), Ok(1_000_000));
        for bad in ["", "nli-", "item-1", "nli-12a", "nli--5", "NLI-0000001"] {
            assert!(parse_entry_id(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn window_bounds() {
        let c = catalog();
        assert_eq!(c.window(1, 24), 1..25);
        assert_eq!(c.window(2, 24), 25..49);
        assert_eq!(c.window(41_667, 24), 999_985..1_000_001);
        assert!(c.window(41_668, 24).is_empty());
    }

    #[test]
    fn full_unfiltered_page() {
        let result = catalog().page(&PageRequest::new(1, 24)).unwrap();
        assert_eq!(result.entries.len(), 24);
        assert!(result.more);
        let ids: Vec<String> = result.entries.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<String> = (1..=24).map(entry_id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn page_rejects_invalid_requests() {
        let c = catalog();
        assert_eq!(c.page(&PageRequest::new(0, 24)), Err(CatalogError::InvalidPage(0)));
        assert_eq!(c.page(&PageRequest::new(1, 0)), Err(CatalogError::InvalidPageSize(0)));
    }

    #[test]
    fn category_filter_is_case_insensitive() {
        let result = catalog()
            .page(&PageRequest::new(1, 24).with_category("ai tools"))
            .unwrap();
        let ids: Vec<&str> = result.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["nli-0000010", "nli-0000020"]);
        assert!(result.more);
    }

    #[test]
    fn all_category_means_no_filter() {
        let result = catalog()
            .page(&PageRequest::new(1, 24).with_category("ALL"))
            .unwrap();
        assert_eq!(result.entries.len(), 24);
    }

    #[test]
    fn price_filter_is_inclusive() {
        let c = catalog();
        let result = c
            .page(&PageRequest::new(1, 24).with_price_range(Some(1064.57), Some(1064.57)))
            .unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].id, "nli-0000001");

        // no entry of the first window falls in this band
        let result = c
            .page(&PageRequest::new(1, 24).with_price_range(Some(500.0), Some(600.0)))
            .unwrap();
        assert!(result.entries.is_empty());
        assert!(result.more);
    }

    #[test]
    fn price_band_selects_matching_entries() {
        // a narrower price scale puts indices 49..=55 inside 500..=600
        let c = Catalog::new(CatalogConfig {
            max_price: 9999.99,
            ..CatalogConfig::default()
        });
        let result = c
            .page(&PageRequest::new(3, 24).with_price_range(Some(500.0), Some(600.0)))
            .unwrap();

        let ids: Vec<String> = result.entries.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<String> = (49..=55).map(entry_id).collect();
        assert_eq!(ids, expected);
        assert!(result
            .entries
            .iter()
            .all(|e| (500.0..=600.0).contains(&e.price)));
        assert!(result.more);
    }

    #[test]
    fn query_matches_name_description_and_category() {
        let c = catalog();

        let by_name = c.page(&PageRequest::new(1, 24).with_query("  #7 ")).unwrap();
        assert_eq!(by_name.entries.len(), 1);
        assert_eq!(by_name.entries[0].name, "Learning Module #7");

        let by_description = c
            .page(&PageRequest::new(1, 24).with_query("AI-ENHANCED"))
            .unwrap();
        assert_eq!(by_description.entries.len(), 24);

        let by_category = c
            .page(&PageRequest::new(1, 24).with_query("voice & language"))
            .unwrap();
        assert!(by_category
            .entries
            .iter()
            .all(|e| e.category == Category::VoiceAndLanguage));
        assert_eq!(by_category.entries.len(), 2);
    }

    #[test]
    fn last_partial_page_has_no_more() {
        let result = catalog().page(&PageRequest::new(41_667, 24)).unwrap();
        assert_eq!(result.entries.len(), 16);
        assert!(!result.more);
    }

    #[test]
    fn page_ending_exactly_at_cap_has_no_more() {
        let result = catalog().page(&PageRequest::new(40_000, 25)).unwrap();
        assert_eq!(result.entries.len(), 25);
        assert_eq!(result.entries.last().unwrap().id, "nli-1000000");
        assert!(!result.more);
    }

    #[test]
    fn page_beyond_cap_is_empty() {
        let result = catalog().page(&PageRequest::new(41_668, 24)).unwrap();
        assert_eq!(result, PageResult { entries: vec![], more: false });

        let result = catalog().page(&PageRequest::new(u64::MAX, u64::MAX)).unwrap();
        assert_eq!(result, PageResult { entries: vec![], more: false });
    }

    #[test]
    fn small_cap_is_honoured() {
        let c = Catalog::new(CatalogConfig {
            total_cap: 30,
            ..CatalogConfig::default()
        });
        let first = c.page(&PageRequest::new(1, 24)).unwrap();
        assert!(first.more);
        let second = c.page(&PageRequest::new(2, 24)).unwrap();
        assert_eq!(second.entries.len(), 6);
        assert!(!second.more);
        assert!(c.generate(31).is_err());
    }
}
