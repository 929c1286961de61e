//! Remote Payload Adapter
//! 上流カタログの緩い JSON を CatalogEntry に正規化する
//!
//! Field aliases and defaults are fixed here; anything not listed is ignored.
//!
//! | field       | keys                                | when missing                 |
//! |-------------|-------------------------------------|------------------------------|
//! | id          | `id`, `item_id`                     | error                        |
//! | name        | `name`, `title`                     | error                        |
//! | category    | `category`                          | error                        |
//! | price       | `price`, `amount`                   | error                        |
//! | currency    | `currency`                          | configured currency          |
//! | rating      | `rating`                            | 3.0                          |
//! | description | `description`                       | category template            |
//! | image       | `image`, `image_url`, `thumbnail`   | placeholder seeded by id     |
//! | rarity      | `rarity`                            | Common                       |

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::catalog::{entry_id, image_for_seed, round_to};
use crate::config::CatalogConfig;
use crate::models::{CatalogEntry, Category, PageResult, Rarity};

const ID_KEYS: &[&str] = &["id", "item_id"];
const NAME_KEYS: &[&str] = &["name", "title"];
const PRICE_KEYS: &[&str] = &["price", "amount"];
const IMAGE_KEYS: &[&str] = &["image", "image_url", "thumbnail"];
const CATEGORY_KEYS: &[&str] = &["category"];
const CURRENCY_KEYS: &[&str] = &["currency"];
const RATING_KEYS: &[&str] = &["rating"];
const DESCRIPTION_KEYS: &[&str] = &["description"];
const RARITY_KEYS: &[&str] = &["rarity"];
const ENTRY_LIST_KEYS: &[&str] = &["items", "entries"];
const MORE_KEYS: &[&str] = &["more", "has_more"];

const DEFAULT_RATING: f64 = 3.0;
const MAX_RATING: f64 = 5.0;

#[derive(Debug, Error, PartialEq)]
pub enum AdapterError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("price {price} is below the floor {floor}")]
    PriceBelowFloor { price: f64, floor: f64 },

    #[error("payload has no entry list")]
    MissingEntries,
}

/// 1件分の正規化
pub fn entry_from_value(value: &Value, config: &CatalogConfig) -> Result<CatalogEntry, AdapterError> {
    let obj = value.as_object().ok_or(AdapterError::NotAnObject)?;
    // null counts as absent, so a lower-priority alias still gets a chance
    let field = move |keys: &[&str]| {
        keys.iter()
            .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
    };

    let id = match field(ID_KEYS).ok_or(AdapterError::MissingField("id"))? {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => match n.as_u64() {
            Some(index) => entry_id(index),
            None => return Err(invalid("id", n)),
        },
        other => return Err(invalid("id", other)),
    };

    let name = field(NAME_KEYS)
        .ok_or(AdapterError::MissingField("name"))?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdapterError::MissingField("name"))?
        .to_string();

    let category_label = field(CATEGORY_KEYS)
        .ok_or(AdapterError::MissingField("category"))?
        .as_str()
        .ok_or_else(|| AdapterError::MissingField("category"))?;
    let category = Category::from_label(category_label)
        .ok_or_else(|| AdapterError::UnknownCategory(category_label.to_string()))?;

    let raw_price = field(PRICE_KEYS).ok_or(AdapterError::MissingField("price"))?;
    let price = number_from(raw_price)
        .filter(|p| p.is_finite())
        .ok_or_else(|| invalid("price", raw_price))?;
    let price = round_to(price, 2);
    if price < config.min_price {
        return Err(AdapterError::PriceBelowFloor {
            price,
            floor: config.min_price,
        });
    }

    let currency = field(CURRENCY_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| config.currency.clone(), str::to_string);

    let rating = match field(RATING_KEYS) {
        None => DEFAULT_RATING,
        Some(raw) => {
            let rating = number_from(raw)
                .filter(|r| r.is_finite())
                .ok_or_else(|| invalid("rating", raw))?;
            round_to(rating.clamp(DEFAULT_RATING, MAX_RATING), 1)
        }
    };

    let description = field(DESCRIPTION_KEYS)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| category.description(), str::to_string);

    let image = field(IMAGE_KEYS)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| image_for_seed(&id), str::to_string);

    let rarity = field(RARITY_KEYS)
        .and_then(Value::as_str)
        .and_then(Rarity::from_label)
        .unwrap_or(Rarity::Common);

    Ok(CatalogEntry {
        id,
        name,
        category,
        price,
        currency,
        rating,
        description,
        image,
        rarity,
    })
}

/// ページ全体の正規化（不正な要素はスキップ）
pub fn page_from_value(
    value: &Value,
    page_size: u64,
    config: &CatalogConfig,
) -> Result<PageResult, AdapterError> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(obj) => ENTRY_LIST_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .ok_or(AdapterError::MissingEntries)?,
        _ => return Err(AdapterError::NotAnObject),
    };

    let mut entries = Vec::with_capacity(list.len());
    for (position, item) in list.iter().enumerate() {
        match entry_from_value(item, config) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("⚠️  Skipping upstream entry #{}: {}", position, e),
        }
    }

    let declared_more = value
        .as_object()
        .and_then(|obj| MORE_KEYS.iter().find_map(|k| obj.get(*k)))
        .and_then(Value::as_bool);
    let more = declared_more.unwrap_or(list.len() as u64 >= page_size);

    Ok(PageResult { entries, more })
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(field: &'static str, value: impl std::fmt::Display) -> AdapterError {
    AdapterError::InvalidField {
        field,
        value: value.to_string(),
    }
}
