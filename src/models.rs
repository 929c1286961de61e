//! Data Models
//! Category, Rarity, CatalogEntry, PageRequest などのデータ構造定義

use serde::{Deserialize, Serialize};

// ========================================
// Category
// ========================================

/// カタログのカテゴリ（固定順序、index mod 10 で選択）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI Tools")]
    AiTools,
    #[serde(rename = "Automation Bots")]
    AutomationBots,
    #[serde(rename = "Trading Scripts")]
    TradingScripts,
    #[serde(rename = "Freelancer Tools")]
    FreelancerTools,
    #[serde(rename = "Design Studio")]
    DesignStudio,
    #[serde(rename = "Crypto Assets")]
    CryptoAssets,
    #[serde(rename = "Voice & Language")]
    VoiceAndLanguage,
    #[serde(rename = "Education Packs")]
    EducationPacks,
    #[serde(rename = "Developer Plugins")]
    DeveloperPlugins,
    #[serde(rename = "Global Add-Ons")]
    GlobalAddOns,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::AiTools,
        Category::AutomationBots,
        Category::TradingScripts,
        Category::FreelancerTools,
        Category::DesignStudio,
        Category::CryptoAssets,
        Category::VoiceAndLanguage,
        Category::EducationPacks,
        Category::DeveloperPlugins,
        Category::GlobalAddOns,
    ];

    pub fn for_index(index: u64) -> Category {
        Self::ALL[(index % Self::ALL.len() as u64) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::AiTools => "AI Tools",
            Category::AutomationBots => "Automation Bots",
            Category::TradingScripts => "Trading Scripts",
            Category::FreelancerTools => "Freelancer Tools",
            Category::DesignStudio => "Design Studio",
            Category::CryptoAssets => "Crypto Assets",
            Category::VoiceAndLanguage => "Voice & Language",
            Category::EducationPacks => "Education Packs",
            Category::DeveloperPlugins => "Developer Plugins",
            Category::GlobalAddOns => "Global Add-Ons",
        }
    }

    /// 商品名のベース部分
    pub fn base_name(self) -> &'static str {
        match self {
            Category::AiTools => "Neuraluxe AI Tool",
            Category::AutomationBots => "AutoFlow Bot",
            Category::TradingScripts => "Neuraluxe Trader",
            Category::FreelancerTools => "Freelance Boost Kit",
            Category::DesignStudio => "Studio Pack",
            Category::CryptoAssets => "Crypto Signal Module",
            Category::VoiceAndLanguage => "Voice Pack",
            Category::EducationPacks => "Learning Module",
            Category::DeveloperPlugins => "Dev Plugin",
            Category::GlobalAddOns => "Legacy Add-On",
        }
    }

    /// ラベルから逆引き（大文字小文字を区別しない）
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    pub fn description(self) -> String {
        format!(
            "A premium {} designed for instant productivity and AI-enhanced workflows.",
            self.label().to_lowercase()
        )
    }
}

// ========================================
// Rarity
// ========================================

/// レアリティ（draw の四分位で決まる）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Ultra,
    Limited,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Ultra, Rarity::Limited];

    /// `draw` is expected in `[0, 1)`.
    pub fn from_draw(draw: f64) -> Rarity {
        let quartile = (draw * Self::ALL.len() as f64).floor() as usize;
        Self::ALL[quartile.min(Self::ALL.len() - 1)]
    }

    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Ultra => "Ultra",
            Rarity::Limited => "Limited",
        }
    }

    pub fn from_label(label: &str) -> Option<Rarity> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label))
    }
}

// ========================================
// CatalogEntry
// ========================================

/// カタログの1商品（生成後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub price: f64,
    pub currency: String,
    pub rating: f64,
    pub description: String,
    pub image: String,
    pub rarity: Rarity,
}

impl CatalogEntry {
    /// 検索対象テキスト（name + description + category、小文字）
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.category.label()).to_lowercase()
    }
}

// ========================================
// Page
// ========================================

/// ページ取得リクエスト
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price_range(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }
}

/// ページ取得結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageResult {
    pub entries: Vec<CatalogEntry>,
    /// unfiltered window was full (filtered count is not considered)
    pub more: bool,
}
