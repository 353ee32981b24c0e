//! Data Models
//! Product, Category, Plant, CartLineItem, FilterCriteria などのデータ構造定義

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ========================================
// Catalog
// ========================================

/// Product (静的カタログの1レコード、実行中は不変)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub plants: Vec<String>,
    pub image: String,
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub badge: Option<String>,
}

/// Category (products.json の categories)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Plant タグのメタデータ (plants.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub latin_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
}

// ========================================
// Cart
// ========================================

/// Cart line item (localStorage に JSON 配列として保存される)
///
/// name / price / image は追加時点のスナップショットで、カタログとは切り離されている。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// 新規行（数量 1）を Product から作る
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        to_minor_units(self.price).saturating_mul(i64::from(self.quantity))
    }
}

/// Cart の公開スナップショット
///
/// 変更のたびに丸ごと作り直して差し替える。購読者が受け取った値は以後変化しない。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub is_open: bool,
    pub updated_at_ms: Option<i64>,
}

impl CartSnapshot {
    pub fn with_items(&self, items: Vec<CartLineItem>) -> Self {
        Self {
            items,
            is_open: self.is_open,
            updated_at_ms: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn with_open(&self, is_open: bool) -> Self {
        Self {
            items: self.items.clone(),
            is_open,
            updated_at_ms: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn find(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.id == id)
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// 合計（保存しない、常に items から再計算）
///
/// 金額は最小通貨単位（セント）で保持するので `total == subtotal + shipping` が厳密に成り立つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub item_count: u32,
}

impl CartTotals {
    pub fn subtotal(&self) -> f64 {
        from_minor_units(self.subtotal_cents)
    }

    pub fn shipping(&self) -> f64 {
        from_minor_units(self.shipping_cents)
    }

    pub fn total(&self) -> f64 {
        from_minor_units(self.total_cents)
    }

    pub fn has_free_shipping(&self) -> bool {
        self.shipping_cents == 0
    }
}

/// add_item の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// 新しい行を追加した
    Added,
    /// 既存行の数量を +1 した
    Incremented,
    /// 上限に達しているので何もしなかった
    AtLimit,
    /// ID が不正なので追加しなかった
    Rejected,
}

// ========================================
// Filter
// ========================================

/// 価格範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// 並び替えキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// おすすめ順（featured を先頭に、それ以外はカタログ順）
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Featured,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Featured => "featured",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        SortKey::ALL.into_iter().find(|key| key.as_str() == s)
    }

    /// ソートのドロップダウン表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Featured => "Featured",
            SortKey::PriceAsc => "Price: low to high",
            SortKey::PriceDesc => "Price: high to low",
            SortKey::NameAsc => "Name: A to Z",
            SortKey::NameDesc => "Name: Z to A",
        }
    }
}

/// 現在のフィルタ条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub categories: BTreeSet<String>,
    pub plants: BTreeSet<String>,
    pub price_range: PriceRange,
    pub in_stock_only: bool,
    pub sort: SortKey,
    pub query: String,
}

impl FilterCriteria {
    /// 「フィルタなし」の初期状態（価格範囲はカタログ全体）
    pub fn unfiltered(bounds: PriceRange) -> Self {
        Self {
            categories: BTreeSet::new(),
            plants: BTreeSet::new(),
            price_range: bounds,
            in_stock_only: false,
            sort: SortKey::default(),
            query: String::new(),
        }
    }

    /// sort 以外の条件が初期状態と異なるか
    pub fn is_active(&self, bounds: PriceRange) -> bool {
        !self.categories.is_empty()
            || !self.plants.is_empty()
            || self.price_range != bounds
            || self.in_stock_only
            || !self.query.is_empty()
    }
}

// ========================================
// Limits
// ========================================

pub mod limits {
    pub const MAX_ID_LENGTH: usize = 100;
    pub const MAX_NAME_LENGTH: usize = 200;
    pub const MAX_QUANTITY: u32 = 99;
    pub const MAX_SEARCH_LENGTH: usize = 100;
    /// 1 商品あたりの価格上限（これを超える値は不正データ扱い）
    pub const MAX_PRICE: f64 = 1_000_000.0;
}

// ========================================
// Money helpers
// ========================================

pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_minor_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}
