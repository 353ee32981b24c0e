//! Filter / Sort Pipeline
//! カタログと FilterCriteria から表示する商品リストを導出する

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::bus::{Notifier, Subscription};
use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::models::{FilterCriteria, PriceRange, Product, SortKey};
use crate::sanitize::{sanitize_search_query_with_limit, validate_price_range};

// ========================================
// Pure pipeline
// ========================================

/// 検索 → カテゴリ → plant → 価格 → 在庫 の順に絞り込み、安定ソートする
pub fn apply_filters<'a>(products: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    let query = criteria.query.to_lowercase();

    let mut visible: Vec<&Product> = products
        .iter()
        .filter(|p| matches_query(p, &query))
        .filter(|p| criteria.categories.is_empty() || criteria.categories.contains(&p.category))
        .filter(|p| {
            criteria.plants.is_empty() || p.plants.iter().any(|tag| criteria.plants.contains(tag))
        })
        .filter(|p| criteria.price_range.contains(p.price))
        .filter(|p| !criteria.in_stock_only || p.in_stock)
        .collect();

    sort_products(&mut visible, criteria.sort);
    visible
}

/// `query_lower` は小文字化済み。空なら常に一致。
pub fn matches_query(product: &Product, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    product.name.to_lowercase().contains(query_lower)
        || product.description.to_lowercase().contains(query_lower)
        || product
            .ingredients
            .iter()
            .any(|ingredient| ingredient.to_lowercase().contains(query_lower))
}

/// 全モード安定ソート（同値はカタログ順を保つ）
pub fn sort_products(products: &mut [&Product], sort: SortKey) {
    match sort {
        SortKey::Featured => products.sort_by_key(|p| !p.featured),
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::NameAsc => products.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => products.sort_by(|a, b| compare_names(&b.name, &a.name)),
    }
}

// 大文字小文字を無視して比較し、同じならバイト順
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ========================================
// FilterStore
// ========================================

/// 共有されるフィルタ状態
/// 通知の順序は `CartStore` と同じ扱い。購読者は `criteria()` を読み直すこと。
pub struct FilterStore {
    catalog: Arc<Catalog>,
    max_search_length: usize,
    state: RwLock<Arc<FilterCriteria>>,
    notifier: Notifier<FilterCriteria>,
}

impl FilterStore {
    pub fn new(catalog: Arc<Catalog>, config: &StoreConfig) -> Self {
        let initial = FilterCriteria::unfiltered(catalog.price_bounds());
        Self {
            catalog,
            max_search_length: config.max_search_length,
            state: RwLock::new(Arc::new(initial)),
            notifier: Notifier::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn criteria(&self) -> Arc<FilterCriteria> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<FilterCriteria>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// 現在の条件で見える商品
    pub fn visible(&self) -> Vec<&Product> {
        apply_filters(self.catalog.products(), &self.criteria())
    }

    pub fn result_count(&self) -> usize {
        self.visible().len()
    }

    pub fn has_active_filters(&self) -> bool {
        self.criteria().is_active(self.catalog.price_bounds())
    }

    pub fn toggle_category(&self, category: &str) {
        let category = category.trim();
        if category.is_empty() {
            return;
        }
        self.update(|criteria| {
            if !criteria.categories.remove(category) {
                criteria.categories.insert(category.to_string());
            }
        });
    }

    pub fn toggle_plant(&self, plant: &str) {
        let plant = plant.trim();
        if plant.is_empty() {
            return;
        }
        self.update(|criteria| {
            if !criteria.plants.remove(plant) {
                criteria.plants.insert(plant.to_string());
            }
        });
    }

    /// カタログの範囲に収めて設定する（逆転は1点に潰す）
    pub fn set_price_range(&self, min: f64, max: f64) {
        let bounds = self.catalog.price_bounds();
        let range: PriceRange = validate_price_range(min, max, bounds.min, bounds.max);
        self.update(|criteria| criteria.price_range = range);
    }

    pub fn set_in_stock_only(&self, in_stock_only: bool) {
        self.update(|criteria| criteria.in_stock_only = in_stock_only);
    }

    pub fn set_sort(&self, sort: SortKey) {
        self.update(|criteria| criteria.sort = sort);
    }

    pub fn set_search_query(&self, query: &str) {
        let query = sanitize_search_query_with_limit(query, self.max_search_length);
        self.update(|criteria| criteria.query = query);
    }

    pub fn reset(&self) {
        let bounds = self.catalog.price_bounds();
        self.update(|criteria| *criteria = FilterCriteria::unfiltered(bounds));
    }

    // 新しい criteria を作って差し替え、変化があれば通知
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut FilterCriteria),
    {
        let next = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let mut criteria = (**guard).clone();
            f(&mut criteria);
            if criteria == **guard {
                return;
            }
            let next = Arc::new(criteria);
            *guard = Arc::clone(&next);
            next
        };
        debug!(criteria = ?next, "Filter criteria changed");
        self.notifier.notify(&next);
    }
}
