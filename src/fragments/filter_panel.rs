//! フィルタパネル
//! カテゴリ・plant・価格・在庫・並び順・検索の入力をストアに渡す

use std::sync::{Arc, PoisonError, RwLock};

use crate::bus::Subscription;
use crate::filter::FilterStore;
use crate::models::{Category, FilterCriteria, Plant, PriceRange, SortKey};

pub struct FilterPanel {
    filters: Arc<FilterStore>,
    view: Arc<RwLock<Arc<FilterCriteria>>>,
    _subscription: Subscription,
}

impl FilterPanel {
    pub fn mount(filters: Arc<FilterStore>) -> Self {
        let view = Arc::new(RwLock::new(filters.criteria()));
        let sink = Arc::clone(&view);
        let source = Arc::downgrade(&filters);
        let subscription = filters.subscribe(move |_| {
            if let Some(filters) = source.upgrade() {
                *sink.write().unwrap_or_else(PoisonError::into_inner) = filters.criteria();
            }
        });

        Self {
            filters,
            view,
            _subscription: subscription,
        }
    }

    pub fn criteria(&self) -> Arc<FilterCriteria> {
        Arc::clone(&self.view.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn categories(&self) -> &[Category] {
        self.filters.catalog().categories()
    }

    pub fn plants(&self) -> &[Plant] {
        self.filters.catalog().plants()
    }

    pub fn price_bounds(&self) -> PriceRange {
        self.filters.catalog().price_bounds()
    }

    pub fn sort_options(&self) -> Vec<(SortKey, &'static str)> {
        SortKey::ALL.iter().map(|key| (*key, key.label())).collect()
    }

    pub fn is_category_selected(&self, id: &str) -> bool {
        self.criteria().categories.contains(id)
    }

    pub fn is_plant_selected(&self, id: &str) -> bool {
        self.criteria().plants.contains(id)
    }

    /// 「条件をクリア」ボタンの表示可否
    pub fn has_active_filters(&self) -> bool {
        self.criteria().is_active(self.price_bounds())
    }

    pub fn result_count(&self) -> usize {
        self.filters.result_count()
    }

    pub fn toggle_category(&self, id: &str) {
        self.filters.toggle_category(id);
    }

    pub fn toggle_plant(&self, id: &str) {
        self.filters.toggle_plant(id);
    }

    pub fn set_price_range(&self, min: f64, max: f64) {
        self.filters.set_price_range(min, max);
    }

    pub fn set_in_stock_only(&self, in_stock_only: bool) {
        self.filters.set_in_stock_only(in_stock_only);
    }

    /// `<select>` の値から並び順を設定する（未知の値は無視）
    pub fn select_sort(&self, value: &str) -> bool {
        match SortKey::from_str(value) {
            Some(sort) => {
                self.filters.set_sort(sort);
                true
            }
            None => false,
        }
    }

    pub fn search(&self, query: &str) {
        self.filters.set_search_query(query);
    }

    pub fn reset(&self) {
        self.filters.reset();
    }
}
