//! 商品グリッド
//! フィルタ条件の変更を購読して表示対象を導出し直す

use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::bus::Subscription;
use crate::cart::CartStore;
use crate::filter::FilterStore;
use crate::models::{AddOutcome, Product};

pub struct ProductGrid {
    filters: Arc<FilterStore>,
    cart: Arc<CartStore>,
    visible_ids: Arc<RwLock<Vec<String>>>,
    _subscription: Subscription,
}

impl ProductGrid {
    pub fn mount(filters: Arc<FilterStore>, cart: Arc<CartStore>) -> Self {
        let visible_ids = Arc::new(RwLock::new(ids_of(filters.visible())));

        let sink = Arc::clone(&visible_ids);
        let source = Arc::downgrade(&filters);
        let subscription = filters.subscribe(move |_| {
            if let Some(filters) = source.upgrade() {
                let ids = ids_of(filters.visible());
                *sink.write().unwrap_or_else(PoisonError::into_inner) = ids;
            }
        });

        Self {
            filters,
            cart,
            visible_ids,
            _subscription: subscription,
        }
    }

    /// 表示中の商品（表示順）
    pub fn products(&self) -> Vec<&Product> {
        let catalog = self.filters.catalog();
        let ids = self.visible_ids.read().unwrap_or_else(PoisonError::into_inner);
        let products = ids.iter().filter_map(|id| catalog.find(id)).collect();
        products
    }

    pub fn len(&self) -> usize {
        self.visible_ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 在庫切れ・未知の商品は追加しない
    pub fn add_to_cart(&self, id: &str) -> Option<AddOutcome> {
        let product = match self.filters.catalog().find(id) {
            Some(product) => product,
            None => {
                warn!(id, "Add to cart for unknown product");
                return None;
            }
        };
        if !product.in_stock {
            warn!(id, "Add to cart for out-of-stock product ignored");
            return None;
        }
        Some(self.cart.add_item(product))
    }

    pub fn quantity_in_cart(&self, id: &str) -> u32 {
        self.cart.quantity_of(id)
    }
}

fn ids_of(products: Vec<&Product>) -> Vec<String> {
    products.into_iter().map(|p| p.id.clone()).collect()
}
