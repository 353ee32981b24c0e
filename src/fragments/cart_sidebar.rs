//! カートのサイドバー
//! 行一覧・合計・開閉状態を表示し、数量変更などはストアに委譲する

use std::sync::{Arc, PoisonError, RwLock};

use crate::bus::Subscription;
use crate::cart::CartStore;
use crate::models::{from_minor_units, CartLineItem, CartSnapshot, CartTotals};

pub struct CartSidebar {
    store: Arc<CartStore>,
    view: Arc<RwLock<Arc<CartSnapshot>>>,
    _subscription: Subscription,
}

impl CartSidebar {
    pub fn mount(store: Arc<CartStore>) -> Self {
        let view = Arc::new(RwLock::new(store.snapshot()));
        let sink = Arc::clone(&view);
        let source = Arc::downgrade(&store);
        // 配信された値ではなくストアの最新値を読み直す
        let subscription = store.subscribe(move |_| {
            if let Some(store) = source.upgrade() {
                *sink.write().unwrap_or_else(PoisonError::into_inner) = store.snapshot();
            }
        });

        Self {
            store,
            view,
            _subscription: subscription,
        }
    }

    fn current(&self) -> Arc<CartSnapshot> {
        Arc::clone(&self.view.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_open(&self) -> bool {
        self.current().is_open
    }

    pub fn lines(&self) -> Vec<CartLineItem> {
        self.current().items.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current().items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        self.store.totals_of(&self.current())
    }

    /// 送料無料まであといくら（達していれば 0）
    pub fn free_shipping_remaining(&self) -> f64 {
        let threshold = self.store.config().free_shipping_threshold_cents();
        let remaining = threshold - self.totals().subtotal_cents;
        from_minor_units(remaining.max(0))
    }

    pub fn increment(&self, id: &str) -> bool {
        match self.current().find(id) {
            Some(line) => self.store.update_quantity(id, i64::from(line.quantity) + 1),
            None => false,
        }
    }

    /// 1 から減らすと行が消える
    pub fn decrement(&self, id: &str) -> bool {
        match self.current().find(id) {
            Some(line) => self.store.update_quantity(id, i64::from(line.quantity) - 1),
            None => false,
        }
    }

    pub fn set_quantity(&self, id: &str, quantity: i64) -> bool {
        self.store.update_quantity(id, quantity)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.store.remove_item(id)
    }

    pub fn clear(&self) {
        self.store.clear_cart();
    }

    pub fn open(&self) {
        self.store.open_cart();
    }

    pub fn close(&self) {
        self.store.close_cart();
    }
}
