//! ヘッダーのカート件数バッジ

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::bus::Subscription;
use crate::cart::CartStore;

/// 表示上の上限（これを超えると "99+"）
const BADGE_DISPLAY_LIMIT: u32 = 99;

pub struct CartBadge {
    count: Arc<AtomicU32>,
    renders: Arc<AtomicUsize>,
    _subscription: Subscription,
}

impl CartBadge {
    pub fn mount(store: &Arc<CartStore>) -> Self {
        let count = Arc::new(AtomicU32::new(store.item_count()));
        let renders = Arc::new(AtomicUsize::new(1));

        let sink = Arc::clone(&count);
        let render_counter = Arc::clone(&renders);
        let source = Arc::downgrade(store);
        let subscription = store.subscribe(move |_| {
            if let Some(store) = source.upgrade() {
                sink.store(store.item_count(), Ordering::SeqCst);
            }
            render_counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            count,
            renders,
            _subscription: subscription,
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// 0 のときは非表示
    pub fn is_visible(&self) -> bool {
        self.count() > 0
    }

    pub fn label(&self) -> String {
        match self.count() {
            n if n > BADGE_DISPLAY_LIMIT => format!("{}+", BADGE_DISPLAY_LIMIT),
            n => n.to_string(),
        }
    }

    /// mount 後の描画回数（初回を含む）
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}
