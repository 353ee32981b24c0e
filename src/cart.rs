//! Cart Store
//! 全 fragment が共有する唯一のカート状態。変更のたびに保存し、購読者へ通知する。

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bus::{Notifier, Subscription};
use crate::config::StoreConfig;
use crate::models::{AddOutcome, CartLineItem, CartSnapshot, CartTotals, Product};
use crate::sanitize::{is_valid_identifier, validate_line_item};
use crate::storage::Storage;

/// カートを開いている間の背景スクロール制御
pub trait ScrollLock: Send + Sync {
    fn set_scroll_locked(&self, locked: bool);
}

/// 何もしない ScrollLock
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScrollLock;

impl ScrollLock for NoScrollLock {
    fn set_scroll_locked(&self, _locked: bool) {}
}

/// 通知は書き込みロックを外してから行う。
/// 並行して書き込まれると配信順が前後しうるので、購読者は受け取った値を保持せず
/// `snapshot()` で最新値を読み直すこと。
pub struct CartStore {
    config: StoreConfig,
    storage: Arc<dyn Storage>,
    scroll: Arc<dyn ScrollLock>,
    state: RwLock<Arc<CartSnapshot>>,
    notifier: Notifier<CartSnapshot>,
}

impl CartStore {
    /// ストレージから復元して作成する（不正なレコードは落として保存し直す）
    pub fn load(config: StoreConfig, storage: Arc<dyn Storage>) -> Self {
        let items = restore_items(storage.as_ref(), &config);
        info!(
            key = %config.storage_key,
            lines = items.len(),
            "🛒 Cart restored"
        );

        Self {
            config,
            storage,
            scroll: Arc::new(NoScrollLock),
            state: RwLock::new(Arc::new(CartSnapshot {
                items,
                is_open: false,
                updated_at_ms: None,
            })),
            notifier: Notifier::new(),
        }
    }

    pub fn with_scroll_lock(mut self, scroll: Arc<dyn ScrollLock>) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================
    // Read
    // ========================================

    /// 現在のスナップショット
    pub fn snapshot(&self) -> Arc<CartSnapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn items(&self) -> Vec<CartLineItem> {
        self.snapshot().items.clone()
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.snapshot().find(id).map_or(0, |line| line.quantity)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().find(id).is_some()
    }

    pub fn is_open(&self) -> bool {
        self.snapshot().is_open
    }

    pub fn totals(&self) -> CartTotals {
        compute_totals(&self.snapshot().items, &self.config)
    }

    /// 任意のスナップショットの合計（fragment が受け取った値用）
    pub fn totals_of(&self, snapshot: &CartSnapshot) -> CartTotals {
        compute_totals(&snapshot.items, &self.config)
    }

    pub fn total(&self) -> f64 {
        self.totals().total()
    }

    pub fn item_count(&self) -> u32 {
        self.totals().item_count
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<CartSnapshot>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    // ========================================
    // Mutations
    // ========================================

    /// 商品を1つ追加する。既にあれば +1（上限では何もしない）
    pub fn add_item(&self, product: &Product) -> AddOutcome {
        if !is_valid_identifier(&product.id) {
            warn!(id = %product.id, "Refusing to add product with invalid id");
            return AddOutcome::Rejected;
        }

        let max = self.config.max_quantity;
        let mut outcome = AddOutcome::AtLimit;
        let next = self.mutate(|current| {
            let mut items = current.items.clone();
            match items.iter().position(|line| line.id == product.id) {
                Some(index) if items[index].quantity >= max => return None,
                Some(index) => {
                    items[index].quantity += 1;
                    outcome = AddOutcome::Incremented;
                }
                None => {
                    items.push(CartLineItem::from_product(product));
                    outcome = AddOutcome::Added;
                }
            }
            Some(current.with_items(items))
        });

        match next {
            Some(snapshot) => {
                let quantity = snapshot.find(&product.id).map_or(0, |line| line.quantity);
                info!(id = %product.id, quantity, "Cart item added");
                self.publish(&snapshot, true);
            }
            None => debug!(id = %product.id, max, "Quantity already at limit, add ignored"),
        }
        outcome
    }

    /// 行を削除する。無ければ何もしない。
    pub fn remove_item(&self, id: &str) -> bool {
        let next = self.mutate(|current| {
            current.find(id)?;
            let items = current
                .items
                .iter()
                .filter(|line| line.id != id)
                .cloned()
                .collect();
            Some(current.with_items(items))
        });

        match next {
            Some(snapshot) => {
                info!(id, "Cart item removed");
                self.publish(&snapshot, true);
                true
            }
            None => {
                debug!(id, "Remove ignored, item not in cart");
                false
            }
        }
    }

    /// 数量を設定する。0 以下は削除、上限超えは上限に丸める。
    ///
    /// カートに無い ID は何もしない（暗黙の追加はしない）。
    pub fn update_quantity(&self, id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        let max = self.config.max_quantity;
        let quantity = if quantity > i64::from(max) {
            warn!(id, requested = quantity, max, "Quantity clamped to maximum");
            max
        } else {
            // 1..=max の範囲
            quantity as u32
        };

        let next = self.mutate(|current| {
            let existing = current.find(id)?;
            if existing.quantity == quantity {
                return None;
            }
            let items = current
                .items
                .iter()
                .map(|line| {
                    if line.id == id {
                        CartLineItem {
                            quantity,
                            ..line.clone()
                        }
                    } else {
                        line.clone()
                    }
                })
                .collect();
            Some(current.with_items(items))
        });

        match next {
            Some(snapshot) => {
                info!(id, quantity, "Cart quantity updated");
                self.publish(&snapshot, true);
                true
            }
            None => {
                debug!(id, quantity, "Quantity update ignored");
                false
            }
        }
    }

    /// カートを空にする（既に空なら何もしない）
    pub fn clear_cart(&self) {
        let next = self.mutate(|current| {
            if current.items.is_empty() {
                None
            } else {
                Some(current.with_items(Vec::new()))
            }
        });
        if let Some(snapshot) = next {
            info!("🗑️  Cart cleared");
            self.publish(&snapshot, true);
        }
    }

    pub fn open_cart(&self) {
        self.set_open(true);
    }

    pub fn close_cart(&self) {
        self.set_open(false);
    }

    pub fn toggle_cart(&self) {
        let open = !self.is_open();
        self.set_open(open);
    }

    fn set_open(&self, open: bool) {
        let next = self.mutate(|current| {
            if current.is_open == open {
                None
            } else {
                Some(current.with_open(open))
            }
        });
        if let Some(snapshot) = next {
            self.scroll.set_scroll_locked(open);
            debug!(open, "Cart visibility changed");
            self.publish(&snapshot, false);
        }
    }

    // ========================================
    // Internals
    // ========================================

    /// 書き込みロック内で新しいスナップショットを作って差し替える
    fn mutate<F>(&self, f: F) -> Option<Arc<CartSnapshot>>
    where
        F: FnOnce(&CartSnapshot) -> Option<CartSnapshot>,
    {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&**guard)?);
        *guard = Arc::clone(&next);
        Some(next)
    }

    fn publish(&self, snapshot: &Arc<CartSnapshot>, persist: bool) {
        if persist {
            persist_items(self.storage.as_ref(), &self.config.storage_key, &snapshot.items);
        }
        self.notifier.notify(snapshot);
    }
}

// ========================================
// Totals
// ========================================

/// 小計・送料・合計・点数を計算する
pub fn compute_totals(items: &[CartLineItem], config: &StoreConfig) -> CartTotals {
    // 不正な価格が紛れ込んでも panic させずに飽和させる
    let subtotal_cents = items
        .iter()
        .map(CartLineItem::line_total_cents)
        .fold(0i64, i64::saturating_add);
    let item_count = items
        .iter()
        .map(|line| line.quantity)
        .fold(0u32, u32::saturating_add);

    let shipping_cents = if subtotal_cents >= config.free_shipping_threshold_cents() {
        0
    } else {
        config.shipping_fee_cents()
    };

    CartTotals {
        subtotal_cents,
        shipping_cents,
        total_cents: subtotal_cents.saturating_add(shipping_cents),
        item_count,
    }
}

// ========================================
// Persistence
// ========================================

fn persist_items(storage: &dyn Storage, key: &str, items: &[CartLineItem]) {
    let json = match serde_json::to_string(items) {
        Ok(json) => json,
        Err(e) => {
            warn!("❌ Failed to serialize cart: {}", e);
            return;
        }
    };
    if let Err(e) = storage.set(key, &json) {
        warn!("❌ Failed to persist cart: {}", e);
    }
}

fn clear_key(storage: &dyn Storage, key: &str) {
    if let Err(e) = storage.remove(key) {
        warn!("Failed to clear corrupt cart key (not critical): {}", e);
    }
}

/// 保存済み blob を読み、レコードごとに検証する
fn restore_items(storage: &dyn Storage, config: &StoreConfig) -> Vec<CartLineItem> {
    let key = config.storage_key.as_str();

    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("❌ Cart storage read error: {}", e);
            return Vec::new();
        }
    };

    let records = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!(key, "Stored cart is not a JSON array, discarding");
            clear_key(storage, key);
            return Vec::new();
        }
        Err(e) => {
            warn!(key, "Stored cart is not valid JSON, discarding: {}", e);
            clear_key(storage, key);
            return Vec::new();
        }
    };

    let mut items: Vec<CartLineItem> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match validate_line_item(record, config.max_quantity) {
            Ok(item) if items.iter().any(|line| line.id == item.id) => {
                warn!(index, id = %item.id, "Dropping duplicate cart record");
            }
            Ok(item) => items.push(item),
            Err(e) => warn!(index, "Dropping invalid cart record: {}", e),
        }
    }

    if items.len() != records.len() {
        info!(
            kept = items.len(),
            dropped = records.len() - items.len(),
            "Re-persisting cleaned cart"
        );
        persist_items(storage, key, &items);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "serums".to_string(),
            price,
            description: String::new(),
            ingredients: Vec::new(),
            plants: Vec::new(),
            image: format!("/img/{}.jpg", id),
            in_stock: true,
            featured: false,
            badge: None,
        }
    }

    fn store_with(storage: &MemoryStorage) -> CartStore {
        CartStore::load(StoreConfig::default(), Arc::new(storage.clone()))
    }

    /// 容量超過などで常に失敗するストレージ
    struct UnavailableStorage;

    impl Storage for UnavailableStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn counting_subscriber(cart: &CartStore) -> (Arc<AtomicUsize>, Subscription) {
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let subscription = cart.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (notified, subscription)
    }

    #[test]
    fn add_inserts_then_increments() {
        let storage = MemoryStorage::new();
        let cart = store_with(&storage);
        let rose = product("rose-serum", 39.0);

        assert_eq!(cart.add_item(&rose), AddOutcome::Added);
        assert_eq!(cart.add_item(&rose), AddOutcome::Incremented);
        assert_eq!(cart.quantity_of("rose-serum"), 2);
        assert_eq!(cart.items().len(), 1);
        assert!(cart.snapshot().updated_at_ms.is_some());

        let persisted: Vec<CartLineItem> =
            serde_json::from_str(&storage.raw("cosme-cart").unwrap()).unwrap();
        assert_eq!(persisted, cart.items());
    }

    #[test]
    fn add_snapshots_name_price_and_image() {
        let cart = store_with(&MemoryStorage::new());
        let mut rose = product("rose-serum", 39.0);
        cart.add_item(&rose);

        rose.price = 45.0;
        rose.name = "Renamed".to_string();
        cart.add_item(&rose);

        let line = cart.snapshot().find("rose-serum").cloned().unwrap();
        assert_eq!(line.price, 39.0);
        assert_eq!(line.name, "Product rose-serum");
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn add_at_limit_is_a_silent_no_op() {
        let config = StoreConfig {
            max_quantity: 2,
            ..StoreConfig::default()
        };
        let cart = CartStore::load(config, Arc::new(MemoryStorage::new()));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _sub = cart.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let aloe = product("aloe-gel", 12.5);
        cart.add_item(&aloe);
        cart.add_item(&aloe);
        assert_eq!(cart.add_item(&aloe), AddOutcome::AtLimit);
        assert_eq!(cart.quantity_of("aloe-gel"), 2);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn add_rejects_invalid_ids() {
        let cart = store_with(&MemoryStorage::new());
        assert_eq!(cart.add_item(&product("Bad Id", 1.0)), AddOutcome::Rejected);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn update_to_zero_or_negative_removes() {
        let cart = store_with(&MemoryStorage::new());
        cart.add_item(&product("a", 1.0));
        cart.add_item(&product("b", 1.0));

        assert!(cart.update_quantity("a", 0));
        assert!(cart.update_quantity("b", -3));
        assert!(!cart.contains("a"));
        assert!(!cart.contains("b"));
    }

    #[test]
    fn update_sets_rather_than_increments_and_clamps() {
        let cart = store_with(&MemoryStorage::new());
        cart.add_item(&product("a", 1.0));

        assert!(cart.update_quantity("a", 5));
        assert_eq!(cart.quantity_of("a"), 5);
        assert!(cart.update_quantity("a", 500));
        assert_eq!(cart.quantity_of("a"), 99);
    }

    #[test]
    fn update_on_absent_id_is_a_no_op() {
        let storage = MemoryStorage::new();
        let cart = store_with(&storage);
        assert!(!cart.update_quantity("rose-serum", 3));
        assert!(!cart.contains("rose-serum"));
        assert_eq!(storage.raw("cosme-cart"), None);
    }

    #[test]
    fn remove_twice_is_idempotent() {
        let cart = store_with(&MemoryStorage::new());
        cart.add_item(&product("a", 1.0));
        assert!(cart.remove_item("a"));
        assert!(!cart.remove_item("a"));
        assert!(cart.items().is_empty());
    }

    #[test]
    fn clear_empties_and_persists() {
        let storage = MemoryStorage::new();
        let cart = store_with(&storage);
        cart.add_item(&product("a", 1.0));
        cart.clear_cart();
        assert!(cart.items().is_empty());
        assert_eq!(storage.raw("cosme-cart").as_deref(), Some("[]"));
    }

    #[test]
    fn clearing_an_empty_cart_neither_persists_nor_notifies() {
        let storage = MemoryStorage::new();
        let cart = store_with(&storage);
        let (notified, _sub) = counting_subscriber(&cart);

        cart.clear_cart();
        assert_eq!(storage.raw("cosme-cart"), None);
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        cart.add_item(&product("a", 1.0));
        cart.clear_cart();
        cart.clear_cart();
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unavailable_storage_starts_empty_and_still_updates_in_memory() {
        let cart = CartStore::load(StoreConfig::default(), Arc::new(UnavailableStorage));
        assert!(cart.items().is_empty());
        let (notified, _sub) = counting_subscriber(&cart);

        assert_eq!(cart.add_item(&product("aloe-gel", 12.5)), AddOutcome::Added);
        assert_eq!(cart.quantity_of("aloe-gel"), 1);
        assert!(cart.update_quantity("aloe-gel", 3));
        assert_eq!(cart.totals().subtotal_cents, 3750);
        assert!(cart.remove_item("aloe-gel"));
        cart.add_item(&product("aloe-gel", 12.5));
        cart.clear_cart();

        assert!(cart.items().is_empty());
        assert_eq!(notified.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn read_only_storage_tolerates_corrupt_blob_cleanup() {
        struct ReadOnly(MemoryStorage);
        impl Storage for ReadOnly {
            fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
                self.0.get(key)
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("read-only".to_string()))
            }
            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("read-only".to_string()))
            }
        }

        let dirty = MemoryStorage::with_entry(
            "cosme-cart",
            r#"[{"id":"a","name":"A","price":1.0,"image":"","quantity":1},{"id":"a"}]"#,
        );
        let cart = CartStore::load(StoreConfig::default(), Arc::new(ReadOnly(dirty)));
        assert_eq!(cart.quantity_of("a"), 1);

        let garbage = MemoryStorage::with_entry("cosme-cart", "{not json");
        let cart = CartStore::load(StoreConfig::default(), Arc::new(ReadOnly(garbage.clone())));
        assert!(cart.items().is_empty());
        assert_eq!(garbage.raw("cosme-cart").as_deref(), Some("{not json"));
    }

    #[test]
    fn totals_apply_shipping_below_threshold() {
        let cart = store_with(&MemoryStorage::new());
        cart.add_item(&product("a", 12.5));
        cart.add_item(&product("a", 12.5));

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.shipping_cents, 590);
        assert_eq!(totals.total_cents, 3090);
        assert_eq!(totals.item_count, 2);
        assert!((cart.total() - 30.90).abs() < 1e-9);

        cart.update_quantity("a", 4);
        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 5000);
        assert!(totals.has_free_shipping());
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn round_trip_through_storage() {
        let storage = MemoryStorage::new();
        let cart = store_with(&storage);
        cart.add_item(&product("rose-serum", 39.0));
        cart.add_item(&product("aloe-gel", 12.5));
        cart.update_quantity("aloe-gel", 3);

        let reloaded = store_with(&storage);
        assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn corrupt_records_are_dropped_and_cleaned_set_re_persisted() {
        let blob = r#"[
            {"id": "rose-serum", "name": "Rose Serum", "price": 39.0, "image": "/r.jpg", "quantity": 1},
            {"id": "aloe-gel", "name": "Aloe Gel", "price": -12.5, "image": "/a.jpg", "quantity": 1},
            {"id": "rose-serum", "name": "Rose Serum", "price": 39.0, "image": "/r.jpg", "quantity": 4}
        ]"#;
        let storage = MemoryStorage::with_entry("cosme-cart", blob);
        let cart = store_with(&storage);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of("rose-serum"), 1);

        let persisted: Vec<CartLineItem> =
            serde_json::from_str(&storage.raw("cosme-cart").unwrap()).unwrap();
        assert_eq!(persisted, cart.items());
    }

    #[test]
    fn absurd_stored_price_is_dropped_and_totals_stay_finite() {
        let blob = r#"[
            {"id": "a", "name": "A", "price": 1e300, "image": "", "quantity": 2},
            {"id": "b", "name": "B", "price": 10.0, "image": "", "quantity": 1}
        ]"#;
        let storage = MemoryStorage::with_entry("cosme-cart", blob);
        let cart = store_with(&storage);

        assert!(!cart.contains("a"));
        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 1000);
        assert_eq!(totals.total_cents, 1590);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let line = |id: &str| CartLineItem {
            id: id.to_string(),
            name: "P".to_string(),
            price: 1e300,
            image: String::new(),
            quantity: 99,
        };
        let totals = compute_totals(&[line("a"), line("b")], &StoreConfig::default());
        assert_eq!(totals.subtotal_cents, i64::MAX);
        assert_eq!(totals.shipping_cents, 0);
        assert_eq!(totals.total_cents, i64::MAX);
        assert_eq!(totals.item_count, 198);
    }

    #[test]
    fn zero_max_quantity_in_config_does_not_lose_the_cart_on_reload() {
        let storage = MemoryStorage::new();
        let config = StoreConfig::from_json(r#"{ "max_quantity": 0 }"#).unwrap();
        let cart = CartStore::load(config.clone(), Arc::new(storage.clone()));
        assert_eq!(cart.add_item(&product("aloe-gel", 12.5)), AddOutcome::Added);

        let reloaded = CartStore::load(config, Arc::new(storage.clone()));
        assert_eq!(reloaded.quantity_of("aloe-gel"), 1);
    }

    #[test]
    fn valid_blob_is_not_rewritten() {
        let blob = r#"[{"id":"a","name":"A","price":1.0,"image":"","quantity":1,"extra":true}]"#;
        let storage = MemoryStorage::with_entry("cosme-cart", blob);
        let cart = store_with(&storage);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(storage.raw("cosme-cart").as_deref(), Some(blob));
    }

    #[test]
    fn unparsable_blob_yields_empty_cart_and_clears_key() {
        for blob in ["{not json", r#"{"id":"a"}"#, "42"] {
            let storage = MemoryStorage::with_entry("cosme-cart", blob);
            let cart = store_with(&storage);
            assert!(cart.items().is_empty());
            assert_eq!(storage.raw("cosme-cart"), None);
        }
    }

    #[test]
    fn open_and_close_toggle_scroll_lock_and_notify() {
        #[derive(Default)]
        struct Recorder(AtomicBool);
        impl ScrollLock for Recorder {
            fn set_scroll_locked(&self, locked: bool) {
                self.0.store(locked, Ordering::SeqCst);
            }
        }

        let recorder = Arc::new(Recorder::default());
        let cart = store_with(&MemoryStorage::new()).with_scroll_lock(recorder.clone());
        let seen_open = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&seen_open);
        let _sub = cart.subscribe(move |snapshot| sink.store(snapshot.is_open, Ordering::SeqCst));

        cart.open_cart();
        assert!(cart.is_open());
        assert!(recorder.0.load(Ordering::SeqCst));
        assert!(seen_open.load(Ordering::SeqCst));

        cart.toggle_cart();
        assert!(!cart.is_open());
        assert!(!recorder.0.load(Ordering::SeqCst));
        assert!(!seen_open.load(Ordering::SeqCst));
    }

    #[test]
    fn published_snapshots_are_never_mutated() {
        let cart = store_with(&MemoryStorage::new());
        cart.add_item(&product("a", 1.0));
        let before = cart.snapshot();
        cart.add_item(&product("a", 1.0));
        assert_eq!(before.find("a").unwrap().quantity, 1);
        assert_eq!(cart.snapshot().find("a").unwrap().quantity, 2);
    }

    proptest! {
        #[test]
        fn repeated_adds_count_up_to_the_cap(calls in 0usize..150) {
            let cart = store_with(&MemoryStorage::new());
            let p = product("rose-serum", 39.0);
            for _ in 0..calls {
                cart.add_item(&p);
            }
            let expected = calls.min(99) as u32;
            prop_assert_eq!(cart.quantity_of("rose-serum"), expected);
        }

        #[test]
        fn total_is_subtotal_plus_shipping(prices in proptest::collection::vec((0u32..20_000, 1u32..10), 0..8)) {
            let config = StoreConfig::default();
            let items: Vec<CartLineItem> = prices
                .iter()
                .enumerate()
                .map(|(i, (cents, qty))| CartLineItem {
                    id: format!("p-{}", i),
                    name: "P".to_string(),
                    price: f64::from(*cents) / 100.0,
                    image: String::new(),
                    quantity: *qty,
                })
                .collect();
            let totals = compute_totals(&items, &config);
            prop_assert_eq!(totals.total_cents, totals.subtotal_cents + totals.shipping_cents);
            if totals.subtotal_cents >= 5000 {
                prop_assert_eq!(totals.shipping_cents, 0);
            } else {
                prop_assert_eq!(totals.shipping_cents, 590);
            }
        }
    }
}
