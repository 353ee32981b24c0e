//! Change notification bus
//! 1トピック・最後の値が勝つスナップショット型の購読 (subscribe / notify)

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

type Listener<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// 購読者へ新しいスナップショットを配る
pub struct Notifier<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: Send + Sync + 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// 購読を登録する。返り値の `Subscription` を drop すると解除される。
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::new(listener)));
            id
        };
        debug!(subscription = id, "Subscribed");

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .listeners
                        .retain(|(listener_id, _)| *listener_id != id);
                    debug!(subscription = id, "Unsubscribed");
                }
            })),
        }
    }

    /// 全購読者に通知する
    ///
    /// ロックを外してから呼ぶので、listener の中で subscribe / 状態読み出しをしてもよい。
    pub fn notify(&self, value: &Arc<T>) {
        let listeners: Vec<Listener<T>> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl<T: Send + Sync + 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 購読ハンドル（fragment の mount 中だけ保持する）
pub struct Subscription {
    id: u64,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
