//! Storefront
//! 起動時に1回だけ作る共有状態（カタログ・カート・フィルタ）と fragment の mount

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::cart::{CartStore, ScrollLock};
use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::filter::FilterStore;
use crate::fragments::{CartBadge, CartSidebar, FilterPanel, ProductGrid};
use crate::storage::{FileStorage, Storage};

#[derive(Clone)]
pub struct Storefront {
    pub config: StoreConfig,
    pub catalog: Arc<Catalog>,
    pub cart: Arc<CartStore>,
    pub filters: Arc<FilterStore>,
}

impl Storefront {
    pub fn new(config: StoreConfig, catalog: Catalog, storage: Arc<dyn Storage>) -> Self {
        Self::build(config, catalog, |config| CartStore::load(config, storage))
    }

    /// ScrollLock を差し込んで作る
    pub fn with_scroll_lock(
        config: StoreConfig,
        catalog: Catalog,
        storage: Arc<dyn Storage>,
        scroll: Arc<dyn ScrollLock>,
    ) -> Self {
        Self::build(config, catalog, |config| {
            CartStore::load(config, storage).with_scroll_lock(scroll)
        })
    }

    /// カタログディレクトリとストレージディレクトリから起動する
    pub fn open(
        config: StoreConfig,
        catalog_dir: impl AsRef<Path>,
        storage_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let catalog = Catalog::load_from_dir(catalog_dir)?;
        let storage = FileStorage::open(storage_dir)?;
        Ok(Self::new(config, catalog, Arc::new(storage)))
    }

    fn build<F>(config: StoreConfig, catalog: Catalog, make_cart: F) -> Self
    where
        F: FnOnce(StoreConfig) -> CartStore,
    {
        let catalog = Arc::new(catalog);
        let cart = Arc::new(make_cart(config.clone()));
        let filters = Arc::new(FilterStore::new(Arc::clone(&catalog), &config));

        info!(
            products = catalog.products().len(),
            cart_lines = cart.snapshot().items.len(),
            "🚀 Storefront ready"
        );

        Self {
            config,
            catalog,
            cart,
            filters,
        }
    }

    pub fn mount_cart_badge(&self) -> CartBadge {
        CartBadge::mount(&self.cart)
    }

    pub fn mount_cart_sidebar(&self) -> CartSidebar {
        CartSidebar::mount(Arc::clone(&self.cart))
    }

    pub fn mount_product_grid(&self) -> ProductGrid {
        ProductGrid::mount(Arc::clone(&self.filters), Arc::clone(&self.cart))
    }

    pub fn mount_filter_panel(&self) -> FilterPanel {
        FilterPanel::mount(Arc::clone(&self.filters))
    }
}
