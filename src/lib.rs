//! cosme-store
//! コスメ EC ショーケースのクライアント側状態: 静的カタログ、フィルタ/ソート、
//! localStorage に保存されるモックのカート。

pub mod app;
pub mod bus;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod fragments;
pub mod logging;
pub mod models;
pub mod sanitize;
pub mod storage;

pub use app::Storefront;
pub use bus::{Notifier, Subscription};
pub use cart::{compute_totals, CartStore, NoScrollLock, ScrollLock};
pub use catalog::Catalog;
pub use config::StoreConfig;
pub use error::{CatalogError, StorageError, ValidationError};
pub use filter::{apply_filters, FilterStore};
pub use models::{
    AddOutcome, CartLineItem, CartSnapshot, CartTotals, Category, FilterCriteria, Plant,
    PriceRange, Product, SortKey,
};
pub use sanitize::{
    is_valid_identifier, sanitize_search_query, sanitize_search_value, validate_price_range,
};
pub use storage::{FileStorage, MemoryStorage, Storage};
