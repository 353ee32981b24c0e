//! Catalog Module
//! 静的な products.json / plants.json を起動時に1回だけ読み込む

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::models::{limits, Category, Plant, PriceRange, Product};
use crate::sanitize::is_valid_identifier;

/// products.json の中身
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
    #[serde(default)]
    categories: Vec<Category>,
}

/// plants.json の中身
#[derive(Debug, Deserialize)]
struct PlantsDocument {
    #[serde(default)]
    plants: Vec<Plant>,
}

/// 読み取り専用のカタログ
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    categories: Vec<Category>,
    plants: Vec<Plant>,
    price_bounds: PriceRange,
}

impl Catalog {
    pub fn new(
        products: Vec<Product>,
        categories: Vec<Category>,
        plants: Vec<Plant>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !is_valid_identifier(&product.id) {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason: "id must be a lowercase alphanumeric-and-hyphen token".to_string(),
                });
            }
            if !(0.0..=limits::MAX_PRICE).contains(&product.price) {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason: format!(
                        "price must be between 0 and {}, got {}",
                        limits::MAX_PRICE,
                        product.price
                    ),
                });
            }
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }

        let price_bounds = compute_price_bounds(&products);

        Ok(Self {
            products,
            categories,
            plants,
            price_bounds,
        })
    }

    /// JSON 文字列から構築（plants.json は省略可）
    pub fn from_json(products_json: &str, plants_json: Option<&str>) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(products_json)?;
        let plants = match plants_json {
            Some(json) => serde_json::from_str::<PlantsDocument>(json)?.plants,
            None => Vec::new(),
        };
        Self::new(doc.products, doc.categories, plants)
    }

    /// ディレクトリから products.json と plants.json を読み込む
    pub fn load_from_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let products_json = fs::read_to_string(dir.join("products.json"))?;

        let plants_path = dir.join("plants.json");
        let plants_json = if plants_path.exists() {
            Some(fs::read_to_string(&plants_path)?)
        } else {
            warn!("plants.json not found in {:?}, plant metadata disabled", dir);
            None
        };

        let catalog = Self::from_json(&products_json, plants_json.as_deref())?;
        info!(
            products = catalog.products.len(),
            categories = catalog.categories.len(),
            plants = catalog.plants.len(),
            "📦 Catalog loaded from {:?}",
            dir
        );
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn plant(&self, id: &str) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    /// Product に付いている plant タグのうちメタデータがあるもの
    pub fn plants_for(&self, product: &Product) -> Vec<&Plant> {
        product
            .plants
            .iter()
            .filter_map(|tag| self.plant(tag))
            .collect()
    }

    pub fn featured(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.featured)
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// カタログ内の最小・最大価格（空なら 0..0）
    pub fn price_bounds(&self) -> PriceRange {
        self.price_bounds
    }
}

fn compute_price_bounds(products: &[Product]) -> PriceRange {
    let mut prices = products.iter().map(|p| p.price);
    match prices.next() {
        Some(first) => {
            let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
            PriceRange::new(min, max)
        }
        None => PriceRange::new(0.0, 0.0),
    }
}
