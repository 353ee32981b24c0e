//! 設定
//! Cart / Filter ストアの定数をまとめる。JSON または環境変数から上書きできる。

use serde::Deserialize;
use tracing::warn;

use crate::models::{limits, to_minor_units};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// localStorage のキー
    pub storage_key: String,
    /// 1行あたりの最大数量
    pub max_quantity: u32,
    /// この小計以上で送料無料
    pub free_shipping_threshold: f64,
    /// 送料（定額）
    pub shipping_fee: f64,
    /// 検索文字列の最大長
    pub max_search_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "cosme-cart".to_string(),
            max_quantity: limits::MAX_QUANTITY,
            free_shipping_threshold: 50.0,
            shipping_fee: 5.90,
            max_search_length: limits::MAX_SEARCH_LENGTH,
        }
    }
}

impl StoreConfig {
    /// JSON から読み込む。範囲外の値は警告を出してデフォルトに戻す
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// デフォルト値に環境変数（COSME_STORAGE_KEY, COSME_MAX_QUANTITY）を重ねる
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("COSME_STORAGE_KEY") {
            let key = key.trim();
            if key.is_empty() {
                warn!("COSME_STORAGE_KEY is empty, keeping default");
            } else {
                config.storage_key = key.to_string();
            }
        }

        if let Ok(raw) = std::env::var("COSME_MAX_QUANTITY") {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_quantity = n,
                _ => warn!(value = %raw, "Invalid COSME_MAX_QUANTITY, keeping default"),
            }
        }

        config.validated()
    }

    /// 使えない値をデフォルトに置き換える
    fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.storage_key.trim().is_empty() {
            warn!("storage_key is empty, keeping default");
            self.storage_key = defaults.storage_key;
        }
        if self.max_quantity == 0 {
            warn!("max_quantity must be at least 1, keeping default");
            self.max_quantity = defaults.max_quantity;
        }
        if !is_valid_amount(self.free_shipping_threshold) {
            warn!(
                value = self.free_shipping_threshold,
                "Invalid free_shipping_threshold, keeping default"
            );
            self.free_shipping_threshold = defaults.free_shipping_threshold;
        }
        if !is_valid_amount(self.shipping_fee) {
            warn!(value = self.shipping_fee, "Invalid shipping_fee, keeping default");
            self.shipping_fee = defaults.shipping_fee;
        }
        if self.max_search_length == 0 {
            warn!("max_search_length must be at least 1, keeping default");
            self.max_search_length = defaults.max_search_length;
        }

        self
    }

    pub fn free_shipping_threshold_cents(&self) -> i64 {
        to_minor_units(self.free_shipping_threshold)
    }

    pub fn shipping_fee_cents(&self) -> i64 {
        to_minor_units(self.shipping_fee)
    }
}

fn is_valid_amount(amount: f64) -> bool {
    (0.0..=limits::MAX_PRICE).contains(&amount)
}
