//! エラー型

use thiserror::Error;

/// Storage backend のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// 保存済み cart レコードが不正な理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing or mistyped field '{0}'")]
    MissingField(&'static str),

    #[error("invalid identifier '{0}'")]
    InvalidId(String),

    #[error("name must be non-empty and at most {max} characters")]
    InvalidName { max: usize },

    #[error("price must be a finite number between 0 and {}", crate::models::limits::MAX_PRICE)]
    InvalidPrice,

    #[error("quantity must be an integer between 1 and {max}")]
    InvalidQuantity { max: u32 },
}

/// カタログ読み込みのエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate product id '{0}'")]
    DuplicateId(String),

    #[error("invalid product '{id}': {reason}")]
    InvalidProduct { id: String, reason: String },
}
