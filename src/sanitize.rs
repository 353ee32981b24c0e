//! 入力サニタイズ / バリデーション
//! 検索文字列・価格範囲・ID、および localStorage から読んだ cart レコードの検証

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{limits, CartLineItem, PriceRange};

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid identifier regex"));

const MARKUP_CHARS: [char; 8] = ['<', '>', '"', '\'', '&', '`', '{', '}'];

// ========================================
// Search
// ========================================

/// 検索文字列をサニタイズ（最大長 100）
pub fn sanitize_search_query(input: &str) -> String {
    sanitize_search_query_with_limit(input, limits::MAX_SEARCH_LENGTH)
}

/// タグ風の部分文字列と記号を除去し、trim して `max_len` 文字に切り詰める
///
/// 2回適用しても結果は変わらない。
pub fn sanitize_search_query_with_limit(input: &str, max_len: usize) -> String {
    let without_tags = TAG_PATTERN.replace_all(input, "");
    let cleaned: String = without_tags
        .chars()
        .filter(|c| !MARKUP_CHARS.contains(c))
        .collect();
    let truncated: String = cleaned.trim().chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// 文字列以外は空文字
pub fn sanitize_search_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_search_query(s),
        _ => String::new(),
    }
}

// ========================================
// Price range
// ========================================

/// 価格範囲をカタログの絶対範囲に収める
///
/// 逆転している場合はエラーにせず `[min, min]` に潰す。
pub fn validate_price_range(min: f64, max: f64, absolute_min: f64, absolute_max: f64) -> PriceRange {
    let (lo, hi) = if absolute_min <= absolute_max {
        (absolute_min, absolute_max)
    } else {
        (absolute_max, absolute_min)
    };

    let min = clamp_or(min, lo, hi, lo);
    let max = clamp_or(max, lo, hi, hi);

    if min > max {
        PriceRange::new(min, min)
    } else {
        PriceRange::new(min, max)
    }
}

// NaN は fallback、±inf は端に寄せる
fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

// ========================================
// Identifiers / cart records
// ========================================

/// 小文字英数字とハイフンのみ
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && id.len() <= limits::MAX_ID_LENGTH && IDENTIFIER_PATTERN.is_match(id)
}

/// 信頼できない JSON 値を CartLineItem として検証する
pub fn validate_line_item(value: &Value, max_quantity: u32) -> Result<CartLineItem, ValidationError> {
    let record = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let id = record
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("id"))?;
    if !is_valid_identifier(id) {
        return Err(ValidationError::InvalidId(id.chars().take(limits::MAX_ID_LENGTH).collect()));
    }

    let name = record
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("name"))?;
    if name.trim().is_empty() || name.chars().count() > limits::MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName {
            max: limits::MAX_NAME_LENGTH,
        });
    }

    let price = record
        .get("price")
        .and_then(Value::as_f64)
        .ok_or(ValidationError::MissingField("price"))?;
    if !(0.0..=limits::MAX_PRICE).contains(&price) {
        return Err(ValidationError::InvalidPrice);
    }

    let quantity = record
        .get("quantity")
        .and_then(Value::as_u64)
        .filter(|q| *q >= 1 && *q <= u64::from(max_quantity))
        .ok_or(ValidationError::InvalidQuantity { max: max_quantity })?;

    let image = record
        .get("image")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("image"))?;

    Ok(CartLineItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        image: image.to_string(),
        // filter 済みなので u32 に収まる
        quantity: quantity as u32,
    })
}
