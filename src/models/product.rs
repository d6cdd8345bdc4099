//! Normalized product records and search pipeline types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Canonical product record produced by vendor response normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub original_price: f64,
    pub currency: String,
    /// Percent discount; derived from the price delta when the vendor
    /// does not supply it
    pub discount_percent: u32,
    /// Rating on a 5-point scale (vendor reports a percentage)
    pub rating: f64,
    pub orders: i64,
    pub image_url: String,
    pub product_url: String,
    pub affiliate_url: String,
    pub free_shipping: bool,
    /// Composite ranking score, filled by the scoring step
    pub score: f64,
}

/// Minimal renderable subset cached so a later favorite toggle can
/// resolve the item without re-querying the vendor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub title: String,
    pub product_url: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub currency: String,
}

impl ProductSnapshot {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            product_url: product.affiliate_url.clone(),
            image_url: if product.image_url.is_empty() {
                None
            } else {
                Some(product.image_url.clone())
            },
            price: product.price,
            currency: product.currency.clone(),
        }
    }

    /// Best-effort placeholder when the snapshot is gone from both the
    /// in-memory map and the table. Loss degrades, it never errors.
    pub fn placeholder(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            title: String::new(),
            product_url: String::new(),
            image_url: None,
            price: 0.0,
            currency: "USD".to_string(),
        }
    }
}

/// Quality tier filter buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    Minimum,
    Medium,
    High,
    Default,
}

impl QualityTier {
    /// Decode a tier token; unknown values fall back to `Default`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "minimum" | "low" => QualityTier::Minimum,
            "medium" | "average" => QualityTier::Medium,
            "high" | "premium" => QualityTier::High,
            _ => QualityTier::Default,
        }
    }

    /// (minimum rating, minimum order count) thresholds for the tier
    pub fn thresholds(&self) -> (f64, i64) {
        match self {
            QualityTier::Minimum => (4.0, 50),
            QualityTier::Medium => (4.3, 100),
            QualityTier::High => (4.7, 300),
            QualityTier::Default => (4.5, 0),
        }
    }
}

/// One call into the vendor query pipeline
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub country: String,
    pub currency: String,
    pub quality: QualityTier,
    pub max_price: Option<f64>,
    pub free_shipping_only: bool,
    pub discount_only: bool,
    pub prefer_cheaper: bool,
    /// Zero-based page into the filtered, scored list
    pub page: usize,
    pub page_size: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, country: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            country: country.into(),
            currency: currency.into(),
            quality: QualityTier::Default,
            max_price: None,
            free_shipping_only: false,
            discount_only: false,
            prefer_cheaper: false,
            page: 0,
            page_size: 5,
        }
    }
}

/// Pipeline output. `success: false` means the vendor was unreachable or
/// unconfigured; the caller renders a localized "nothing found" message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub success: bool,
    pub products: Vec<Product>,
    pub total_found: usize,
    pub has_more: bool,
}

impl SearchOutcome {
    pub fn failed() -> Self {
        Self {
            success: false,
            products: Vec::new(),
            total_found: 0,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse_aliases() {
        assert_eq!(QualityTier::parse("low"), QualityTier::Minimum);
        assert_eq!(QualityTier::parse("average"), QualityTier::Medium);
        assert_eq!(QualityTier::parse("premium"), QualityTier::High);
        assert_eq!(QualityTier::parse("HIGH"), QualityTier::High);
    }

    #[test]
    fn test_tier_parse_unknown_falls_back() {
        assert_eq!(QualityTier::parse("luxury"), QualityTier::Default);
        assert_eq!(QualityTier::parse(""), QualityTier::Default);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(QualityTier::Minimum.thresholds(), (4.0, 50));
        assert_eq!(QualityTier::Medium.thresholds(), (4.3, 100));
        assert_eq!(QualityTier::High.thresholds(), (4.7, 300));
        assert_eq!(QualityTier::Default.thresholds(), (4.5, 0));
    }

    #[test]
    fn test_snapshot_placeholder_is_empty_title() {
        let snap = ProductSnapshot::placeholder("p42");
        assert_eq!(snap.product_id, "p42");
        assert!(snap.title.is_empty());
    }
}
