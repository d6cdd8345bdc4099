//! Affiliate search API service implementation
//!
//! This service owns the whole vendor query pipeline: signed request
//! construction, response normalization, quality-tier filtering, composite
//! scoring and pagination. Vendor failures never escape the pipeline
//! boundary; callers receive an unsuccessful outcome and render a localized
//! "nothing found" message.

use std::collections::BTreeMap;
use std::time::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};
use crate::config::VendorConfig;
use crate::models::product::{Product, SearchOutcome, SearchRequest};
use crate::utils::errors::{VendorError, VendorResult};
use crate::utils::helpers::country_code;

type HmacSha256 = Hmac<Sha256>;

/// Scoring weights for the composite ranking score
const RATING_WEIGHT: f64 = 0.35;
const ORDERS_WEIGHT: f64 = 0.30;
const DISCOUNT_WEIGHT: f64 = 0.20;
const FREE_SHIPPING_WEIGHT: f64 = 0.10;
const PRICE_WEIGHT_DEFAULT: f64 = 0.05;
const PRICE_WEIGHT_CHEAPER: f64 = 0.15;

/// How many raw results to request from the vendor per query
const VENDOR_PAGE_SIZE: u32 = 40;

/// Affiliate search service
#[derive(Debug, Clone)]
pub struct VendorService {
    client: Client,
    config: VendorConfig,
}

impl VendorService {
    /// Create a new VendorService instance
    pub fn new(config: VendorConfig) -> crate::utils::errors::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("DealScout-Bot/1.0")
            .build()?;

        Ok(Self { client, config })
    }

    /// Run the full pipeline for one search request.
    ///
    /// Network failure, missing credentials or an undecodable body all
    /// degrade to `success: false` with an empty product list.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        let raw = match self.query_vendor(request).await {
            Ok(products) => products,
            Err(e) => {
                warn!(query = %request.query, error = %e, "Vendor query failed, degrading to empty outcome");
                return SearchOutcome::failed();
            }
        };

        let total_fetched = raw.len();
        let filtered = apply_filters(raw, request);
        let ranked = rank(filtered, request.prefer_cheaper);

        let start = request.page * request.page_size;
        let end = start + request.page_size;
        let has_more = ranked.len() > end;
        let page: Vec<Product> = ranked.into_iter().skip(start).take(request.page_size).collect();

        debug!(
            query = %request.query,
            fetched = total_fetched,
            page = request.page,
            returned = page.len(),
            has_more = has_more,
            "Search pipeline completed"
        );

        SearchOutcome {
            success: true,
            products: page,
            total_found: total_fetched,
            has_more,
        }
    }

    /// Normalized vendor results without tier filtering or ranking.
    /// The price-drop sweep uses this to match a tracked favorite by id.
    pub async fn lookup(&self, request: &SearchRequest) -> VendorResult<Vec<Product>> {
        self.query_vendor(request).await
    }

    /// Issue the signed vendor request and normalize the response
    async fn query_vendor(&self, request: &SearchRequest) -> VendorResult<Vec<Product>> {
        if self.config.app_key.is_empty() || self.config.app_secret.is_empty() {
            return Err(VendorError::MissingCredentials);
        }

        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("app_key".to_string(), self.config.app_key.clone());
        params.insert("method".to_string(), "aliexpress.affiliate.product.query".to_string());
        params.insert("sign_method".to_string(), "hmac-sha256".to_string());
        params.insert("timestamp".to_string(), Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());
        params.insert("format".to_string(), "json".to_string());
        params.insert("v".to_string(), "2.0".to_string());
        params.insert("keywords".to_string(), request.query.clone());
        params.insert("target_currency".to_string(), request.currency.clone());
        params.insert("target_language".to_string(), "en".to_string());
        params.insert("ship_to_country".to_string(), country_code(&request.country).to_string());
        params.insert("page_no".to_string(), "1".to_string());
        params.insert("page_size".to_string(), VENDOR_PAGE_SIZE.to_string());
        params.insert("sort".to_string(), "SALE_PRICE_ASC".to_string());

        if let Some(tracking_id) = &self.config.tracking_id {
            params.insert("tracking_id".to_string(), tracking_id.clone());
        }
        if let Some(max_price) = request.max_price {
            // The vendor expects the cap in cents
            params.insert("max_sale_price".to_string(), ((max_price * 100.0) as i64).to_string());
        }
        if request.free_shipping_only {
            params.insert("delivery_days".to_string(), "60".to_string());
        }

        let sign = sign_params(&params, &self.config.app_secret);
        params.insert("sign".to_string(), sign);

        debug!(keywords = %request.query, ship_to = country_code(&request.country), "Sending vendor query");

        let response = self.client
            .post(&self.config.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VendorError::Timeout
                } else {
                    VendorError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(VendorError::RequestFailed(format!("HTTP {}", status)));
        }

        let body: QueryResponse = response.json().await
            .map_err(|e| VendorError::InvalidResponse(e.to_string()))?;

        let raw_products = body
            .aliexpress_affiliate_product_query_response
            .and_then(|r| r.resp_result)
            .and_then(|r| r.result)
            .and_then(|r| r.products)
            .map(|p| p.product)
            .unwrap_or_default();

        if raw_products.is_empty() {
            debug!(query = %request.query, "Vendor returned no products");
        }

        Ok(raw_products
            .into_iter()
            .filter_map(|raw| normalize_product(raw, &request.currency))
            .collect())
    }
}

/// Concatenate sorted key+value pairs and compute the HMAC-SHA256 request
/// signature as uppercase hex
pub fn sign_params(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut payload = String::new();
    for (key, value) in params {
        payload.push_str(key);
        payload.push_str(value);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes()).to_uppercase()
}

/// Map one vendor record into the canonical product shape.
/// Records without an id or a parsable price are dropped.
fn normalize_product(raw: VendorProduct, currency: &str) -> Option<Product> {
    let id = raw.product_id.map(json_to_string).filter(|s| !s.is_empty())?;
    let title = raw.product_title.unwrap_or_default();

    let original_price = parse_price(raw.target_original_price.as_deref());
    let price = parse_price(raw.target_sale_price.as_deref()).or(original_price)?;
    let original_price = original_price.unwrap_or(price);

    let discount_percent = match raw.discount.as_deref() {
        Some(d) if !d.is_empty() => d.trim_end_matches('%').parse::<u32>().unwrap_or(0),
        _ if original_price > price && original_price > 0.0 => {
            ((1.0 - price / original_price) * 100.0).round() as u32
        }
        _ => 0,
    };

    // Vendor reports the rating as a percentage; map to a 5-point scale
    let rating = raw.evaluate_rate
        .as_deref()
        .and_then(|r| r.trim_end_matches('%').parse::<f64>().ok())
        .unwrap_or(0.0)
        / 20.0;

    let orders = raw.lastest_volume
        .map(json_to_string)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);

    let product_url = raw.product_detail_url.unwrap_or_default();
    let affiliate_url = raw.promotion_link
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| product_url.clone());

    Some(Product {
        id,
        title,
        price,
        original_price,
        currency: currency.to_string(),
        discount_percent,
        rating,
        orders,
        image_url: raw.product_main_image_url.unwrap_or_default(),
        product_url,
        affiliate_url,
        free_shipping: raw.ship_to_days.is_some(),
        score: 0.0,
    })
}

/// Apply the quality tier thresholds plus the optional request filters
pub fn apply_filters(products: Vec<Product>, request: &SearchRequest) -> Vec<Product> {
    let (min_rating, min_orders) = request.quality.thresholds();

    products
        .into_iter()
        .filter(|p| p.rating >= min_rating && p.orders >= min_orders)
        .filter(|p| request.max_price.map_or(true, |cap| p.price <= cap))
        .filter(|p| !request.free_shipping_only || p.free_shipping)
        .filter(|p| !request.discount_only || p.discount_percent > 0)
        .collect()
}

/// Composite ranking score, rounded to three decimals
pub fn score_product(product: &Product, prefer_cheaper: bool) -> f64 {
    let price_weight = if prefer_cheaper { PRICE_WEIGHT_CHEAPER } else { PRICE_WEIGHT_DEFAULT };

    let normalized_price = (product.price / 100.0).min(1.0);
    let normalized_rating = product.rating / 5.0;
    let normalized_orders = (((product.orders + 1) as f64).log10() / 5.0).min(1.0);
    let normalized_discount = product.discount_percent as f64 / 100.0;

    let score = normalized_rating * RATING_WEIGHT
        + normalized_orders * ORDERS_WEIGHT
        + normalized_discount * DISCOUNT_WEIGHT
        + if product.free_shipping { FREE_SHIPPING_WEIGHT } else { 0.0 }
        - normalized_price * price_weight;

    (score * 1000.0).round() / 1000.0
}

/// Score and sort descending; the sort is stable so ties keep input order
pub fn rank(mut products: Vec<Product>, prefer_cheaper: bool) -> Vec<Product> {
    for product in &mut products {
        product.score = score_product(product, prefer_cheaper);
    }
    products.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    products
}

fn parse_price(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse::<f64>().ok())
}

fn json_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Vendor response envelope
#[derive(Debug, Deserialize)]
struct QueryResponse {
    aliexpress_affiliate_product_query_response: Option<RespEnvelope>,
}

#[derive(Debug, Deserialize)]
struct RespEnvelope {
    resp_result: Option<RespResult>,
}

#[derive(Debug, Deserialize)]
struct RespResult {
    result: Option<RespPayload>,
}

#[derive(Debug, Deserialize)]
struct RespPayload {
    products: Option<ProductList>,
}

#[derive(Debug, Deserialize)]
struct ProductList {
    #[serde(default)]
    product: Vec<VendorProduct>,
}

/// One raw vendor record; field names follow the vendor contract
#[derive(Debug, Default, Deserialize)]
struct VendorProduct {
    product_id: Option<serde_json::Value>,
    product_title: Option<String>,
    target_sale_price: Option<String>,
    target_original_price: Option<String>,
    discount: Option<String>,
    evaluate_rate: Option<String>,
    lastest_volume: Option<serde_json::Value>,
    product_main_image_url: Option<String>,
    product_detail_url: Option<String>,
    promotion_link: Option<String>,
    ship_to_days: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::QualityTier;

    fn product(id: &str, price: f64, discount: u32, rating: f64, orders: i64, free_shipping: bool) -> Product {
        Product {
            id: id.to_string(),
            title: format!("product {}", id),
            price,
            original_price: price * 2.0,
            currency: "USD".to_string(),
            discount_percent: discount,
            rating,
            orders,
            image_url: String::new(),
            product_url: String::new(),
            affiliate_url: String::new(),
            free_shipping,
            score: 0.0,
        }
    }

    fn request_with_quality(quality: QualityTier) -> SearchRequest {
        let mut request = SearchRequest::new("socks", "Germany", "EUR");
        request.quality = quality;
        request
    }

    #[test]
    fn test_high_tier_excludes_rating_below_threshold() {
        let request = request_with_quality(QualityTier::High);
        let filtered = apply_filters(vec![product("a", 10.0, 0, 4.6, 1000, false)], &request);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_high_tier_requires_both_thresholds() {
        // rating passes at 4.7 but 50 orders misses the 300 floor
        let request = request_with_quality(QualityTier::High);
        let filtered = apply_filters(vec![product("a", 10.0, 0, 4.7, 50, false)], &request);
        assert!(filtered.is_empty());

        let filtered = apply_filters(vec![product("a", 10.0, 0, 4.7, 300, false)], &request);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_default_tier_has_no_order_floor() {
        let request = request_with_quality(QualityTier::Default);
        let filtered = apply_filters(vec![product("a", 10.0, 0, 4.5, 0, false)], &request);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filters_respect_flags() {
        let mut request = request_with_quality(QualityTier::Minimum);
        request.discount_only = true;
        request.free_shipping_only = true;
        request.max_price = Some(15.0);

        let items = vec![
            product("no-discount", 10.0, 0, 4.5, 500, true),
            product("no-shipping", 10.0, 20, 4.5, 500, false),
            product("too-expensive", 20.0, 20, 4.5, 500, true),
            product("keeper", 10.0, 20, 4.5, 500, true),
        ];

        let filtered = apply_filters(items, &request);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "keeper");
    }

    #[test]
    fn test_score_regression_baseline() {
        // price 20, discount 50%, rating 4.8, orders 2000, free shipping,
        // prefer_cheaper = false:
        // 0.35*0.96 + 0.30*min(log10(2001)/5, 1) + 0.20*0.5 + 0.10 - 0.05*0.20
        let p = product("baseline", 20.0, 50, 4.8, 2000, true);
        let expected = 0.35 * 0.96
            + 0.30 * (2001f64.log10() / 5.0).min(1.0)
            + 0.20 * 0.5
            + 0.10
            - 0.05 * 0.20;
        let expected = (expected * 1000.0).round() / 1000.0;

        assert!((score_product(&p, false) - expected).abs() < 1e-9);
        assert!((score_product(&p, false) - 0.724).abs() < 1e-9);
    }

    #[test]
    fn test_prefer_cheaper_penalizes_price_harder() {
        let p = product("a", 80.0, 0, 4.5, 100, false);
        assert!(score_product(&p, true) < score_product(&p, false));
    }

    #[test]
    fn test_scoring_is_deterministic_and_orders_capped() {
        let huge = product("a", 10.0, 0, 4.5, 10_000_000, false);
        let s1 = score_product(&huge, false);
        let s2 = score_product(&huge, false);
        assert_eq!(s1, s2);

        // log10(10_000_001)/5 > 1 gets clamped to 1
        let clamped_orders_term = 0.30;
        let expected: f64 = ((4.5 / 5.0) * 0.35 + clamped_orders_term - 0.05 * 0.10) * 1000.0;
        assert!((s1 * 1000.0 - expected.round()).abs() < 1.0);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let a = product("first", 10.0, 10, 4.5, 100, false);
        let b = product("second", 10.0, 10, 4.5, 100, false);
        let ranked = rank(vec![a, b], false);
        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }

    #[test]
    fn test_rank_sorts_descending() {
        let weak = product("weak", 90.0, 0, 4.0, 10, false);
        let strong = product("strong", 10.0, 60, 4.9, 5000, true);
        let ranked = rank(vec![weak, strong], false);
        assert_eq!(ranked[0].id, "strong");
    }

    #[test]
    fn test_sign_params_shape_and_determinism() {
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "2".to_string());
        params.insert("a".to_string(), "1".to_string());

        let sig1 = sign_params(&params, "secret");
        let sig2 = sign_params(&params, "secret");
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 64);
        assert!(sig1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

        let other = sign_params(&params, "other-secret");
        assert_ne!(sig1, other);
    }

    #[test]
    fn test_normalize_derives_discount_and_rating() {
        let raw = VendorProduct {
            product_id: Some(serde_json::json!(1005001234)),
            product_title: Some("USB cable".to_string()),
            target_sale_price: Some("5.00".to_string()),
            target_original_price: Some("10.00".to_string()),
            discount: None,
            evaluate_rate: Some("96.0%".to_string()),
            lastest_volume: Some(serde_json::json!("2500")),
            product_main_image_url: None,
            product_detail_url: Some("https://example.com/item/1".to_string()),
            promotion_link: None,
            ship_to_days: Some(serde_json::json!("10")),
        };

        let p = normalize_product(raw, "EUR").unwrap();
        assert_eq!(p.id, "1005001234");
        assert_eq!(p.discount_percent, 50);
        assert!((p.rating - 4.8).abs() < 1e-9);
        assert_eq!(p.orders, 2500);
        assert!(p.free_shipping);
        // affiliate link falls back to the detail url
        assert_eq!(p.affiliate_url, "https://example.com/item/1");
    }

    #[test]
    fn test_normalize_drops_record_without_id() {
        let raw = VendorProduct {
            target_sale_price: Some("5.00".to_string()),
            ..Default::default()
        };
        assert!(normalize_product(raw, "EUR").is_none());
    }
}
