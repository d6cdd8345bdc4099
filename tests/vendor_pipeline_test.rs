//! Vendor query pipeline integration tests
//!
//! Exercises the full search pipeline against a mocked vendor endpoint:
//! normalization, quality filtering, scoring order, pagination, and the
//! degrade-to-unsuccessful failure semantics.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use DealScout::config::VendorConfig;
use DealScout::models::product::{QualityTier, SearchRequest};
use DealScout::services::VendorService;

fn vendor_config(api_url: String) -> VendorConfig {
    VendorConfig {
        api_url,
        app_key: "test-key".to_string(),
        app_secret: "test-secret".to_string(),
        tracking_id: Some("tracker-1".to_string()),
        timeout_seconds: 5,
    }
}

fn product_json(id: u64, sale: &str, original: &str, rate: &str, volume: &str) -> Value {
    json!({
        "product_id": id,
        "product_title": format!("Product {}", id),
        "target_sale_price": sale,
        "target_original_price": original,
        "evaluate_rate": rate,
        "lastest_volume": volume,
        "product_main_image_url": "https://img.example.com/p.jpg",
        "product_detail_url": format!("https://example.com/item/{}", id),
        "promotion_link": format!("https://s.click.example.com/{}", id),
        "ship_to_days": "10"
    })
}

fn vendor_body(products: Vec<Value>) -> Value {
    json!({
        "aliexpress_affiliate_product_query_response": {
            "resp_result": {
                "result": {
                    "products": { "product": products }
                }
            }
        }
    })
}

async fn mock_vendor(products: Vec<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor_body(products)))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn missing_credentials_degrade_to_unsuccessful_outcome() {
    let mut config = vendor_config("http://localhost:9".to_string());
    config.app_key = String::new();
    config.app_secret = String::new();

    let service = VendorService::new(config).unwrap();
    let outcome = service.search(&SearchRequest::new("socks", "Germany", "EUR")).await;

    assert!(!outcome.success);
    assert!(outcome.products.is_empty());
    assert!(!outcome.has_more);
}

#[tokio::test]
async fn vendor_error_status_never_escapes_the_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = VendorService::new(vendor_config(server.uri())).unwrap();
    let outcome = service.search(&SearchRequest::new("socks", "Germany", "EUR")).await;

    assert!(!outcome.success);
    assert!(outcome.products.is_empty());
}

#[tokio::test]
async fn undecodable_body_degrades_to_unsuccessful_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let service = VendorService::new(vendor_config(server.uri())).unwrap();
    let outcome = service.search(&SearchRequest::new("socks", "Germany", "EUR")).await;

    assert!(!outcome.success);
}

#[tokio::test]
async fn empty_result_set_is_a_successful_outcome() {
    let server = mock_vendor(vec![]).await;
    let service = VendorService::new(vendor_config(server.uri())).unwrap();

    let outcome = service.search(&SearchRequest::new("unobtainium", "Germany", "EUR")).await;

    assert!(outcome.success);
    assert!(outcome.products.is_empty());
    assert_eq!(outcome.total_found, 0);
}

#[tokio::test]
async fn quality_tier_filters_vendor_results() {
    // ratings 96% -> 4.8, 92% -> 4.6; the high tier requires 4.7 and 300 orders
    let server = mock_vendor(vec![
        product_json(1, "9.99", "19.99", "96.0%", "5000"),
        product_json(2, "9.99", "19.99", "92.0%", "5000"),
        product_json(3, "9.99", "19.99", "96.0%", "50"),
    ])
    .await;

    let service = VendorService::new(vendor_config(server.uri())).unwrap();
    let mut request = SearchRequest::new("socks", "Germany", "EUR");
    request.quality = QualityTier::High;

    let outcome = service.search(&request).await;

    assert!(outcome.success);
    assert_eq!(outcome.products.len(), 1);
    assert_eq!(outcome.products[0].id, "1");
    // the total still reflects everything the vendor returned
    assert_eq!(outcome.total_found, 3);
}

#[tokio::test]
async fn results_are_ordered_by_composite_score() {
    // id 1: weak (low rating, few orders, pricey); id 2: strong
    let server = mock_vendor(vec![
        product_json(1, "90.00", "90.00", "80.0%", "60"),
        product_json(2, "8.00", "20.00", "98.0%", "20000"),
    ])
    .await;

    let service = VendorService::new(vendor_config(server.uri())).unwrap();
    let mut request = SearchRequest::new("socks", "Germany", "EUR");
    request.quality = QualityTier::Minimum;

    let outcome = service.search(&request).await;

    assert_eq!(outcome.products.len(), 2);
    assert_eq!(outcome.products[0].id, "2");
    assert!(outcome.products[0].score > outcome.products[1].score);
}

#[tokio::test]
async fn pagination_slices_the_ranked_list_and_reports_has_more() {
    let products: Vec<Value> = (1..=8)
        .map(|i| product_json(i, "9.99", "19.99", "96.0%", "5000"))
        .collect();
    let server = mock_vendor(products).await;
    let service = VendorService::new(vendor_config(server.uri())).unwrap();

    let mut request = SearchRequest::new("socks", "Germany", "EUR");
    request.quality = QualityTier::Minimum;
    request.page_size = 5;

    let first = service.search(&request).await;
    assert_eq!(first.products.len(), 5);
    assert!(first.has_more);

    request.page = 1;
    let second = service.search(&request).await;
    assert_eq!(second.products.len(), 3);
    assert!(!second.has_more);
}

#[tokio::test]
async fn normalization_maps_vendor_fields() {
    let server = mock_vendor(vec![product_json(42, "5.00", "10.00", "90.0%", "1234")]).await;
    let service = VendorService::new(vendor_config(server.uri())).unwrap();

    let mut request = SearchRequest::new("cable", "Ukraine", "UAH");
    request.quality = QualityTier::Minimum;

    let outcome = service.search(&request).await;
    let product = &outcome.products[0];

    assert_eq!(product.id, "42");
    assert_eq!(product.currency, "UAH");
    assert!((product.rating - 4.5).abs() < 1e-9);
    assert_eq!(product.discount_percent, 50);
    assert_eq!(product.orders, 1234);
    assert!(product.free_shipping);
    assert_eq!(product.affiliate_url, "https://s.click.example.com/42");
}
