//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc};

/// Map a country name to its ISO-style ship-to code.
/// Unknown countries fall back to the baseline code "US".
pub fn country_code(country: &str) -> &'static str {
    match country {
        "Ukraine" | "Україна" => "UA",
        "Germany" | "Deutschland" | "Німеччина" => "DE",
        "Poland" | "Polska" | "Польща" => "PL",
        "United Kingdom" | "UK" => "GB",
        "France" | "Франція" => "FR",
        "Spain" | "España" => "ES",
        "Italy" | "Italia" => "IT",
        "Czech Republic" | "Czechia" => "CZ",
        "Romania" | "România" => "RO",
        "Russia" | "Россия" => "RU",
        "USA" | "United States" => "US",
        _ => "US",
    }
}

/// Map a country name to the currency used for price display.
/// Unknown countries fall back to "USD".
pub fn country_currency(country: &str) -> &'static str {
    match country {
        "Ukraine" | "Україна" => "UAH",
        "Germany" | "Deutschland" | "Німеччина" => "EUR",
        "Poland" | "Polska" | "Польща" => "PLN",
        "United Kingdom" | "UK" => "GBP",
        "France" | "Франція" => "EUR",
        "Spain" | "España" => "EUR",
        "Italy" | "Italia" => "EUR",
        "Czech Republic" | "Czechia" => "CZK",
        "Romania" | "România" => "RON",
        "Russia" | "Россия" => "RUB",
        "USA" | "United States" => "USD",
        _ => "USD",
    }
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Shorten an order count for product cards (12456 -> "12.5K")
pub fn format_orders(orders: i64) -> String {
    if orders >= 1000 {
        format!("{:.1}K", orders as f64 / 1000.0)
    } else {
        orders.to_string()
    }
}

/// Truncate text to a maximum length on a char boundary with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Encode a non-negative number in base36 (lowercase)
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Strip HTML tags for the plain-text delivery fallback
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_fallback() {
        assert_eq!(country_code("Germany"), "DE");
        assert_eq!(country_code("Deutschland"), "DE");
        assert_eq!(country_code("Россия"), "RU");
        assert_eq!(country_code("Atlantis"), "US");
    }

    #[test]
    fn test_country_currency() {
        assert_eq!(country_currency("Ukraine"), "UAH");
        assert_eq!(country_currency("Czechia"), "CZK");
        assert_eq!(country_currency("Russia"), "RUB");
        assert_eq!(country_currency("Atlantis"), "USD");
    }

    #[test]
    fn test_format_orders() {
        assert_eq!(format_orders(999), "999");
        assert_eq!(format_orders(12456), "12.5K");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Price</b> dropped"), "Price dropped");
        assert_eq!(strip_html("plain"), "plain");
    }
}
