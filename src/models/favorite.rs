//! Favorite item model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FavoriteItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: String,
    pub title: String,
    pub product_url: String,
    pub image_url: Option<String>,
    /// Price observed when the favorite was added
    pub price_at_add: f64,
    /// Last price observed by the price-drop sweep
    pub last_price: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl FavoriteItem {
    /// Percentage drop from the last observed price to `new_price`,
    /// rounded to whole percent. Zero when the price did not fall.
    pub fn drop_percent(&self, new_price: f64) -> u32 {
        if self.last_price <= 0.0 || new_price >= self.last_price {
            return 0;
        }
        ((1.0 - new_price / self.last_price) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFavorite {
    pub user_id: i64,
    pub product_id: String,
    pub title: String,
    pub product_url: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(last_price: f64) -> FavoriteItem {
        FavoriteItem {
            id: 1,
            user_id: 1,
            product_id: "p1".to_string(),
            title: "Wireless earbuds".to_string(),
            product_url: "https://example.com/p1".to_string(),
            image_url: None,
            price_at_add: last_price,
            last_price,
            currency: "EUR".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_drop_percent() {
        let fav = favorite(20.0);
        assert_eq!(fav.drop_percent(19.0), 5);
        assert_eq!(fav.drop_percent(10.0), 50);
        assert_eq!(fav.drop_percent(20.0), 0);
        assert_eq!(fav.drop_percent(25.0), 0);
    }

    #[test]
    fn test_drop_percent_ignores_zero_baseline() {
        let fav = favorite(0.0);
        assert_eq!(fav.drop_percent(5.0), 0);
    }
}
