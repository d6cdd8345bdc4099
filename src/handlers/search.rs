//! Free-text search handlers
//!
//! Everything that funnels into the vendor query pipeline: plain product
//! queries, the "best under price" shorthand, the top-of-day view and the
//! shared execute step that the pagination and repeat callbacks reuse.

use rand::seq::SliceRandom;
use tracing::debug;
use crate::handlers::AppContext;
use crate::models::event::{KeyboardKind, Response};
use crate::models::product::SearchRequest;
use crate::models::user::UserProfile;
use crate::state::SearchSession;
use crate::utils::errors::Result;

/// Page size for the top-of-day view
const TOP_PAGE_SIZE: usize = 10;

/// Queries rotated through for the top-of-day view and daily broadcast
pub const TRENDING_QUERIES: [&str; 4] = ["bestseller", "trending", "hot deals", "popular"];

/// Handle a free-text message as a product search
pub async fn handle_free_text(text: &str, profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let text = text.trim();

    let mut session = if let Some(max_price) = parse_best_price(text) {
        debug!(user_id = profile.id, max_price = max_price, "Best-under-price search");
        let mut session = SearchSession::first_page("deals");
        session.max_price = Some(max_price);
        session.prefer_cheaper = true;
        session
    } else {
        // History records the query as typed; the session carries the
        // translated keywords
        ctx.services.db.history.record(profile.id, text).await?;
        let keywords = ctx.services.translation_service.to_search_keywords(text).await;
        SearchSession::first_page(keywords)
    };

    execute(profile, &mut session, ctx).await
}

/// Top-of-day view: trending query, ten items per page
pub async fn run_top_of_day(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let mut session = SearchSession::first_page(trending_query());
    session.page_size = TOP_PAGE_SIZE;

    let lang = profile.language.clone();
    let response = execute(profile, &mut session, ctx).await?;
    if response.products.is_empty() {
        return Ok(response);
    }

    Ok(Response {
        text: ctx.i18n.t("top10.title", &lang, None),
        ..response
    })
}

/// Run one page of the pipeline for the given session and remember the
/// session for a later "show more" callback.
pub async fn execute(profile: &UserProfile, session: &mut SearchSession, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();

    let request = SearchRequest {
        query: session.query.clone(),
        country: profile.country.clone(),
        currency: profile.currency.clone(),
        quality: session.quality,
        max_price: session.max_price,
        free_shipping_only: false,
        discount_only: false,
        prefer_cheaper: session.prefer_cheaper,
        page: session.page,
        page_size: session.page_size,
    };

    let outcome = ctx.services.vendor_service.search(&request).await;

    if !outcome.success || outcome.products.is_empty() {
        // Vendor failure and a genuinely empty result render the same way
        let text = ctx.i18n.t("search.no_products", &lang, None);
        return Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang));
    }

    ctx.services.snapshot_cache.put_all(&outcome.products);

    session.has_more = outcome.has_more;
    ctx.state.save_session(profile.telegram_id, session).await?;

    let mut params = std::collections::HashMap::new();
    params.insert("query".to_string(), session.query.clone());
    let header = ctx.i18n.t("search.results", &lang, Some(&params));

    Ok(Response::with_products(header, outcome.products, outcome.has_more).in_locale(lang))
}

/// Recognize the "best 20" / "/best 20" shorthand
pub fn parse_best_price(text: &str) -> Option<f64> {
    let lowered = text.trim().trim_start_matches('/').to_lowercase();
    let rest = lowered.strip_prefix("best ")?;
    rest.trim().parse::<f64>().ok().filter(|price| *price > 0.0)
}

fn trending_query() -> String {
    TRENDING_QUERIES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&TRENDING_QUERIES[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_best_price() {
        assert_eq!(parse_best_price("best 20"), Some(20.0));
        assert_eq!(parse_best_price("/best 12.5"), Some(12.5));
        assert_eq!(parse_best_price("Best 30"), Some(30.0));
    }

    #[test]
    fn test_parse_best_price_rejects_noise() {
        assert_eq!(parse_best_price("best socks"), None);
        assert_eq!(parse_best_price("best -5"), None);
        assert_eq!(parse_best_price("bluetooth headphones"), None);
    }

    #[test]
    fn test_trending_query_comes_from_rotation() {
        let query = trending_query();
        assert!(TRENDING_QUERIES.contains(&query.as_str()));
    }
}
