//! Query translation service implementation
//!
//! Free-text queries arrive in any of the supported languages; the vendor
//! only searches well in English. Translation is strictly best-effort: an
//! ASCII query passes through, a generative-text call handles the rest, and
//! two fallbacks (static lexicon, generic suffix) guarantee the pipeline is
//! never blocked by a translation failure.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use crate::config::TranslatorConfig;
use crate::utils::cache::BoundedMap;
use crate::utils::errors::{DealScoutError, Result};

/// Cap on the in-memory translation cache
const TRANSLATION_CACHE_CAPACITY: usize = 1000;

const TRANSLATE_SYSTEM_PROMPT: &str =
    "You are a product search query translator. Translate the given query to English \
     keywords suitable for a marketplace product search. Output ONLY the translated \
     keywords, 2-4 words. Keep brand names as-is. \
     Examples: \"кофта\" -> \"sweater hoodie women\", \"Kopfhörer\" -> \"headphones wireless\"";

/// Substring lexicon used when the generative call fails
const LEXICON: &[(&str, &str)] = &[
    ("кофта", "sweater hoodie"),
    ("навушники", "headphones earbuds"),
    ("наушники", "headphones earbuds"),
    ("чохол", "phone case"),
    ("чехол", "phone case"),
    ("кросівки", "sneakers shoes"),
    ("кроссовки", "sneakers shoes"),
    ("шкарпетки", "socks"),
    ("носки", "socks"),
    ("годинник", "watch"),
    ("часы", "watch"),
    ("сумка", "bag handbag"),
    ("телефон", "phone smartphone"),
    ("kopfhörer", "headphones wireless"),
    ("hülle", "phone case"),
    ("uhr", "watch"),
    ("schuhe", "shoes sneakers"),
];

/// Single-turn translation seam; implemented by the OpenAI-compatible
/// client and by test doubles
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    async fn translate(&self, query: &str) -> Result<String>;
}

/// Generative-text translator over an OpenAI-compatible chat endpoint
#[derive(Debug, Clone)]
pub struct GenerativeTranslator {
    client: Client,
    config: TranslatorConfig,
}

impl GenerativeTranslator {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl QueryTranslator for GenerativeTranslator {
    async fn translate(&self, query: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(DealScoutError::Translator("API key not configured".to_string()));
        }

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": TRANSLATE_SYSTEM_PROMPT },
                { "role": "user", "content": query },
            ],
            "max_tokens": 50,
        });

        let response = self.client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DealScoutError::Translator(format!("HTTP {}", response.status())));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if text.is_empty() {
            return Err(DealScoutError::Translator("Empty completion".to_string()));
        }

        Ok(text)
    }
}

/// Translation service with caching and fallbacks
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn QueryTranslator>,
    cache: Arc<Mutex<BoundedMap<String>>>,
    ascii_query: Regex,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn QueryTranslator>) -> Self {
        Self {
            translator,
            cache: Arc::new(Mutex::new(BoundedMap::new(TRANSLATION_CACHE_CAPACITY))),
            ascii_query: Regex::new(r"^[a-zA-Z0-9\s\-]+$").expect("static regex"),
        }
    }

    /// Turn a free-text query into English search keywords.
    /// Never fails: the worst case appends a generic suffix token.
    pub async fn to_search_keywords(&self, query: &str) -> String {
        let query = query.trim();
        if self.ascii_query.is_match(query) {
            return query.to_string();
        }

        let cache_key = query.to_lowercase();
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&cache_key) {
                debug!(query = %query, keywords = %hit, "Translation cache hit");
                return hit.clone();
            }
        }

        match self.translator.translate(query).await {
            Ok(keywords) => {
                debug!(query = %query, keywords = %keywords, "Query translated");
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(cache_key, keywords.clone());
                }
                keywords
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Translation failed, using fallback");
                lexicon_lookup(&cache_key).unwrap_or_else(|| format!("{} product", query))
            }
        }
    }
}

/// Static lexicon fallback keyed by substring match
fn lexicon_lookup(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    LEXICON
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, keywords)| keywords.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTranslator {
        response: Option<String>,
    }

    #[async_trait]
    impl QueryTranslator for StubTranslator {
        async fn translate(&self, _query: &str) -> Result<String> {
            self.response
                .clone()
                .ok_or_else(|| DealScoutError::Translator("down".to_string()))
        }
    }

    fn service(response: Option<&str>) -> TranslationService {
        TranslationService::new(Arc::new(StubTranslator {
            response: response.map(|s| s.to_string()),
        }))
    }

    #[tokio::test]
    async fn test_ascii_query_passes_through() {
        let svc = service(None);
        assert_eq!(svc.to_search_keywords("bluetooth headphones").await, "bluetooth headphones");
    }

    #[tokio::test]
    async fn test_translation_result_is_cached() {
        let svc = service(Some("sweater hoodie"));
        assert_eq!(svc.to_search_keywords("кофта тепла").await, "sweater hoodie");

        // Second call hits the cache even if the translator would now fail
        let cached = svc.cache.lock().unwrap().get("кофта тепла").cloned();
        assert_eq!(cached, Some("sweater hoodie".to_string()));
    }

    #[tokio::test]
    async fn test_lexicon_fallback_on_translator_failure() {
        let svc = service(None);
        assert_eq!(svc.to_search_keywords("чохол для телефону").await, "phone case");
    }

    #[tokio::test]
    async fn test_suffix_fallback_when_nothing_matches() {
        let svc = service(None);
        assert_eq!(svc.to_search_keywords("піаніно").await, "піаніно product");
    }

    #[test]
    fn test_lexicon_lookup_is_case_insensitive() {
        assert_eq!(lexicon_lookup("KOPFHÖRER bluetooth"), Some("headphones wireless".to_string()));
        assert_eq!(lexicon_lookup("unknown thing"), None);
    }
}
