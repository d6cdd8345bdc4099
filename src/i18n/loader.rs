//! Translation loader and i18n management
//!
//! Locale tables are pure data: one JSON file per language under
//! `translations/`, looked up by nested key with default-language fallback.
//! No behavior depends on the language beyond text selection.

use std::collections::HashMap;
use std::path::Path;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{info, warn};
use crate::utils::errors::{DealScoutError, Result};
use crate::config::I18nConfig;

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    /// Default language code
    default_language: String,
    /// Supported language codes
    supported_languages: Vec<String>,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create a new I18n instance
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
        }
    }

    /// Load all translation files from the translations directory
    pub async fn load_translations(&mut self) -> Result<()> {
        let translations_dir = Path::new("translations");

        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = translations_dir.join(format!("{}.json", lang_code));

            if file_path.exists() {
                match self.load_language_file(&file_path, lang_code).await {
                    Ok(_) => info!("Loaded translations for language: {}", lang_code),
                    Err(e) => {
                        warn!("Failed to load translations for {}: {}", lang_code, e);
                        if lang_code == &self.default_language {
                            return Err(DealScoutError::Config(
                                format!("Failed to load default language translations: {}", e)
                            ));
                        }
                    }
                }
            } else if lang_code == &self.default_language {
                return Err(DealScoutError::Config(
                    format!("Default language translation file not found: {}", file_path.display())
                ));
            } else {
                warn!("Translation file not found: {}", file_path.display());
            }
        }

        Ok(())
    }

    /// Load a single language file
    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<()> {
        let content = fs::read_to_string(file_path).await?;
        let translations: Value = serde_json::from_str(&content)?;

        if let Value::Object(map) = translations {
            self.translations.insert(lang_code.to_string(), map);
        } else {
            return Err(DealScoutError::Config(
                format!("Invalid translation file format for {}", lang_code)
            ));
        }

        Ok(())
    }

    /// Get a translated message: `(locale, key, params) -> text`
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.effective_language(lang);

        match self.lookup(key, &effective_lang) {
            Some(text) => self.format_message(&text, params),
            None => {
                // Fall back to the default language before echoing the key
                if effective_lang != self.default_language {
                    if let Some(text) = self.lookup(key, &self.default_language) {
                        return self.format_message(&text, params);
                    }
                }
                warn!("Translation key '{}' not found", key);
                key.to_string()
            }
        }
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    /// Detect user language from a Telegram locale hint (e.g. "en-US")
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        if let Some(lang) = telegram_lang {
            let lang_code = lang.split('-').next().unwrap_or(lang);
            if self.is_language_supported(lang_code) {
                return lang_code.to_string();
            }
        }

        self.default_language.clone()
    }

    /// Get the effective language (fallback to default if not loaded)
    fn effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Resolve a nested key like "search.no_products" for one language
    fn lookup(&self, key: &str, lang: &str) -> Option<String> {
        let translations = self.translations.get(lang)?;
        let mut current = Value::Object(translations.clone());

        for k in key.split('.') {
            current = current.get(k)?.clone();
        }

        match current {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Format message with `{param}` placeholders
    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        if let Some(params) = params {
            let mut result = template.to_string();
            for (key, value) in params {
                let placeholder = format!("{{{}}}", key);
                result = result.replace(&placeholder, value);
            }
            result
        } else {
            template.to_string()
        }
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Build an instance from in-memory tables (test support)
    #[cfg(test)]
    pub fn from_tables(default_language: &str, tables: HashMap<String, Map<String, Value>>) -> Self {
        Self {
            supported_languages: tables.keys().cloned().collect(),
            translations: tables,
            default_language: default_language.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_i18n() -> I18n {
        let en = json!({
            "search": { "no_products": "Nothing found", "results": "Deals for {query}:" },
            "only_en": "english only"
        });
        let uk = json!({
            "search": { "no_products": "Нічого не знайдено" }
        });

        let mut tables = HashMap::new();
        for (code, value) in [("en", en), ("uk", uk)] {
            if let Value::Object(map) = value {
                tables.insert(code.to_string(), map);
            }
        }
        I18n::from_tables("en", tables)
    }

    #[test]
    fn test_nested_lookup() {
        let i18n = test_i18n();
        assert_eq!(i18n.t("search.no_products", "uk", None), "Нічого не знайдено");
        assert_eq!(i18n.t("search.no_products", "en", None), "Nothing found");
    }

    #[test]
    fn test_fallback_to_default_language() {
        let i18n = test_i18n();
        assert_eq!(i18n.t("only_en", "uk", None), "english only");
    }

    #[test]
    fn test_missing_key_echoes_key() {
        let i18n = test_i18n();
        assert_eq!(i18n.t("search.unknown_key", "en", None), "search.unknown_key");
    }

    #[test]
    fn test_param_formatting() {
        let i18n = test_i18n();
        let mut params = HashMap::new();
        params.insert("query".to_string(), "socks".to_string());
        assert_eq!(i18n.t("search.results", "en", Some(&params)), "Deals for socks:");
    }

    #[test]
    fn test_language_detection() {
        let i18n = test_i18n();
        assert_eq!(i18n.detect_user_language(Some("en-US")), "en");
        assert_eq!(i18n.detect_user_language(Some("uk")), "uk");
        assert_eq!(i18n.detect_user_language(Some("fr")), "en");
        assert_eq!(i18n.detect_user_language(None), "en");
    }
}
