//! Internationalization module
//!
//! Multi-language support for DealScout: translation loading, language
//! detection and message formatting over immutable locale tables.

pub mod loader;

pub use loader::{I18n, TranslationParams};
