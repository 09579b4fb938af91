//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the locale driver can talk to Google Translate, Microsoft Translator or
//! the mock without knowing which one it has.
//!
//! # Example
//!
//! ```ignore
//! use idiom::mt::{MachineTranslator, GoogleTranslateProvider, SOURCE_LANGUAGE};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let result = provider.translate("Hello, world!", SOURCE_LANGUAGE, "de").await?;
//!     println!("{}", result); // "Hallo Welt!"
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Source language handed to every translate call.
pub const SOURCE_LANGUAGE: &str = "ENGLISH";

/// Result text some backends return instead of failing outright.
///
/// The driver treats a translation equal to this string as "no result" and
/// drops the line.
pub const SERVICE_ERROR_SENTINEL: &str = "Error: invalid result data";

/// Generic trait for machine translation providers
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (Google, Microsoft) or deterministic logic (Mock).
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string
    ///
    /// # Arguments
    ///
    /// * `text` - The (already masked) text to translate
    /// * `source_language` - Source language name or code (the driver always passes `ENGLISH`)
    /// * `target_code` - Translation-service code from the locale table (e.g., "de", "zh-TW")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text, possibly equal to [`SERVICE_ERROR_SENTINEL`]
    /// * `Err(MtError)` - If translation fails; callers treat this as fatal
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_code: &str,
    ) -> MtResult<String>;

    /// Get the name of this translation provider, used in logs
    fn provider_name(&self) -> &str;
}

/// Resolve a language name or service code into the code the REST APIs expect
///
/// The locale table mixes plain codes (`de`, `zh-TW`) with legacy language
/// names (`PORTUGUESE`), and the driver names the source language `ENGLISH`.
/// Names are mapped to their ISO 639-1 code; anything else is passed through
/// unchanged so region-qualified codes like `zh-TW` survive.
///
/// # Example
///
/// ```ignore
/// assert_eq!(resolve_language_code("ENGLISH"), "en");
/// assert_eq!(resolve_language_code("zh-TW"), "zh-TW");
/// ```
pub fn resolve_language_code(language: &str) -> String {
    let code = match language.to_ascii_uppercase().as_str() {
        "ENGLISH" => "en",
        "GERMAN" => "de",
        "FRENCH" => "fr",
        "SPANISH" => "es",
        "ITALIAN" => "it",
        "PORTUGUESE" => "pt",
        "VIETNAMESE" => "vi",
        "KOREAN" => "ko",
        "INDONESIAN" => "id",
        "JAPANESE" => "ja",
        "CHINESE" | "CHINESE_SIMPLIFIED" => "zh-CN",
        "CHINESE_TRADITIONAL" => "zh-TW",
        _ => return language.to_string(),
    };
    code.to_string()
}

/// Validate that a locale or language code is in acceptable format
///
/// Checks that the code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
