//! Google Translate API provider
//!
//! This module integrates with Google Translate API v2.
//!
//! # Authentication
//!
//! The key comes from the `apiKey` configuration entry or, failing that, the
//! `GOOGLE_TRANSLATE_API_KEY` environment variable.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, resolve_language_code, validate_locale};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

/// Google Translate API v2 provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL for Google Translate API
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Maximum characters per string (30KB per Google Translate API limits)
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Environment variable consulted by [`GoogleTranslateProvider::from_env`]
    pub const API_KEY_VAR: &'static str = "GOOGLE_TRANSLATE_API_KEY";

    /// Create a new provider with an explicit API key
    ///
    /// # Errors
    ///
    /// `ConfigError` if the key is blank, `NetworkError` if the HTTP client
    /// cannot be built.
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
        })
    }

    /// Create a provider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var(Self::API_KEY_VAR).map_err(|_| {
            MtError::ConfigError(format!("{} environment variable not set", Self::API_KEY_VAR))
        })?;

        Self::new(api_key)
    }

    /// Map a failed HTTP status onto the error kinds the driver distinguishes
    fn status_error(status: StatusCode, body: String) -> MtError {
        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                MtError::QuotaExceeded(format!("API refused request ({}): {}", status, body))
            }
            StatusCode::UNAUTHORIZED => {
                MtError::Unauthorized(format!("API rejected key ({}): {}", status, body))
            }
            s if s.is_client_error() => {
                MtError::ConfigError(format!("API client error ({}): {}", status, body))
            }
            _ => MtError::TranslationError(format!("API server error ({}): {}", status, body)),
        }
    }

    /// Send one text to the API
    async fn request(
        &self,
        text: &str,
        source_language: &str,
        target_code: &str,
    ) -> MtResult<String> {
        let url = reqwest::Url::parse_with_params(&self.base_url, &[("key", &self.api_key)])
            .map_err(|e| MtError::ConfigError(format!("Invalid base URL: {}", e)))?;

        let body = json!({
            "q": [text],
            "source": resolve_language_code(source_language),
            "target": resolve_language_code(target_code),
            "format": "text"
        });

        let response = self.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, error_text));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        let translations = json["data"]["translations"].as_array().ok_or_else(|| {
            MtError::TranslationError(
                "Invalid API response: missing 'data.translations' array".to_string(),
            )
        })?;

        let first = translations.first().ok_or_else(|| {
            MtError::TranslationError("Invalid API response: empty translations".to_string())
        })?;

        first["translatedText"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                MtError::TranslationError(
                    "Invalid API response: missing 'translatedText' field".to_string(),
                )
            })
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_code: &str,
    ) -> MtResult<String> {
        validate_locale(source_language)?;
        validate_locale(target_code)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.len() > Self::MAX_CHARS_PER_STRING {
            return Err(MtError::TranslationError(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS_PER_STRING
            )));
        }

        self.request(text, source_language, target_code).await
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
