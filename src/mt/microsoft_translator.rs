//! Microsoft Translator (V2 HTTP) provider
//!
//! The V2 `Translate` endpoint takes the text and target code as query
//! parameters, authenticates with an `appId`, and answers with a single
//! serialized XML string element.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{
    MachineTranslator, SERVICE_ERROR_SENTINEL, resolve_language_code, validate_locale,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;

static RESPONSE_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<string xmlns="http://schemas\.microsoft\.com/2003/10/Serialization/">(.*)</string>"#,
    )
    .expect("response pattern is valid")
});

/// Microsoft Translator V2 provider
#[derive(Clone)]
pub struct MicrosoftTranslatorProvider {
    app_id: String,
    client: reqwest::Client,
    base_url: String,
}

impl MicrosoftTranslatorProvider {
    /// Create a provider for the given application id
    pub fn new(app_id: String) -> MtResult<Self> {
        if app_id.trim().is_empty() {
            return Err(MtError::ConfigError("appId cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            app_id,
            client,
            base_url: "http://api.microsofttranslator.com/V2/Http.svc/Translate".to_string(),
        })
    }

    /// Pull the translated text out of the XML response
    ///
    /// An unrecognised body yields the service-error sentinel so the line is
    /// dropped instead of written with garbage.
    fn extract_translation(body: &str) -> String {
        RESPONSE_BODY
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| SERVICE_ERROR_SENTINEL.to_string())
    }
}

impl std::fmt::Debug for MicrosoftTranslatorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrosoftTranslatorProvider")
            .field("app_id", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for MicrosoftTranslatorProvider {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_code: &str,
    ) -> MtResult<String> {
        validate_locale(target_code)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        let target = resolve_language_code(target_code);
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[("to", target.as_str()), ("text", text), ("appId", self.app_id.as_str())],
        )
        .map_err(|e| MtError::ConfigError(format!("Invalid base URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(Self::extract_translation(&body)),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(MtError::QuotaExceeded(
                format!("Microsoft Translator refused request ({}): {}", status, body),
            )),
            StatusCode::UNAUTHORIZED => Err(MtError::Unauthorized(format!(
                "Microsoft Translator rejected appId ({}): {}",
                status, body
            ))),
            _ => Err(MtError::TranslationError(format!(
                "Microsoft Translator error ({}): {}",
                status, body
            ))),
        }
    }

    fn provider_name(&self) -> &str {
        "Microsoft Translator"
    }
}
