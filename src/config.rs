//! Run configuration, read once at startup from `config/idiom.yml`
//!
//! ```yaml
//! library: google          # google | microsoft | mock
//! apiKey: ...              # Google; falls back to GOOGLE_TRANSLATE_API_KEY
//! appId: ...               # Microsoft
//! sourceLocale: en-US
//! cooldownMs: 5000
//! locales:
//!   de-DE: de
//!   zh-Hant-TW: zh-TW
//! postProcess:
//!   replacements: [["«", "'"], ["»", "'"]]
//!   wrapQuote: '"'
//! ```
//!
//! Every key is optional; a missing file means the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::markup::PostProcessPolicy;
use crate::mt::{
    GoogleTranslateProvider, MachineTranslator, MicrosoftTranslatorProvider, MockMode,
    MockTranslator, MtError, MtResult,
};

/// Locale → translation-service code, in processing order
const DEFAULT_LOCALES: &[(&str, &str)] = &[
    ("de-DE", "de"),
    ("en-MY", "en"),
    ("en-SG", "en"),
    ("es-MX", "es"),
    ("it-IT", "it"),
    ("vi-VN", "vi"),
    ("zh-Hant-TW", "zh-TW"),
    ("en-AA", "en"),
    ("en-NZ", "en"),
    ("en-US", "en"),
    ("fr-FR", "fr"),
    ("ko-KR", "ko"),
    ("zh-Hans-CN", "zh-CN"),
    ("en-AU", "en"),
    ("en-PH", "en"),
    ("es-ES", "es"),
    ("id-ID", "id"),
    ("pt-BR", "PORTUGUESE"),
    ("zh-Hant-HK", "zh-CN"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("Invalid locale '{locale}': {message}")]
    InvalidLocale { locale: String, message: String },

    #[error("Locale '{0}' has no translation code in the locale table")]
    UnknownLocale(String),
}

/// Translation backend selected by `library`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    #[default]
    Google,
    Microsoft,
    Mock,
}

/// One target locale of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTask {
    pub locale: String,
    pub translation_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub library: Library,
    pub api_key: Option<String>,
    pub app_id: Option<String>,
    pub source_locale: String,
    /// Delay after every translate call; `None` picks the backend's default
    pub cooldown_ms: Option<u64>,
    pub locales: IndexMap<String, String>,
    pub post_process: PostProcessPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: Library::default(),
            api_key: None,
            app_id: None,
            source_locale: "en-US".to_string(),
            cooldown_ms: None,
            locales: DEFAULT_LOCALES
                .iter()
                .map(|(locale, code)| (locale.to_string(), code.to_string()))
                .collect(),
            post_process: PostProcessPolicy::default(),
        }
    }
}

impl Config {
    /// Parse and validate a YAML configuration document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Read `path` if it exists, otherwise use the built-in defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(
                "No configuration at {}, using built-in locale table",
                path.display()
            );
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_locale_id(&self.source_locale)?;
        for locale in self.locales.keys() {
            validate_locale_id(locale)?;
        }
        Ok(())
    }

    pub fn translation_code(&self, locale: &str) -> Option<&str> {
        self.locales.get(locale).map(String::as_str)
    }

    /// Target locales for a run, never including the source locale
    ///
    /// Without `explicit`, every locale in the table in table order; with it,
    /// exactly the listed locales in the listed order.
    pub fn locale_tasks(&self, explicit: Option<&[String]>) -> Result<Vec<LocaleTask>, ConfigError> {
        let selected: Vec<&str> = match explicit {
            Some(list) => list.iter().map(String::as_str).collect(),
            None => self.locales.keys().map(String::as_str).collect(),
        };

        selected
            .into_iter()
            .filter(|locale| *locale != self.source_locale)
            .map(|locale| {
                self.translation_code(locale)
                    .map(|code| LocaleTask {
                        locale: locale.to_string(),
                        translation_code: code.to_string(),
                    })
                    .ok_or_else(|| ConfigError::UnknownLocale(locale.to_string()))
            })
            .collect()
    }

    /// Politeness delay after each translate call
    pub fn cooldown(&self) -> Duration {
        let default_ms = match self.library {
            Library::Google => 5_000,
            Library::Microsoft | Library::Mock => 0,
        };
        Duration::from_millis(self.cooldown_ms.unwrap_or(default_ms))
    }

    /// Build the configured translation backend
    pub fn translator(&self) -> MtResult<Box<dyn MachineTranslator>> {
        match self.library {
            Library::Google => {
                let provider = match &self.api_key {
                    Some(key) => GoogleTranslateProvider::new(key.clone())?,
                    None => GoogleTranslateProvider::from_env()?,
                };
                Ok(Box::new(provider))
            }
            Library::Microsoft => {
                let app_id = self.app_id.clone().ok_or_else(|| {
                    MtError::ConfigError("appId is required for Microsoft Translator".to_string())
                })?;
                Ok(Box::new(MicrosoftTranslatorProvider::new(app_id)?))
            }
            Library::Mock => Ok(Box::new(MockTranslator::new(MockMode::Suffix))),
        }
    }
}

fn validate_locale_id(locale: &str) -> Result<(), ConfigError> {
    locale
        .parse::<icu_locale::Locale>()
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidLocale {
            locale: locale.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = Config::default();
        assert_eq!(config.locales.len(), 19);
        assert_eq!(config.translation_code("de-DE"), Some("de"));
        assert_eq!(config.translation_code("pt-BR"), Some("PORTUGUESE"));
        assert_eq!(config.source_locale, "en-US");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_tasks_exclude_source_locale() {
        let tasks = Config::default().locale_tasks(None).unwrap();
        assert_eq!(tasks.len(), 18);
        assert!(tasks.iter().all(|t| t.locale != "en-US"));
        assert_eq!(
            tasks[0],
            LocaleTask {
                locale: "de-DE".to_string(),
                translation_code: "de".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_subset_keeps_order_and_drops_source() {
        let explicit = vec![
            "zh-Hant-HK".to_string(),
            "en-US".to_string(),
            "de-DE".to_string(),
        ];
        let tasks = Config::default().locale_tasks(Some(&explicit)).unwrap();
        let locales: Vec<_> = tasks.iter().map(|t| t.locale.as_str()).collect();
        assert_eq!(locales, vec!["zh-Hant-HK", "de-DE"]);
        assert_eq!(tasks[0].translation_code, "zh-CN");
    }

    #[test]
    fn test_explicit_unknown_locale() {
        let explicit = vec!["xx-YY".to_string()];
        let result = Config::default().locale_tasks(Some(&explicit));
        assert!(matches!(result, Err(ConfigError::UnknownLocale(l)) if l == "xx-YY"));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "library: microsoft\nappId: ABC123\ncooldownMs: 250\nlocales:\n  fr-FR: fr\n  ja-JP: ja\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.library, Library::Microsoft);
        assert_eq!(config.app_id.as_deref(), Some("ABC123"));
        assert_eq!(config.cooldown(), Duration::from_millis(250));
        let locales: Vec<_> = config.locales.keys().cloned().collect();
        assert_eq!(locales, vec!["fr-FR", "ja-JP"]);
        assert_eq!(config.source_locale, "en-US");
        assert_eq!(config.post_process, PostProcessPolicy::default());
    }

    #[test]
    fn test_from_yaml_empty_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_locale_rejected() {
        let yaml = "locales:\n  not a locale!: de\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::InvalidLocale { .. })
        ));
    }

    #[test]
    fn test_default_cooldown_by_library() {
        let google = Config::default();
        assert_eq!(google.cooldown(), Duration::from_secs(5));

        let mock = Config {
            library: Library::Mock,
            ..Config::default()
        };
        assert_eq!(mock.cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_microsoft_requires_app_id() {
        let config = Config {
            library: Library::Microsoft,
            ..Config::default()
        };
        assert!(matches!(config.translator(), Err(MtError::ConfigError(_))));
    }

    #[test]
    fn test_mock_translator() {
        let config = Config {
            library: Library::Mock,
            ..Config::default()
        };
        assert_eq!(config.translator().unwrap().provider_name(), "Mock Translator");
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Path::new("/nonexistent/idiom.yml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
