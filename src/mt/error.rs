use thiserror::Error;

/// Error types for the translate capability
///
/// `QuotaExceeded` and `Unauthorized` are reported by the backend itself and
/// must abort the whole run; the other variants are local or transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Provider misconfiguration (missing key, bad base URL, ...)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The backend refused the request because a usage quota was exhausted
    #[error("Translation quota exceeded: {0}")]
    QuotaExceeded(String),
    /// The backend rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The backend answered but the answer was unusable
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Locale or language code with characters the backends never accept
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
