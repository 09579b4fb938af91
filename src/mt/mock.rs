//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for testing
//! the locale driver without requiring API keys or network access.
//!
//! # Example
//!
//! ```ignore
//! use idiom::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "ENGLISH", "fr").await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target code suffix: "hello" → "hello_fr"
    /// Markers pass through untouched
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_code) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse the order of whitespace-separated words (word-order-changing languages)
    Reorder,

    /// Fail every call with a `TranslationError`
    Error(String),

    /// Fail every call with `QuotaExceeded`
    QuotaExceeded,

    /// No-op: return input unchanged
    NoOp,
}

/// One recorded call to the mock: (text, source language, target code)
pub type MockCall = (String, String, String);

/// Mock translator that simulates various translation scenarios
///
/// Every call is recorded, so tests can assert exactly what the driver sent.
/// Clones share the same call log.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockTranslator with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Build a `Mappings` mock from `(text, target_code, translation)` triples
    pub fn with_mappings<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(text, target, translation)| {
                ((text.to_string(), target.to_string()), translation.to_string())
            })
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn record(&self, text: &str, source: &str, target: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), source.to_string(), target.to_string()));
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Reorder => Ok(text
                .split_whitespace()
                .rev()
                .collect::<Vec<_>>()
                .join(" ")),
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::QuotaExceeded => Err(MtError::QuotaExceeded(
                "mock daily character limit reached".to_string(),
            )),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_code: &str,
    ) -> MtResult<String> {
        self.apply_delay().await;
        self.record(text, source_language, target_code);
        self.apply_translation(text, target_code)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
