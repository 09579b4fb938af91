//! Key/value line codec for the two supported localization formats
//!
//! - `KeyColonValue` (`.yml`): `first: first key`
//! - `KeyEqualsValue` (`.pres`): `FIRST=first key`
//!
//! The translation pass works line by line ([`LineFormat::decode`] /
//! [`LineFormat::encode`]); the existing-key scan parses whole documents
//! ([`LineFormat::parse_document`]).

use std::collections::HashMap;
use std::path::Path;

use serde_yml::Value;
use thiserror::Error;
use tracing::warn;

/// Second line of the banner written above every appended batch
pub const BATCH_HEADLINE: &str = "# Keys translated automatically on ";

/// Structural parse failure of a destination document
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// One decoded source line: its key and untranslated value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub key: String,
    pub raw_value: String,
}

impl TranslationUnit {
    /// Key with surrounding whitespace removed, as used for existing-key lookups
    pub fn lookup_key(&self) -> &str {
        self.key.trim()
    }
}

/// The closed set of supported key/value formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    /// YAML-style `key: value`
    KeyColonValue,
    /// YRB-style `key=value`
    KeyEqualsValue,
}

impl LineFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Some(Self::KeyColonValue),
            "pres" => Some(Self::KeyEqualsValue),
            _ => None,
        }
    }

    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension used for destination files
    pub fn extension(self) -> &'static str {
        match self {
            Self::KeyColonValue => "yml",
            Self::KeyEqualsValue => "pres",
        }
    }

    /// Split a line into key and value, or `None` if the line has no key
    ///
    /// Callers filter blank and comment lines first (see [`is_blank_or_comment`]).
    pub fn decode(self, line: &str) -> Option<TranslationUnit> {
        let (separator, trim_value) = match self {
            Self::KeyColonValue => (':', true),
            Self::KeyEqualsValue => ('=', false),
        };
        let (key, value) = line.split_once(separator)?;
        if key.is_empty() {
            return None;
        }
        let raw_value = if trim_value { value.trim() } else { value };
        // `key=` with nothing after it has no value to translate
        if self == Self::KeyEqualsValue && raw_value.is_empty() {
            return None;
        }
        Some(TranslationUnit {
            key: key.to_string(),
            raw_value: raw_value.to_string(),
        })
    }

    /// Join a key and translated value back into a line
    pub fn encode(self, key: &str, value: &str) -> String {
        match self {
            Self::KeyColonValue => format!("{}: {}", key, value),
            Self::KeyEqualsValue => format!("{}={}", key, value),
        }
    }

    /// Parse a whole destination document into key → value
    pub fn parse_document(self, content: &str) -> Result<HashMap<String, String>, CodecError> {
        match self {
            Self::KeyColonValue => parse_yaml_document(content),
            Self::KeyEqualsValue => Ok(parse_equals_document(content)),
        }
    }
}

/// Lines the translation pass never decodes nor re-emits
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Collect every key with its scalar value, keyed by its innermost name
///
/// Files rooted under a locale key (`de-DE:` with indented entries) index the
/// same way as flat ones. Parent keys are recorded with an empty value.
fn collect_leaves(value: &Value, keys: &mut HashMap<String, String>) {
    match value {
        Value::Mapping(mapping) => {
            for (k, v) in mapping {
                let Some(key) = scalar_text(k) else {
                    continue;
                };
                match scalar_text(v) {
                    Some(text) => {
                        keys.insert(key, text);
                    }
                    None => {
                        keys.entry(key).or_default();
                        collect_leaves(v, keys);
                    }
                }
            }
        }
        Value::Tagged(tagged) => collect_leaves(&tagged.value, keys),
        _ => {}
    }
}

/// Parse a YAML destination one appended batch at a time
///
/// Every batch of a rooted source starts with its own `<locale>:` key, so a
/// destination that received several batches repeats that key at the top
/// level and is not a valid document as a whole. Each batch is parsed on its
/// own and the keys merged, later batches winning; a broken batch is skipped.
fn parse_yaml_document(content: &str) -> Result<HashMap<String, String>, CodecError> {
    let segments = batch_segments(content);
    if segments.len() < 2 {
        return parse_yaml_block(content);
    }

    let mut keys = HashMap::new();
    let mut first_error = None;
    let mut parsed_any = false;
    for (index, segment) in segments.iter().enumerate() {
        match parse_yaml_block(segment) {
            Ok(found) => {
                keys.extend(found);
                parsed_any = true;
            }
            Err(e) => {
                warn!("Skipping unparsable batch {}: {}", index, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if !parsed_any => Err(e),
        _ => Ok(keys),
    }
}

/// Split a document before every batch headline
fn batch_segments(content: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    for line in content.lines() {
        if line.starts_with(BATCH_HEADLINE) {
            segments.push(String::new());
        }
        if let Some(current) = segments.last_mut() {
            current.push_str(line);
            current.push('\n');
        }
    }
    segments
}

fn parse_yaml_block(content: &str) -> Result<HashMap<String, String>, CodecError> {
    let mut keys = HashMap::new();
    if content.trim().is_empty() {
        return Ok(keys);
    }
    let document: Value = serde_yml::from_str(content)?;
    collect_leaves(&document, &mut keys);
    Ok(keys)
}

fn parse_equals_document(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter(|line| !is_blank_or_comment(line))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
