//! Markup protection for machine translation
//!
//! Before a value goes to the translation backend, every span the backend
//! must not touch is swapped for a positional marker:
//!
//! | Source span            | Marker   | Kept for restore            |
//! |------------------------|----------|-----------------------------|
//! | `%{name}`              | `\|i\|`  | `name`                      |
//! | `'''text'''`/`===text===` | `__i__` | `text` (delimiters dropped) |
//! | `[N]` already in text  | `__i__`  | `[N]`                       |
//! | `{N}`                  | `[i]`    | `{N}`, looked up by `i`     |
//! | `{{` / `}}`            | `{{_` / `_}}` | nothing                |
//!
//! Markers are matched back by index, not by content, so the backend is free
//! to move them around:
//!
//! ```ignore
//! Source:      "Hello %{name}"
//! Masked:      "Hello |0|"
//! Translated:  "|0| Hallo"
//! Restored:    "\"%{name} Hallo\""
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static SUBSTITUTION_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\{([^}]*)\}").expect("substitution pattern is valid"));
// Delimited literal (capture 1), or a bracketed number the source already
// contains (capture 2) so it cannot be mistaken for a `[i]` marker on restore
static PASS_THROUGH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:===|''')(.*?)(?:===|''')|(\[\d+\])").expect("pass-through pattern is valid")
});
static NUMBERED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\d+\}").expect("numbered placeholder pattern is valid"));

// `|i|` (capture 1), `__i__` (capture 2) or `[i]` (capture 3), expanded
// together in one pass
static RESTORE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*(\d+)\s*\||__(\d+)__|\[(\d+)\]").expect("restore marker pattern is valid")
});
static SUBSTITUTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*(\d+)\s*\|").expect("substitution marker pattern is valid"));

/// A marker in translated text that points at a slot extraction never filled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("substitution marker |{index}| has no variable ({available} extracted)")]
    UnknownSubstitution { index: usize, available: usize },
    #[error("pass-through marker __{index}__ has no literal ({available} extracted)")]
    UnknownPassThrough { index: usize, available: usize },
}

/// Masked text plus everything needed to undo the masking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Text to send to the backend
    pub masked_text: String,
    /// Names from `%{name}`, in extraction order (marker `|i|` ↔ index `i`)
    pub substitution_vars: Vec<String>,
    /// Inner text of `'''...'''`/`===...===`, or a verbatim `[N]`, in
    /// extraction order (marker `__i__`)
    pub pass_through_literals: Vec<String>,
    /// Original `{N}` spans in order of appearance (marker `[i]`)
    pub numbered_placeholders: Vec<String>,
}

/// Replace every match of `pattern` with `marker(i)`, feeding capture 1 to `keep`
fn mask_all(
    text: &str,
    pattern: &Regex,
    marker: impl Fn(usize) -> String,
    mut keep: impl FnMut(&Captures<'_>),
) -> String {
    let mut index = 0;
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            keep(caps);
            let replacement = marker(index);
            index += 1;
            replacement
        })
        .into_owned()
}

fn capture_text(caps: &Captures<'_>) -> String {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Mask all protected spans in `text`
///
/// The passes run in a fixed order, each over the output of the previous one:
/// substitution variables, pass-through literals, numbered placeholders, then
/// the double-brace escape.
pub fn extract(text: &str) -> ExtractionResult {
    let mut substitution_vars = Vec::new();
    let masked = mask_all(
        text,
        &SUBSTITUTION_VAR,
        |i| format!("|{}|", i),
        |caps| substitution_vars.push(capture_text(caps)),
    );

    let mut pass_through_literals = Vec::new();
    let masked = mask_all(
        &masked,
        &PASS_THROUGH,
        |i| format!("__{}__", i),
        |caps| pass_through_literals.push(capture_text(caps)),
    );

    let mut numbered_placeholders = Vec::new();
    let masked = mask_all(
        &masked,
        &NUMBERED_PLACEHOLDER,
        |i| format!("[{}]", i),
        |caps| numbered_placeholders.push(caps[0].to_string()),
    );

    let masked_text = masked.replace("{{", "{{_").replace("}}", "_}}");

    ExtractionResult {
        masked_text,
        substitution_vars,
        pass_through_literals,
        numbered_placeholders,
    }
}

/// Quote clean-up applied to backend output before markers are expanded
///
/// Which quote characters a backend emits depends on the target language, so
/// the table is data rather than code and can be overridden from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostProcessPolicy {
    /// `(from, to)` pairs applied in order
    pub replacements: Vec<(String, String)>,
    /// Quote wrapped around every non-empty result; `None` disables wrapping
    pub wrap_quote: Option<char>,
}

impl Default for PostProcessPolicy {
    fn default() -> Self {
        let replacements = [
            ("&quot;", "'"),
            ("&#39;", "'"),
            ("\u{201C}", "'"),
            ("\u{201D}", "'"),
            ("\u{00AB}", "'"),
            ("\u{00BB}", "'"),
            ("\"", "'"),
        ];
        Self {
            replacements: replacements
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            wrap_quote: Some('"'),
        }
    }
}

impl PostProcessPolicy {
    /// A policy that touches no quotes at all
    pub fn passthrough() -> Self {
        Self {
            replacements: Vec::new(),
            wrap_quote: None,
        }
    }

    fn apply(&self, text: &str) -> String {
        self.replacements
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

fn parse_index(m: Option<regex::Match<'_>>) -> usize {
    m.and_then(|m| m.as_str().parse().ok()).unwrap_or(usize::MAX)
}

fn substitution(vars: &[String], index: usize) -> Result<String, MarkupError> {
    vars.get(index)
        .map(|name| format!("%{{{}}}", name))
        .ok_or(MarkupError::UnknownSubstitution {
            index,
            available: vars.len(),
        })
}

/// Expand `|i|` inside a pass-through literal
///
/// Literals are captured after substitution masking, so `'''%{brand}'''` is
/// stored as `|0|`.
fn expand_literal(literal: &str, vars: &[String]) -> Result<String, MarkupError> {
    let mut failure = None;
    let expanded = SUBSTITUTION_MARKER.replace_all(literal, |caps: &Captures<'_>| {
        substitution(vars, parse_index(caps.get(1))).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            caps[0].to_string()
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(expanded.into_owned()),
    }
}

/// Expand every marker left to right
///
/// Restored content is never re-scanned, so a variable named `__0__` stays a
/// variable and a restored `[0]` literal stays a literal. A `[i]` with no
/// extracted span is left as it is.
fn expand_markers(text: &str, tokens: &ExtractionResult) -> Result<String, MarkupError> {
    let vars = &tokens.substitution_vars;
    let literals = &tokens.pass_through_literals;
    let mut failure = None;
    let expanded = RESTORE_MARKER.replace_all(text, |caps: &Captures<'_>| {
        let restored = if caps.get(1).is_some() {
            substitution(vars, parse_index(caps.get(1)))
        } else if caps.get(3).is_some() {
            Ok(tokens
                .numbered_placeholders
                .get(parse_index(caps.get(3)))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string()))
        } else {
            let index = parse_index(caps.get(2));
            match literals.get(index) {
                Some(literal) => expand_literal(literal, vars),
                None => Err(MarkupError::UnknownPassThrough {
                    index,
                    available: literals.len(),
                }),
            }
        };
        restored.unwrap_or_else(|err| {
            failure.get_or_insert(err);
            caps[0].to_string()
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(expanded.into_owned()),
    }
}

/// Undo [`extract`] on translated text
///
/// Backend artefacts are cleaned first (surrounding quotes, quote styles,
/// HTML-escaped angle brackets, spaces inside braces, the double-brace escape,
/// a trailing backslash, surrounding whitespace), the result is wrapped in the
/// policy's quote, and only then are the markers expanded.
///
/// # Errors
///
/// A marker whose index has no extracted counterpart is a [`MarkupError`];
/// the translated text is never written with a dangling marker.
pub fn restore(
    translated: &str,
    tokens: &ExtractionResult,
    policy: &PostProcessPolicy,
) -> Result<String, MarkupError> {
    let mut value = translated.strip_prefix('"').unwrap_or(translated);
    value = value.strip_suffix('"').unwrap_or(value);

    let value = policy
        .apply(value)
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("{ ", "{")
        .replace(" }", "}")
        .replace("{{_", "{{")
        .replace("_}}", "}}");
    let value = value.strip_suffix('\\').unwrap_or(&value).trim();

    let value = match policy.wrap_quote {
        Some(quote) if !value.is_empty() => format!("{quote}{value}{quote}"),
        _ => value.to_string(),
    };

    expand_markers(&value, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare() -> PostProcessPolicy {
        PostProcessPolicy::passthrough()
    }

    // ========== Extraction ==========

    #[test]
    fn test_extract_substitution_vars() {
        let result = extract("Hello %{name}, you owe %{Amount}");
        assert_eq!(result.masked_text, "Hello |0|, you owe |1|");
        assert_eq!(result.substitution_vars, vec!["name", "Amount"]);
    }

    #[test]
    fn test_extract_pass_through_literals() {
        let result = extract("Use '''ACME Cloud''' or ===Big Box=== today");
        assert_eq!(result.masked_text, "Use __0__ or __1__ today");
        assert_eq!(result.pass_through_literals, vec!["ACME Cloud", "Big Box"]);
    }

    #[test]
    fn test_extract_mixed_pass_through_delimiters() {
        let result = extract("Try '''ACME=== now");
        assert_eq!(result.masked_text, "Try __0__ now");
        assert_eq!(result.pass_through_literals, vec!["ACME"]);
    }

    #[test]
    fn test_extract_pass_through_is_non_greedy() {
        let result = extract("'''a''' and '''b'''");
        assert_eq!(result.masked_text, "__0__ and __1__");
        assert_eq!(result.pass_through_literals, vec!["a", "b"]);
    }

    #[test]
    fn test_extract_numbered_placeholders_are_renumbered() {
        let result = extract("Page {3} of {7}");
        assert_eq!(result.masked_text, "Page [0] of [1]");
        assert_eq!(result.numbered_placeholders, vec!["{3}", "{7}"]);
    }

    #[test]
    fn test_extract_double_brace_escape() {
        let result = extract("Keep {{this}} literal");
        assert_eq!(result.masked_text, "Keep {{_this_}} literal");
    }

    #[test]
    fn test_extract_order_masks_variables_before_literals() {
        let result = extract("'''%{brand}''' ships {0} items");
        assert_eq!(result.masked_text, "__0__ ships [0] items");
        assert_eq!(result.substitution_vars, vec!["brand"]);
        assert_eq!(result.pass_through_literals, vec!["|0|"]);
    }

    #[test]
    fn test_extract_plain_text_untouched() {
        let result = extract("first key");
        assert_eq!(result.masked_text, "first key");
        assert!(result.substitution_vars.is_empty());
        assert!(result.pass_through_literals.is_empty());
        assert!(result.numbered_placeholders.is_empty());
    }

    // ========== Restoration ==========

    #[test]
    fn test_restore_reordered_substitution() {
        let tokens = extract("Hello %{name}");
        assert_eq!(tokens.masked_text, "Hello |0|");
        let restored = restore("|0| Hallo", &tokens, &PostProcessPolicy::default()).unwrap();
        assert_eq!(restored, "\"%{name} Hallo\"");
    }

    #[test]
    fn test_restore_tolerates_spaced_markers() {
        let tokens = extract("%{count} files");
        let restored = restore("| 0 | Dateien", &tokens, &bare()).unwrap();
        assert_eq!(restored, "%{count} Dateien");
    }

    #[test]
    fn test_restore_strips_translator_quotes_and_rewraps() {
        let tokens = extract("Say \"hi\"");
        let restored = restore("\"Sag \"hallo\"\"", &tokens, &PostProcessPolicy::default()).unwrap();
        assert_eq!(restored, "\"Sag 'hallo'\"");
    }

    #[test]
    fn test_restore_normalizes_directional_quotes() {
        let tokens = extract("x");
        let restored = restore("«Bonjour» “ami”", &tokens, &PostProcessPolicy::default()).unwrap();
        assert_eq!(restored, "\"'Bonjour' 'ami'\"");
    }

    #[test]
    fn test_restore_empty_result_is_not_wrapped() {
        let tokens = extract("");
        assert_eq!(restore("  ", &tokens, &PostProcessPolicy::default()).unwrap(), "");
    }

    #[test]
    fn test_restore_unescapes_angle_brackets() {
        let tokens = extract("<b>bold</b>");
        let restored = restore("&lt;b&gt;fett&lt;/b&gt;", &tokens, &bare()).unwrap();
        assert_eq!(restored, "<b>fett</b>");
    }

    #[test]
    fn test_restore_reverses_double_brace_escape() {
        let tokens = extract("{{count}} items");
        assert_eq!(tokens.masked_text, "{{_count_}} items");
        let restored = restore("{{_count_}} Artikel", &tokens, &bare()).unwrap();
        assert_eq!(restored, "{{count}} Artikel");
    }

    #[test]
    fn test_restore_trims_space_inside_braces() {
        let tokens = extract("Value: {{x}}");
        let restored = restore("Wert: { x }", &tokens, &bare()).unwrap();
        assert_eq!(restored, "Wert: {x}");
    }

    #[test]
    fn test_restore_trailing_backslash_and_whitespace() {
        let tokens = extract("x");
        assert_eq!(restore("  Hallo\\", &tokens, &bare()).unwrap(), "Hallo");
    }

    #[test]
    fn test_restore_pass_through_literal() {
        let tokens = extract("Welcome to '''ACME Cloud'''!");
        let restored = restore("Willkommen bei __0__!", &tokens, &bare()).unwrap();
        assert_eq!(restored, "Willkommen bei ACME Cloud!");
    }

    #[test]
    fn test_restore_pass_through_containing_variable() {
        let tokens = extract("'''%{brand}''' rocks");
        let restored = restore("__0__ rockt", &tokens, &bare()).unwrap();
        assert_eq!(restored, "%{brand} rockt");
    }

    #[test]
    fn test_restore_numbered_placeholders_by_position() {
        let tokens = extract("{0} of {1}");
        let restored = restore("[1] von [0]", &tokens, &bare()).unwrap();
        assert_eq!(restored, "{1} von {0}");
    }

    #[test]
    fn test_restore_keeps_original_numbers() {
        let tokens = extract("{1} sent to {0}");
        assert_eq!(tokens.masked_text, "[0] sent to [1]");
        let restored = restore("[1] erhielt von [0]", &tokens, &bare()).unwrap();
        assert_eq!(restored, "{0} erhielt von {1}");

        let tokens = extract("Page {3} of {7}");
        let restored = restore("Seite [0] von [1]", &tokens, &bare()).unwrap();
        assert_eq!(restored, "Seite {3} von {7}");
    }

    #[test]
    fn test_restore_leaves_unrelated_brackets() {
        let tokens = extract("See note [4]");
        assert_eq!(tokens.masked_text, "See note __0__");
        let restored = restore("Siehe Anmerkung __0__", &tokens, &bare()).unwrap();
        assert_eq!(restored, "Siehe Anmerkung [4]");
    }

    #[test]
    fn test_source_brackets_are_not_numbered_markers() {
        let tokens = extract("Item [0]: {0}");
        assert_eq!(tokens.masked_text, "Item __0__: [0]");
        assert_eq!(tokens.pass_through_literals, vec!["[0]"]);
        let restored = restore("Artikel __0__: [0]", &tokens, &bare()).unwrap();
        assert_eq!(restored, "Artikel [0]: {0}");
    }

    #[test]
    fn test_restore_unknown_substitution_is_error() {
        let tokens = extract("Hello %{name}");
        let err = restore("Hallo |3|", &tokens, &bare()).unwrap_err();
        assert_eq!(
            err,
            MarkupError::UnknownSubstitution {
                index: 3,
                available: 1
            }
        );
    }

    #[test]
    fn test_restore_unknown_pass_through_is_error() {
        let tokens = extract("no literals");
        let err = restore("__0__", &tokens, &bare()).unwrap_err();
        assert!(matches!(err, MarkupError::UnknownPassThrough { index: 0, .. }));
    }

    #[test]
    fn test_restored_content_is_not_rescanned() {
        // A variable whose name looks like a pass-through marker stays intact
        let tokens = extract("%{__0__}");
        assert_eq!(restore("|0|", &tokens, &bare()).unwrap(), "%{__0__}");
    }

    // ========== Round trip ==========

    #[test]
    fn test_round_trip_keeps_protected_spans_in_order() {
        let source = "Hi %{user}, '''ACME''' found {0} of {1} for ===%{query}===";
        let tokens = extract(source);
        assert_eq!(tokens.masked_text, "Hi |0|, __0__ found [0] of [1] for __1__");

        // Backend changes the prose but keeps the markers
        let translated = tokens.masked_text.replace("Hi", "Hallo").replace("found", "fand");
        let restored = restore(&translated, &tokens, &bare()).unwrap();

        assert_eq!(restored, "Hallo %{user}, ACME fand {0} of {1} for %{query}");
    }

    #[test]
    fn test_policy_deserializes_from_yaml() {
        let yaml = "replacements:\n  - [\"„\", \"'\"]\nwrapQuote: null\n";
        let policy: PostProcessPolicy = serde_yml::from_str(yaml).unwrap();
        assert_eq!(policy.replacements, vec![("„".to_string(), "'".to_string())]);
        assert_eq!(policy.wrap_quote, None);
    }
}
