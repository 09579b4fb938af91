//! Locale driver: translates one source file into every target locale
//!
//! For each locale the source lines are replayed in order:
//!
//! ```text
//! decode → skip check → extract → translate → restore → encode
//! ```
//!
//! and whatever survives is appended to the locale's destination file under a
//! dated banner. Locales run strictly one after another, and each starts from
//! a fresh [`LocaleScope`] so nothing leaks between them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::codec::{BATCH_HEADLINE, LineFormat, is_blank_or_comment};
use crate::config::{Config, LocaleTask};
use crate::error::{IdiomError, Result};
use crate::existing::ExistingKeySet;
use crate::layout::{DestinationPaths, OutputLayout};
use crate::markup::{extract, restore};
use crate::mt::{MachineTranslator, SERVICE_ERROR_SENTINEL, SOURCE_LANGUAGE};

/// Receives the finished output of one locale
pub trait OutputSink: Send + Sync {
    /// Append `banner` and `content` to `path`, never truncating it
    fn append(&self, path: &Path, banner: &str, content: &str) -> std::io::Result<()>;
}

/// Appends to files on disk, creating parent directories as needed
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAppender;

impl OutputSink for FileAppender {
    fn append(&self, path: &Path, banner: &str, content: &str) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file)?;
        writeln!(file, "{}", banner)?;
        writeln!(file, "{}", content)?;
        Ok(())
    }
}

/// Comment block written above every batch of generated keys
pub fn translation_banner(date: NaiveDate) -> String {
    format!(
        "# \n{}{}/{}/{}.\n# ",
        BATCH_HEADLINE,
        date.month(),
        date.day(),
        date.year()
    )
}

/// Per-run switches supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Translate keys even if the destination already has them
    pub overwrite: bool,
    /// Only these locales (source locale is still skipped)
    pub languages: Option<Vec<String>>,
    /// Force a layout instead of inferring it from the source path
    pub layout: Option<OutputLayout>,
    /// Destination root instead of the source's directory
    pub destination: Option<PathBuf>,
}

/// What happened to one locale of one file
///
/// `translated` counts only lines the backend answered; parent keys and
/// empty values are carried along in the output but never counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: String,
    pub translated: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub written_to: Option<PathBuf>,
}

/// What happened to one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub locales: Vec<LocaleReport>,
}

impl FileReport {
    pub fn translated(&self) -> usize {
        self.locales.iter().map(|l| l.translated).sum()
    }
}

/// State that lives exactly as long as one locale's pass
struct LocaleScope<'t> {
    task: &'t LocaleTask,
    existing: ExistingKeySet,
    output: Vec<String>,
    report: LocaleReport,
}

impl<'t> LocaleScope<'t> {
    fn new(task: &'t LocaleTask, existing: ExistingKeySet) -> Self {
        Self {
            task,
            existing,
            output: Vec::new(),
            report: LocaleReport {
                locale: task.locale.clone(),
                ..LocaleReport::default()
            },
        }
    }
}

/// Drop one pair of wrapping single quotes, leaving `'''` delimiters whole
fn unquote_value(value: &str) -> &str {
    let value = match value.strip_prefix('\'') {
        Some(rest) if !value.starts_with("'''") => rest,
        _ => value,
    };
    match value.strip_suffix('\'') {
        Some(rest) if !value.ends_with("'''") => rest,
        _ => value,
    }
}

pub struct LocaleDriver<'a> {
    config: &'a Config,
    translator: &'a dyn MachineTranslator,
    sink: &'a dyn OutputSink,
    options: &'a DriverOptions,
}

impl<'a> LocaleDriver<'a> {
    pub fn new(
        config: &'a Config,
        translator: &'a dyn MachineTranslator,
        sink: &'a dyn OutputSink,
        options: &'a DriverOptions,
    ) -> Self {
        Self {
            config,
            translator,
            sink,
            options,
        }
    }

    /// Translate `source` into every selected locale
    ///
    /// # Errors
    ///
    /// Any translate-capability error, marker that cannot be restored, or
    /// failed write aborts the run; a service-error sentinel only drops its line.
    pub async fn translate_file(&self, source: &Path) -> Result<FileReport> {
        let format = LineFormat::from_path(source)
            .ok_or_else(|| IdiomError::UnsupportedSource(source.to_path_buf()))?;
        let content =
            std::fs::read_to_string(source).map_err(|e| IdiomError::io(source, e))?;
        let lines: Vec<&str> = content.lines().collect();

        let paths = DestinationPaths::resolve(
            source,
            &self.config.source_locale,
            format,
            self.options.layout,
            self.options.destination.as_deref(),
        );
        let tasks = self
            .config
            .locale_tasks(self.options.languages.as_deref())?;

        let mut report = FileReport {
            source: source.to_path_buf(),
            locales: Vec::with_capacity(tasks.len()),
        };

        for task in &tasks {
            let existing = ExistingKeySet::load(&paths, &task.locale, format);
            debug!(
                "{} existing keys for {}",
                existing.len(),
                task.locale
            );
            let mut scope = LocaleScope::new(task, existing);

            for line in &lines {
                if let Some(out) = self.process_line(&mut scope, format, line).await? {
                    scope.output.push(out);
                }
            }

            report.locales.push(self.flush(scope, &paths)?);
        }

        Ok(report)
    }

    fn is_source_root(&self, format: LineFormat, line: &str) -> bool {
        if format != LineFormat::KeyColonValue {
            return false;
        }
        let trimmed = line.trim();
        trimmed == "en:" || trimmed == format!("{}:", self.config.source_locale)
    }

    async fn process_line(
        &self,
        scope: &mut LocaleScope<'_>,
        format: LineFormat,
        line: &str,
    ) -> Result<Option<String>> {
        if is_blank_or_comment(line) {
            return Ok(None);
        }
        if self.is_source_root(format, line) {
            return Ok(Some(format!("{}:", scope.task.locale)));
        }

        let Some(unit) = format.decode(line) else {
            debug!("Skipping unparsable line: {}", line);
            return Ok(None);
        };

        // Parent keys keep nested entries of this batch in place
        if unit.raw_value.is_empty() {
            return Ok(Some(line.trim_end().to_string()));
        }

        if !self.options.overwrite && scope.existing.contains(unit.lookup_key()) {
            debug!("{} already translated for {}", unit.lookup_key(), scope.task.locale);
            scope.report.skipped += 1;
            return Ok(None);
        }

        if unquote_value(&unit.raw_value).is_empty() {
            return Ok(Some(format.encode(&unit.key, "")));
        }

        match self
            .translate_value(&unit.key, &unit.raw_value, scope.task)
            .await?
        {
            Some(translation) => {
                scope.report.translated += 1;
                Ok(Some(format.encode(&unit.key, &translation)))
            }
            None => {
                scope.report.dropped += 1;
                Ok(None)
            }
        }
    }

    /// Mask, translate and restore one value; `None` if the backend had no result
    pub async fn translate_value(
        &self,
        key: &str,
        raw_value: &str,
        task: &LocaleTask,
    ) -> Result<Option<String>> {
        let value = unquote_value(raw_value);
        if value.is_empty() {
            return Ok(Some(String::new()));
        }

        info!("Translating {} into {}...", value, task.locale);
        let tokens = extract(value);
        debug!("Masked: {}", tokens.masked_text);

        let translated = self
            .translator
            .translate(&tokens.masked_text, SOURCE_LANGUAGE, &task.translation_code)
            .await?;

        let cooldown = self.config.cooldown();
        if !cooldown.is_zero() {
            tokio::time::sleep(cooldown).await;
        }

        if translated == SERVICE_ERROR_SENTINEL {
            warn!(
                "{} returned no result for '{}' ({}), dropping line",
                self.translator.provider_name(),
                key.trim(),
                task.locale
            );
            return Ok(None);
        }

        restore(&translated, &tokens, &self.config.post_process)
            .map(Some)
            .map_err(|source| IdiomError::Markup {
                key: key.trim().to_string(),
                source,
            })
    }

    fn flush(&self, scope: LocaleScope<'_>, paths: &DestinationPaths) -> Result<LocaleReport> {
        let mut report = scope.report;
        // Root and parent keys alone are not worth a banner
        if report.translated == 0 {
            return Ok(report);
        }

        let destination = paths.destination_path(&scope.task.locale);
        let content = scope.output.join("\n");
        info!("Writing to {}", destination.display());
        debug!("{}", content);

        let banner = translation_banner(Local::now().date_naive());
        self.sink
            .append(&destination, &banner, &content)
            .map_err(|e| IdiomError::io(&destination, e))?;

        report.written_to = Some(destination);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            translation_banner(date),
            "# \n# Keys translated automatically on 3/7/2026.\n# "
        );
    }

    #[test]
    fn test_unquote_value() {
        assert_eq!(unquote_value("'first key'"), "first key");
        assert_eq!(unquote_value("first key"), "first key");
        assert_eq!(unquote_value("'''ACME''' rocks"), "'''ACME''' rocks");
        assert_eq!(unquote_value("it rocks '''ACME'''"), "it rocks '''ACME'''");
        assert_eq!(unquote_value("''"), "");
    }

    #[test]
    fn test_file_appender_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("path_de-DE.pres");

        FileAppender.append(&path, "# one", "A=1").unwrap();
        FileAppender.append(&path, "# two", "B=2").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "\n# one\nA=1\n\n# two\nB=2\n");
    }
}
