//! Source discovery and the outer batch loop

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;
use walkdir::WalkDir;

use crate::codec::LineFormat;
use crate::config::Config;
use crate::driver::{DriverOptions, FileReport, LocaleDriver, OutputSink};
use crate::error::{IdiomError, Result};
use crate::mt::MachineTranslator;

/// Resolve the source argument to the files to translate
///
/// A path with a supported extension is a single file. Anything else is
/// walked recursively for `*_<source locale>.yml` and `*_<source locale>.pres`.
pub fn discover_sources(source: &Path, source_locale: &str) -> Result<Vec<PathBuf>> {
    if LineFormat::from_path(source).is_some() {
        return Ok(vec![source.to_path_buf()]);
    }

    let suffixes = [
        format!("_{}.yml", source_locale),
        format!("_{}.pres", source_locale),
    ];

    let mut files = Vec::new();
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| IdiomError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = {
            let name = entry.file_name().to_string_lossy();
            suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
        };
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Translate every source file under `source`, one after another
pub async fn translate_all(
    source: &Path,
    config: &Config,
    translator: &dyn MachineTranslator,
    sink: &dyn OutputSink,
    options: &DriverOptions,
) -> Result<Vec<FileReport>> {
    let started = Instant::now();
    let files = discover_sources(source, &config.source_locale)?;
    info!(
        "Found {} source file(s) under {} using {}",
        files.len(),
        source.display(),
        translator.provider_name()
    );

    let driver = LocaleDriver::new(config, translator, sink, options);
    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        info!("Processing {}", file.display());
        reports.push(driver.translate_file(file).await?);
    }

    let translated: usize = reports.iter().map(FileReport::translated).sum();
    info!(
        "Translated {} line(s) in {:.2?}",
        translated,
        started.elapsed()
    );
    Ok(reports)
}
