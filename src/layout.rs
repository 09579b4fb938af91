//! Destination paths for translated output
//!
//! Two layouts are supported:
//!
//! - **Flat**: `<destination>/<basename>_<locale>.<ext>`
//! - **Per-locale directory**: `<destination>/<locale>/<basename>_<locale>.<ext>`
//!
//! When the layout is not given explicitly it is inferred: a source file whose
//! parent directory is named after the source locale (`translations/en-US/app.pres`)
//! uses per-locale directories rooted one level up.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::codec::LineFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    Flat,
    PerLocaleDirectory,
}

/// Resolved destination paths for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPaths {
    destination: PathBuf,
    basename: String,
    extension: &'static str,
    layout: OutputLayout,
}

impl DestinationPaths {
    /// Work out where translations of `source` go
    ///
    /// * `layout` - explicit layout, or `None` to infer it from the source path
    /// * `destination` - explicit destination root, or `None` for the source's directory
    ///   (its parent, for per-locale directories)
    pub fn resolve(
        source: &Path,
        source_locale: &str,
        format: LineFormat,
        layout: Option<OutputLayout>,
        destination: Option<&Path>,
    ) -> Self {
        let source_dir = source.parent().unwrap_or_else(|| Path::new(""));
        let in_locale_dir = source_dir
            .file_name()
            .is_some_and(|name| name == OsStr::new(source_locale));

        let layout = layout.unwrap_or(if in_locale_dir {
            OutputLayout::PerLocaleDirectory
        } else {
            OutputLayout::Flat
        });

        let destination = match destination {
            Some(dir) => dir.to_path_buf(),
            None if layout == OutputLayout::PerLocaleDirectory && in_locale_dir => source_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            None => source_dir.to_path_buf(),
        };

        Self {
            destination,
            basename: base_name(source, source_locale),
            extension: format.extension(),
            layout,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Directory that holds the output for `locale`
    pub fn locale_dir(&self, locale: &str) -> PathBuf {
        match self.layout {
            OutputLayout::Flat => self.destination.clone(),
            OutputLayout::PerLocaleDirectory => self.destination.join(locale),
        }
    }

    /// File the translations for `locale` are appended to
    pub fn destination_path(&self, locale: &str) -> PathBuf {
        self.locale_dir(locale)
            .join(format!("{}_{}.{}", self.basename, locale, self.extension))
    }

    /// Files whose keys count as already translated for `locale`
    ///
    /// Flat layout: the destination file alone. Per-locale directories: every
    /// file with the format's extension in the locale directory (which may not
    /// exist yet).
    pub fn existing_files(&self, locale: &str) -> Vec<PathBuf> {
        match self.layout {
            OutputLayout::Flat => vec![self.destination_path(locale)],
            OutputLayout::PerLocaleDirectory => {
                let dir = self.locale_dir(locale);
                let Ok(entries) = std::fs::read_dir(&dir) else {
                    return Vec::new();
                };
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| {
                        path.is_file()
                            && path.extension().and_then(|ext| ext.to_str())
                                == Some(self.extension)
                    })
                    .collect();
                files.sort();
                files
            }
        }
    }
}

/// File stem with the `_<source locale>` marker removed: `path_en-US.pres` → `path`
fn base_name(source: &Path, source_locale: &str) -> String {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = file_name.replace(&format!("_{}", source_locale), "");
    stripped
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}
