//! Keys already translated for a locale
//!
//! Built fresh for every locale from whatever destination files exist on
//! disk, so re-running the tool only translates what is still missing.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::LineFormat;
use crate::layout::DestinationPaths;

/// Key → already-translated value for one (source file, locale) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingKeySet {
    keys: HashMap<String, String>,
}

impl ExistingKeySet {
    /// Scan the destination artifacts of `locale`
    ///
    /// Missing, unreadable and unparsable files contribute no keys.
    pub fn load(paths: &DestinationPaths, locale: &str, format: LineFormat) -> Self {
        Self::from_files(&paths.existing_files(locale), format)
    }

    /// Merge the keys of every readable file, later files winning
    pub fn from_files(files: &[PathBuf], format: LineFormat) -> Self {
        let mut keys = HashMap::new();
        for path in files {
            if let Some(found) = read_keys(path, format) {
                debug!("Found {} existing keys in {}", found.len(), path.display());
                keys.extend(found);
            }
        }
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key.trim())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys.get(key.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(String, String)> for ExistingKeySet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

fn read_keys(path: &Path, format: LineFormat) -> Option<HashMap<String, String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Skipping unreadable destination {}: {}", path.display(), e);
            return None;
        }
    };

    match format.parse_document(&content) {
        Ok(keys) => Some(keys),
        Err(e) => {
            warn!("Skipping unparsable destination {}: {}", path.display(), e);
            None
        }
    }
}
