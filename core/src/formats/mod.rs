/// Storage formats for string resources.
/// Every store is value-preserving: `load(save(entries)) == entries` for the
/// entries a store chooses to persist.
pub mod json;
pub mod resx;

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::backup::BackupError;
use crate::resources::ResourceEntry;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write error: {0}")]
    Write(#[from] BackupError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Resx,
    Json,
    Unknown,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "resx" => Self::Resx,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }

    /// Detect format from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Resx => "resx",
            Self::Json => "json",
            Self::Unknown => "",
        }
    }
}

/// Load/save collaborator for one resource file.
pub trait ResourceStore: Send + Sync + Debug {
    /// Read the ordered entries of the file at `path`.
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>, FormatError>;

    /// Replace the file at `path` with `entries`.
    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<(), FormatError>;

    fn format(&self) -> FileFormat;
}

/// Get the store for a format. `keep_backups` makes every save leave a
/// timestamped copy of the previous file next to it.
pub fn get_store(format: FileFormat, keep_backups: bool) -> Option<Arc<dyn ResourceStore>> {
    match format {
        FileFormat::Resx => Some(Arc::new(resx::ResxStore::new(keep_backups))),
        FileFormat::Json => Some(Arc::new(json::JsonStore::new(keep_backups))),
        FileFormat::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_format_case_insensitively() {
        assert_eq!(FileFormat::from_path(&PathBuf::from("a/Strings.RESX")), FileFormat::Resx);
        assert_eq!(FileFormat::from_path(&PathBuf::from("strings.fr.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(&PathBuf::from("Form1.cs")), FileFormat::Unknown);
        assert!(get_store(FileFormat::Unknown, false).is_none());
    }
}
