/// Directory walking and grouping of base files with their language variants
use crate::config::{matches_ignore_pattern, IgnoreOptions};
use crate::formats::{get_store, FileFormat};
use crate::resources::Locale;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Files above this size are skipped (default: 20MB)
    #[serde(default = "default_max_size")]
    pub max_file_size: u64,

    #[serde(default)]
    pub ignore: IgnoreOptions,
}

fn default_max_size() -> u64 {
    20 * 1024 * 1024
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_size(),
            ignore: IgnoreOptions::default(),
        }
    }
}

/// A base file and the variant files found next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Base path relative to the scanned root, `/`-separated.
    pub id: String,
    pub format: FileFormat,
    pub base_path: PathBuf,
    /// False when only variants were found.
    pub base_exists: bool,
    pub variants: BTreeMap<Locale, PathBuf>,
}

#[derive(Debug)]
pub struct FileScanner {
    config: ScanConfig,
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            ignore_patterns: Vec::new(),
        }
    }

    /// Collects resource files under `root` and groups them. Output is sorted
    /// by group id.
    pub fn scan(&self, root: &Path) -> Result<Vec<ResourceGroup>, std::io::Error> {
        let scanner = Self {
            config: self.config.clone(),
            ignore_patterns: self.config.ignore.collect_patterns(root),
        };

        let mut files = Vec::new();
        scanner.scan_recursive(root, root, &mut files)?;
        files.sort();

        let mut groups: BTreeMap<String, ResourceGroup> = BTreeMap::new();
        for path in files {
            let format = FileFormat::from_path(&path);
            let (base_path, locale) = split_locale(&path);
            let id = relative_id(root, &base_path);
            let group = groups.entry(id.clone()).or_insert_with(|| ResourceGroup {
                id,
                format,
                base_path: base_path.clone(),
                base_exists: false,
                variants: BTreeMap::new(),
            });
            match locale {
                Some(locale) => {
                    group.variants.insert(locale, path);
                }
                None => group.base_exists = true,
            }
        }
        debug!("found {} resource groups under {}", groups.len(), root.display());
        Ok(groups.into_values().collect())
    }

    fn scan_recursive(
        &self,
        root: &Path,
        current: &Path,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), std::io::Error> {
        for entry in fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            let relative = relative_id(root, &path);

            if path.is_dir() {
                if !self.is_path_ignored(&format!("{relative}/")) {
                    self.scan_recursive(root, &path, files)?;
                }
            } else if path.is_file() && self.accepts(&path, &relative)? {
                debug!("scanned {relative}");
                files.push(path);
            }
        }
        Ok(())
    }

    fn accepts(&self, path: &Path, relative: &str) -> Result<bool, std::io::Error> {
        let format = FileFormat::from_path(path);
        if get_store(format, false).is_none() {
            return Ok(false);
        }
        if self.is_path_ignored(relative) {
            return Ok(false);
        }
        Ok(fs::metadata(path)?.len() <= self.config.max_file_size)
    }

    fn is_path_ignored(&self, relative_path: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| matches_ignore_pattern(relative_path, pattern))
    }
}

/// `Strings.fr-FR.resx` → (`Strings.resx`, `fr-FR`). Files without a locale
/// suffix are base files.
pub fn split_locale(path: &Path) -> (PathBuf, Option<Locale>) {
    let (Some(stem), Some(ext)) = (path.file_stem(), path.extension()) else {
        return (path.to_path_buf(), None);
    };
    let stem = stem.to_string_lossy();
    let Some((name, suffix)) = stem.rsplit_once('.') else {
        return (path.to_path_buf(), None);
    };
    match Locale::parse(suffix) {
        Ok(locale) if !name.is_empty() => {
            let base = path.with_file_name(format!("{name}.{}", ext.to_string_lossy()));
            (base, Some(locale))
        }
        _ => (path.to_path_buf(), None),
    }
}

fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
