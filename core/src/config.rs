/// Editor settings and the explicit option values derived from them
use crate::backup::{write_atomically, BackupError};
use crate::loader::ResourceFilter;
use crate::resources::{
    EvaluationOptions, HolderOptions, LanguageRef, SelectionScope, TranslationConfig,
};
use crate::scanner::ScanConfig;
use crate::translate::BatchConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the per-project ignore file, read from the opened directory.
pub const IGNORE_FILE_NAME: &str = ".resxtranslatorignore";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to write settings: {0}")]
    Write(#[from] BackupError),

    #[error("No configuration directory on this system")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationSettings {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    /// Language code the base files are written in.
    pub default_language: String,
    /// Falls back to `GOOGLE_TRANSLATE_API_KEY` when unset.
    pub api_key: Option<String>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            inter_batch_delay_ms: 5_000,
            default_language: "en".to_string(),
            api_key: None,
        }
    }
}

/// Exclusion patterns for directory scanning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreOptions {
    /// User patterns (gitignore-like subset)
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Read `.resxtranslatorignore` from the scanned root
    #[serde(default = "default_true")]
    pub use_ignore_file: bool,

    /// Skip build output and VCS folders
    #[serde(default = "default_true")]
    pub use_default_patterns: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IgnoreOptions {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            use_ignore_file: true,
            use_default_patterns: true,
        }
    }
}

impl IgnoreOptions {
    pub fn load_ignore_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, std::io::Error> {
        let content = fs::read_to_string(path)?;
        Ok(parse_ignore_patterns(&content))
    }

    /// Defaults, then the project's ignore file, then user patterns.
    pub fn collect_patterns<P: AsRef<Path>>(&self, root: P) -> Vec<String> {
        let mut patterns = Vec::new();

        if self.use_default_patterns {
            patterns.extend(default_ignore_patterns());
        }

        if self.use_ignore_file {
            let ignore_path = root.as_ref().join(IGNORE_FILE_NAME);
            if let Ok(file_patterns) = Self::load_ignore_file(&ignore_path) {
                debug!("{} patterns from {}", file_patterns.len(), ignore_path.display());
                patterns.extend(file_patterns);
            }
        }

        patterns.extend(self.patterns.iter().cloned());
        patterns
    }
}

pub fn parse_ignore_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn default_ignore_patterns() -> Vec<String> {
    [
        "bin/",
        "obj/",
        ".git/",
        ".svn/",
        ".vs/",
        ".idea/",
        "node_modules/",
        "packages/",
        "TestResults/",
    ]
    .iter()
    .map(|pattern| pattern.to_string())
    .collect()
}

/// Case-insensitive match of a `/`-separated relative path against one
/// pattern: `dir/`, `*.ext`, `prefix*`, or a plain substring.
pub fn matches_ignore_pattern(path: &str, pattern: &str) -> bool {
    let path_lower = path.to_lowercase().replace('\\', "/");
    let pattern_lower = pattern.to_lowercase();

    if let Some(dir) = pattern_lower.strip_suffix('/') {
        let dir = dir.trim_start_matches('/');
        return path_lower.starts_with(&format!("{dir}/"))
            || path_lower.contains(&format!("/{dir}/"));
    }

    if let Some(ext) = pattern_lower.strip_prefix('*') {
        if ext.starts_with('.') {
            return path_lower.ends_with(ext);
        }
    }

    if let Some(prefix) = pattern_lower.strip_suffix('*') {
        let filename = path_lower.rsplit('/').next().unwrap_or(&path_lower);
        return filename.starts_with(prefix);
    }

    path_lower.contains(&pattern_lower)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub hide_empty_resources: bool,
    pub hide_nontranslated_resources: bool,
    pub add_default_values_on_language_add: bool,
    pub translatable_in_brackets: bool,
    /// Display hint only; the library never reads it.
    pub show_null_values_as_grayed: bool,
    pub store_comments_in_all_files: bool,
    pub open_last_dir_on_start: bool,
    pub last_opened_directory: Option<PathBuf>,
    pub keep_backups: bool,
    pub translation: TranslationSettings,
    pub ignore: IgnoreOptions,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            hide_empty_resources: false,
            hide_nontranslated_resources: false,
            add_default_values_on_language_add: false,
            translatable_in_brackets: false,
            show_null_values_as_grayed: true,
            store_comments_in_all_files: false,
            open_last_dir_on_start: true,
            last_opened_directory: None,
            keep_backups: false,
            translation: TranslationSettings::default(),
            ignore: IgnoreOptions::default(),
        }
    }
}

impl EditorSettings {
    /// `<config dir>/resx-translator/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join("resx-translator").join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        write_atomically(path, content.as_bytes(), false)?;
        info!("settings saved to {}", path.display());
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            translatable_in_brackets: self.translatable_in_brackets,
        }
    }

    pub fn holder_options(&self) -> HolderOptions {
        HolderOptions {
            store_comments_in_all_files: self.store_comments_in_all_files,
        }
    }

    pub fn resource_filter(&self) -> ResourceFilter {
        ResourceFilter {
            hide_empty: self.hide_empty_resources,
            hide_without_translations: self.hide_nontranslated_resources,
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.translation.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(self.translation.inter_batch_delay_ms),
        }
    }

    /// Translation request with the configured base language and row policy.
    pub fn translation_config(
        &self,
        source: LanguageRef,
        target: LanguageRef,
        scope: SelectionScope,
    ) -> TranslationConfig {
        TranslationConfig::new(source, target, scope)
            .with_default_language(self.translation.default_language.clone())
            .with_evaluation(self.evaluation_options())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            ignore: self.ignore.clone(),
            ..ScanConfig::default()
        }
    }

    /// Directory to reopen at startup, if enabled and still present.
    pub fn startup_directory(&self) -> Option<&Path> {
        if !self.open_last_dir_on_start {
            return None;
        }
        self.last_opened_directory
            .as_deref()
            .filter(|dir| dir.is_dir())
    }

    /// Settings key first, then `GOOGLE_TRANSLATE_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.translation
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("GOOGLE_TRANSLATE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}
