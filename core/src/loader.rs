//! Project-level collection of resources opened from one directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::EditorSettings;
use crate::events::Subscribers;
use crate::export::{export_zip, ExportError, ExportSummary};
use crate::formats::get_store;
use crate::resources::{
    EvaluationOptions, HolderOptions, Locale, ResourceError, ResourceHolder, SearchHit,
    SearchParams,
};
use crate::scanner::{FileScanner, ScanConfig};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("there are unsaved changes")]
    UnsavedChanges,

    #[error("no project is open")]
    NoProjectOpen,

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("failed to save {resource}: {source}")]
    SaveFailed {
        resource: String,
        #[source]
        source: ResourceError,
    },

    #[error("failed to scan directory: {0}")]
    Scan(#[from] std::io::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    ResourcesChanged,
    LoadProgress {
        loaded: usize,
        total: usize,
        resource: String,
    },
    /// The union of locales across all resources changed.
    LanguagesChanged(Vec<Locale>),
}

/// Which resources a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    pub hide_empty: bool,
    pub hide_without_translations: bool,
}

impl ResourceFilter {
    pub fn shows(&self, holder: &ResourceHolder) -> bool {
        !(self.hide_empty && holder.is_empty())
            && !(self.hide_without_translations && !holder.has_translations())
    }
}

/// A resource group that could not be loaded when the project was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHit {
    pub resource: String,
    #[serde(flatten)]
    pub hit: SearchHit,
}

#[derive(Debug)]
pub struct ResourceLoader {
    opened_path: Option<PathBuf>,
    resources: Vec<ResourceHolder>,
    used_languages: BTreeSet<Locale>,
    load_failures: Vec<LoadFailure>,
    scan_config: ScanConfig,
    holder_options: HolderOptions,
    keep_backups: bool,
    events: Subscribers<LoaderEvent>,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new(ScanConfig::default(), HolderOptions::default(), false)
    }
}

impl ResourceLoader {
    pub fn new(scan_config: ScanConfig, holder_options: HolderOptions, keep_backups: bool) -> Self {
        Self {
            opened_path: None,
            resources: Vec::new(),
            used_languages: BTreeSet::new(),
            load_failures: Vec::new(),
            scan_config,
            holder_options,
            keep_backups,
            events: Subscribers::default(),
        }
    }

    pub fn from_settings(settings: &EditorSettings) -> Self {
        Self::new(
            settings.scan_config(),
            settings.holder_options(),
            settings.keep_backups,
        )
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<LoaderEvent> {
        self.events.subscribe()
    }

    pub fn opened_path(&self) -> Option<&Path> {
        self.opened_path.as_deref()
    }

    /// Resources ordered by id.
    pub fn resources(&self) -> &[ResourceHolder] {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceHolder> {
        self.resources.iter().find(|holder| holder.id() == id)
    }

    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    pub fn is_dirty(&self) -> bool {
        self.resources.iter().any(ResourceHolder::is_dirty)
    }

    pub fn can_close(&self) -> bool {
        !self.is_dirty()
    }

    /// Scans `path` and replaces the open project with what was found.
    /// Refuses while there are unsaved changes.
    pub fn open_project(&mut self, path: &Path) -> Result<(), LoaderError> {
        if !path.is_dir() {
            return Err(LoaderError::DirectoryNotFound(path.to_path_buf()));
        }
        if self.is_dirty() {
            return Err(LoaderError::UnsavedChanges);
        }
        let root = dunce::canonicalize(path)?;
        let groups = FileScanner::new(self.scan_config.clone()).scan(&root)?;

        let total = groups.len();
        let mut resources = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (position, group) in groups.into_iter().enumerate() {
            let id = group.id.clone();
            if let Some(store) = get_store(group.format, self.keep_backups) {
                match ResourceHolder::load(
                    group.id,
                    group.base_path,
                    group.base_exists,
                    group.variants,
                    store,
                    self.holder_options,
                ) {
                    Ok(holder) => resources.push(holder),
                    Err(err) => {
                        warn!("skipping {id}: {err}");
                        failures.push(LoadFailure {
                            resource: id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            self.events.emit(LoaderEvent::LoadProgress {
                loaded: position + 1,
                total,
                resource: id,
            });
        }

        info!(
            "opened {} with {} resources ({} skipped)",
            root.display(),
            resources.len(),
            failures.len()
        );
        self.resources = resources;
        self.load_failures = failures;
        self.opened_path = Some(root);
        self.events.emit(LoaderEvent::ResourcesChanged);
        self.refresh_used_languages();
        Ok(())
    }

    /// Re-opens the current directory.
    pub fn reload(&mut self) -> Result<(), LoaderError> {
        let path = self.opened_path.clone().ok_or(LoaderError::NoProjectOpen)?;
        self.open_project(&path)
    }

    pub fn close(&mut self) -> Result<(), LoaderError> {
        if self.is_dirty() {
            return Err(LoaderError::UnsavedChanges);
        }
        self.opened_path = None;
        self.resources.clear();
        self.load_failures.clear();
        self.events.emit(LoaderEvent::ResourcesChanged);
        self.refresh_used_languages();
        Ok(())
    }

    /// Reverts every resource to its last loaded or saved state.
    pub fn discard_changes(&mut self) {
        for holder in &mut self.resources {
            holder.revert();
        }
        self.refresh_used_languages();
    }

    /// Saves dirty resources in order and stops at the first failure.
    /// Returns how many resources were written.
    pub fn save_all(&mut self) -> Result<usize, LoaderError> {
        let mut saved = 0;
        for holder in self.resources.iter_mut().filter(|h| h.is_dirty()) {
            holder.save().map_err(|source| LoaderError::SaveFailed {
                resource: holder.id().to_string(),
                source,
            })?;
            saved += 1;
        }
        info!("saved {saved} resources");
        Ok(saved)
    }

    /// Locales used by at least one resource, sorted.
    pub fn get_used_languages(&self) -> &BTreeSet<Locale> {
        &self.used_languages
    }

    /// Runs `f` on the resource with `id`, then re-derives the used-language
    /// set so callers cannot forget to.
    pub fn edit_resource<T>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut ResourceHolder) -> T,
    ) -> Result<T, LoaderError> {
        let holder = self
            .resources
            .iter_mut()
            .find(|holder| holder.id() == id)
            .ok_or_else(|| LoaderError::ResourceNotFound(id.to_string()))?;
        let result = f(holder);
        self.refresh_used_languages();
        Ok(result)
    }

    pub fn visible_resources<'a>(
        &'a self,
        filter: &'a ResourceFilter,
    ) -> impl Iterator<Item = &'a ResourceHolder> + 'a {
        self.resources.iter().filter(move |holder| filter.shows(holder))
    }

    /// Evaluates row flags of every resource for `enabled` locales.
    pub fn evaluate_all(&mut self, enabled: &[Locale], options: EvaluationOptions) {
        for holder in &mut self.resources {
            holder.evaluate_all_rows(enabled, options);
        }
    }

    /// Clears non-translatable rows in every resource that has variants and
    /// saves it. Stops at the first failure.
    pub fn remove_nontranslatable_from_all(
        &mut self,
        options: EvaluationOptions,
    ) -> Result<usize, LoaderError> {
        let mut touched = 0;
        for holder in self.resources.iter_mut().filter(|h| h.has_translations()) {
            holder
                .save_without_nontranslatable_data(options)
                .map_err(|source| LoaderError::SaveFailed {
                    resource: holder.id().to_string(),
                    source,
                })?;
            touched += 1;
        }
        Ok(touched)
    }

    pub fn find(&self, params: &SearchParams) -> Vec<ProjectHit> {
        self.resources
            .iter()
            .flat_map(|holder| {
                holder.find(params).into_iter().map(|hit| ProjectHit {
                    resource: holder.id().to_string(),
                    hit,
                })
            })
            .collect()
    }

    /// Zips every resource file that exists on disk, named relative to the
    /// opened directory. Unsaved edits are not included.
    pub fn export_zip(&self, output: &Path) -> Result<ExportSummary, LoaderError> {
        let root = self.opened_path.as_deref().ok_or(LoaderError::NoProjectOpen)?;
        let mut files = Vec::new();
        for holder in &self.resources {
            if holder.base().exists_on_disk() {
                files.push(holder.base().path());
            }
            files.extend(
                holder
                    .languages()
                    .filter(|(_, language)| language.exists_on_disk())
                    .map(|(_, language)| language.path()),
            );
        }
        Ok(export_zip(root, files, output)?)
    }

    fn refresh_used_languages(&mut self) {
        let used: BTreeSet<Locale> = self
            .resources
            .iter()
            .flat_map(|holder| holder.locales().cloned())
            .collect();
        if used != self.used_languages {
            self.used_languages = used;
            self.events.emit(LoaderEvent::LanguagesChanged(
                self.used_languages.iter().cloned().collect(),
            ));
        }
    }
}
