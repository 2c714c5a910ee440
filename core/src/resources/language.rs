use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::{Locale, ResourceEntry, ResourceEntrySet, ResourceError};
use crate::formats::ResourceStore;

/// One file of a resource: the base file (`locale == None`) or a variant.
#[derive(Debug)]
pub struct LanguageHolder {
    locale: Option<Locale>,
    path: PathBuf,
    entries: ResourceEntrySet,
    snapshot: ResourceEntrySet,
    store: Arc<dyn ResourceStore>,
    exists_on_disk: bool,
}

impl LanguageHolder {
    /// A holder with no backing file yet.
    pub fn new(locale: Option<Locale>, path: PathBuf, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            locale,
            path,
            entries: ResourceEntrySet::new(),
            snapshot: ResourceEntrySet::new(),
            store,
            exists_on_disk: false,
        }
    }

    pub fn load(
        locale: Option<Locale>,
        path: PathBuf,
        store: Arc<dyn ResourceStore>,
    ) -> Result<Self, ResourceError> {
        let mut holder = Self::new(locale, path, store);
        holder.reload()?;
        Ok(holder)
    }

    /// Re-reads the backing file and resets the snapshot.
    pub fn reload(&mut self) -> Result<(), ResourceError> {
        let entries = self.store.load(&self.path).map_err(|source| ResourceError::Store {
            path: self.path.clone(),
            source,
        })?;
        debug!("loaded {} entries from {}", entries.len(), self.path.display());
        self.entries = ResourceEntrySet::from_entries(entries);
        self.snapshot = self.entries.clone();
        self.exists_on_disk = true;
        Ok(())
    }

    /// Writes the current entries. Variant files leave out rows that carry
    /// neither a value nor a comment; they come back as `None` on load.
    pub fn save(&mut self) -> Result<(), ResourceError> {
        let entries: Vec<ResourceEntry> = if self.locale.is_some() {
            self.entries
                .iter()
                .filter(|entry| entry.value.is_some() || entry.comment.is_some())
                .cloned()
                .collect()
        } else {
            self.entries.entries().to_vec()
        };
        self.store
            .save(&self.path, &entries)
            .map_err(|source| ResourceError::Store {
                path: self.path.clone(),
                source,
            })?;
        self.mark_saved();
        Ok(())
    }

    /// Drops in-memory edits, going back to the last loaded or saved state.
    pub fn revert(&mut self) {
        self.entries = self.snapshot.clone();
    }

    /// Value comparison against the snapshot, so rewriting an identical value
    /// does not count as a change.
    pub fn is_dirty(&self) -> bool {
        self.entries != self.snapshot
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn exists_on_disk(&self) -> bool {
        self.exists_on_disk
    }

    pub fn entries(&self) -> &ResourceEntrySet {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut ResourceEntrySet {
        &mut self.entries
    }

    pub(crate) fn replace_entries(&mut self, entries: ResourceEntrySet) {
        self.entries = entries;
    }

    fn mark_saved(&mut self) {
        self.snapshot = self.entries.clone();
        self.exists_on_disk = true;
    }

    /// Accepts the current entries as the clean state without touching disk.
    /// Used after load-time key normalization.
    pub(crate) fn accept_as_loaded(&mut self) {
        self.snapshot = self.entries.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::json::JsonStore;
    use std::fs;

    fn store() -> Arc<dyn ResourceStore> {
        Arc::new(JsonStore::new(false))
    }

    #[test]
    fn identical_write_does_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.json");
        fs::write(&path, r#"{"K": "Hello"}"#).unwrap();
        let mut holder = LanguageHolder::load(None, path, store()).unwrap();

        holder.entries_mut().set_value("K", Some("Hello".into()));
        assert!(!holder.is_dirty());

        holder.entries_mut().set_value("K", Some("Hi".into()));
        assert!(holder.is_dirty());

        holder.revert();
        assert!(!holder.is_dirty());
        assert_eq!(holder.entries().value("K"), Some("Hello"));
    }

    #[test]
    fn variant_save_skips_unpopulated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.fr.json");
        let locale = Locale::parse("fr").unwrap();
        let mut holder = LanguageHolder::new(Some(locale), path.clone(), store());
        holder.entries_mut().set("A".into(), Some("Bonjour".into()), None);
        holder.entries_mut().set("B".into(), None, None);

        holder.save().unwrap();

        assert!(holder.exists_on_disk());
        assert!(!holder.is_dirty());
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("Bonjour"));
        assert!(!written.contains("\"B\""));
    }

    #[test]
    fn load_failure_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let err = LanguageHolder::load(None, path.clone(), store()).unwrap_err();
        assert!(matches!(err, ResourceError::Store { path: p, .. } if p == path));
    }
}
