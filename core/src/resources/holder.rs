use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use super::{
    EvaluationOptions, LanguageHolder, LanguageRef, Locale, ResourceEntrySet, ResourceError,
    RowEvaluation, RowFlag, SearchField, SearchHit, SearchParams, SelectionScope,
    TranslatedText, TranslationConfig, TranslationPlan,
};
use crate::events::Subscribers;
use crate::formats::ResourceStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderOptions {
    /// Comments edited on a row are copied into every variant file as well.
    pub store_comments_in_all_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderEvent {
    DirtyChanged(bool),
    LanguagesChanged,
}

/// A base resource file and its language variants.
///
/// Every variant always carries exactly the base key set. Mutations that touch
/// several files are staged on copies and committed only when every file
/// accepted the change.
#[derive(Debug)]
pub struct ResourceHolder {
    id: String,
    base: LanguageHolder,
    languages: BTreeMap<Locale, LanguageHolder>,
    /// Variants added since the last save or revert.
    added: BTreeSet<Locale>,
    /// Variants deleted since the last save or revert, kept for revert.
    removed: Vec<LanguageHolder>,
    options: HolderOptions,
    evaluation: RowEvaluation,
    store: Arc<dyn ResourceStore>,
    events: Subscribers<HolderEvent>,
}

impl ResourceHolder {
    /// An empty resource whose base file will live at `base_path`.
    pub fn new(
        id: impl Into<String>,
        base_path: PathBuf,
        store: Arc<dyn ResourceStore>,
        options: HolderOptions,
    ) -> Self {
        Self {
            id: id.into(),
            base: LanguageHolder::new(None, base_path, Arc::clone(&store)),
            languages: BTreeMap::new(),
            added: BTreeSet::new(),
            removed: Vec::new(),
            options,
            evaluation: RowEvaluation::default(),
            store,
            events: Subscribers::default(),
        }
    }

    /// Loads the base file (when it exists) and every variant, then brings
    /// all key sets to the union of keys seen. The result is clean.
    pub fn load(
        id: impl Into<String>,
        base_path: PathBuf,
        base_exists: bool,
        variants: impl IntoIterator<Item = (Locale, PathBuf)>,
        store: Arc<dyn ResourceStore>,
        options: HolderOptions,
    ) -> Result<Self, ResourceError> {
        let mut holder = Self::new(id, base_path.clone(), Arc::clone(&store), options);
        if base_exists {
            holder.base = LanguageHolder::load(None, base_path, Arc::clone(&store))?;
        }
        for (locale, path) in variants {
            let language = LanguageHolder::load(Some(locale.clone()), path, Arc::clone(&store))?;
            holder.languages.insert(locale, language);
        }
        holder.normalize_keys();
        holder.base.accept_as_loaded();
        for language in holder.languages.values_mut() {
            language.accept_as_loaded();
        }
        debug!(
            "loaded resource {} with {} keys and {} languages",
            holder.id,
            holder.base.entries().len(),
            holder.languages.len()
        );
        Ok(holder)
    }

    fn normalize_keys(&mut self) {
        let mut extra = Vec::new();
        for language in self.languages.values() {
            for key in language.entries().keys() {
                if !self.base.entries().contains_key(key) && !extra.iter().any(|k| k == key) {
                    extra.push(key.to_string());
                }
            }
        }
        for key in extra {
            self.base.entries_mut().set(key, None, None);
        }
        let keys: Vec<String> = self.base.entries().keys().map(str::to_string).collect();
        for language in self.languages.values_mut() {
            for key in &keys {
                if !language.entries().contains_key(key) {
                    language.entries_mut().set(key.clone(), None, None);
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base(&self) -> &LanguageHolder {
        &self.base
    }

    pub fn base_path(&self) -> &Path {
        self.base.path()
    }

    pub fn languages(&self) -> impl Iterator<Item = (&Locale, &LanguageHolder)> + '_ {
        self.languages.iter()
    }

    pub fn language(&self, locale: &Locale) -> Option<&LanguageHolder> {
        self.languages.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &Locale> + '_ {
        self.languages.keys()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.base.entries().keys()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<HolderEvent> {
        self.events.subscribe()
    }

    pub fn is_empty(&self) -> bool {
        self.base.entries().is_empty()
    }

    pub fn has_translations(&self) -> bool {
        !self.languages.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || self.base.is_dirty()
            || self.languages.values().any(LanguageHolder::is_dirty)
    }

    fn notify_dirty(&mut self, was_dirty: bool) {
        let dirty = self.is_dirty();
        if dirty != was_dirty {
            self.events.emit(HolderEvent::DirtyChanged(dirty));
        }
    }

    fn column(&self, language: &LanguageRef) -> Result<&LanguageHolder, ResourceError> {
        match language {
            LanguageRef::Default => Ok(&self.base),
            LanguageRef::Locale(locale) => self
                .languages
                .get(locale)
                .ok_or_else(|| ResourceError::LanguageNotFound(locale.to_string())),
        }
    }

    fn column_mut(&mut self, language: &LanguageRef) -> Result<&mut LanguageHolder, ResourceError> {
        match language {
            LanguageRef::Default => Ok(&mut self.base),
            LanguageRef::Locale(locale) => self
                .languages
                .get_mut(locale)
                .ok_or_else(|| ResourceError::LanguageNotFound(locale.to_string())),
        }
    }

    /// Runs `op` on copies of the base set and every variant set and swaps
    /// them in only if all succeeded.
    fn apply_to_all<F>(&mut self, op: F) -> Result<(), ResourceError>
    where
        F: Fn(&mut ResourceEntrySet) -> Result<(), ResourceError>,
    {
        let mut staged_base = self.base.entries().clone();
        op(&mut staged_base)?;

        let mut staged = Vec::with_capacity(self.languages.len());
        for (locale, language) in &self.languages {
            let mut entries = language.entries().clone();
            op(&mut entries).map_err(|source| ResourceError::Language {
                locale: locale.clone(),
                source: Box::new(source),
            })?;
            staged.push(entries);
        }

        self.base.replace_entries(staged_base);
        for (language, entries) in self.languages.values_mut().zip(staged) {
            language.replace_entries(entries);
        }
        Ok(())
    }

    pub fn add_key(
        &mut self,
        key: &str,
        default_value: Option<String>,
        comment: Option<String>,
    ) -> Result<(), ResourceError> {
        if key.is_empty() {
            return Err(ResourceError::EmptyKey);
        }
        if self.base.entries().contains_key(key) {
            return Err(ResourceError::DuplicateKey(key.to_string()));
        }
        let was_dirty = self.is_dirty();
        let variant_comment = comment
            .clone()
            .filter(|_| self.options.store_comments_in_all_files);
        self.base
            .entries_mut()
            .set(key.to_string(), default_value, comment);
        for language in self.languages.values_mut() {
            language
                .entries_mut()
                .set(key.to_string(), None, variant_comment.clone());
        }
        self.notify_dirty(was_dirty);
        Ok(())
    }

    pub fn delete_key(&mut self, key: &str) -> Result<(), ResourceError> {
        if !self.base.entries().contains_key(key) {
            return Err(ResourceError::KeyNotFound(key.to_string()));
        }
        let was_dirty = self.is_dirty();
        self.apply_to_all(|entries| {
            entries
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| ResourceError::KeyNotFound(key.to_string()))
        })?;
        self.notify_dirty(was_dirty);
        Ok(())
    }

    pub fn rename_key(&mut self, old: &str, new: &str) -> Result<(), ResourceError> {
        if new.is_empty() {
            return Err(ResourceError::EmptyKey);
        }
        if !self.base.entries().contains_key(old) {
            return Err(ResourceError::KeyNotFound(old.to_string()));
        }
        if self.base.entries().contains_key(new) {
            return Err(ResourceError::DuplicateKey(new.to_string()));
        }
        let was_dirty = self.is_dirty();
        self.apply_to_all(|entries| entries.rename(old, new))?;
        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Path a variant file for `locale` gets: `Strings.resx` → `Strings.fr-FR.resx`.
    pub fn variant_path(&self, locale: &Locale) -> PathBuf {
        let base = self.base.path();
        let stem = base
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match base.extension() {
            Some(ext) => format!("{stem}.{locale}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{locale}"),
        };
        base.with_file_name(name)
    }

    pub fn add_language(
        &mut self,
        locale: &Locale,
        copy_default_values: bool,
    ) -> Result<&LanguageHolder, ResourceError> {
        if self.languages.contains_key(locale) {
            return Err(ResourceError::LanguageAlreadyExists(locale.to_string()));
        }
        let was_dirty = self.is_dirty();
        let mut language = LanguageHolder::new(
            Some(locale.clone()),
            self.variant_path(locale),
            Arc::clone(&self.store),
        );
        for entry in self.base.entries().iter() {
            let value = if copy_default_values {
                entry.value.clone()
            } else {
                None
            };
            let comment = entry
                .comment
                .clone()
                .filter(|_| self.options.store_comments_in_all_files);
            language.entries_mut().set(entry.key.clone(), value, comment);
        }
        info!("added language {} to {}", locale, self.id);
        self.languages.insert(locale.clone(), language);
        self.added.insert(locale.clone());
        self.events.emit(HolderEvent::LanguagesChanged);
        self.notify_dirty(was_dirty);
        self.languages
            .get(locale)
            .ok_or_else(|| ResourceError::LanguageNotFound(locale.to_string()))
    }

    /// Removes the variant from memory and returns its file path. The file
    /// itself is left alone; deleting it is up to the caller.
    pub fn delete_language(&mut self, locale: &Locale) -> Result<PathBuf, ResourceError> {
        let was_dirty = self.is_dirty();
        let language = self
            .languages
            .remove(locale)
            .ok_or_else(|| ResourceError::LanguageNotFound(locale.to_string()))?;
        let path = language.path().to_path_buf();
        if !self.added.remove(locale) {
            self.removed.push(language);
        }
        info!("removed language {} from {}", locale, self.id);
        self.events.emit(HolderEvent::LanguagesChanged);
        self.notify_dirty(was_dirty);
        Ok(path)
    }

    pub fn set_value(
        &mut self,
        key: &str,
        language: &LanguageRef,
        value: Option<String>,
    ) -> Result<(), ResourceError> {
        let was_dirty = self.is_dirty();
        let column = self.column_mut(language)?;
        if !column.entries_mut().set_value(key, value) {
            return Err(ResourceError::KeyNotFound(key.to_string()));
        }
        self.notify_dirty(was_dirty);
        Ok(())
    }

    pub fn set_comment(&mut self, key: &str, comment: Option<String>) -> Result<(), ResourceError> {
        let was_dirty = self.is_dirty();
        if !self.base.entries_mut().set_comment(key, comment.clone()) {
            return Err(ResourceError::KeyNotFound(key.to_string()));
        }
        if self.options.store_comments_in_all_files {
            for language in self.languages.values_mut() {
                language.entries_mut().set_comment(key, comment.clone());
            }
        }
        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Trims surrounding whitespace of the given cells; returns how many
    /// values actually changed. Unknown cells fail before anything changes.
    pub fn trim_whitespace(&mut self, cells: &[(String, LanguageRef)]) -> Result<usize, ResourceError> {
        for (key, language) in cells {
            if !self.column(language)?.entries().contains_key(key) {
                return Err(ResourceError::KeyNotFound(key.clone()));
            }
        }
        let was_dirty = self.is_dirty();
        let mut changed = 0;
        for (key, language) in cells {
            let entries = self.column_mut(language)?.entries_mut();
            let trimmed = entries
                .value(key)
                .map(str::trim)
                .filter(|trimmed| Some(*trimmed) != entries.value(key))
                .map(str::to_string);
            if let Some(trimmed) = trimmed {
                entries.set_value(key, Some(trimmed));
                changed += 1;
            }
        }
        self.notify_dirty(was_dirty);
        Ok(changed)
    }

    /// Recomputes row flags for exactly `enabled` locales. Locales the
    /// resource does not have are ignored.
    pub fn evaluate_all_rows(&mut self, enabled: &[Locale], options: EvaluationOptions) {
        let mut evaluation = RowEvaluation::new(options);
        let base = self.base.entries();
        for locale in enabled {
            let Some(language) = self.languages.get(locale) else {
                continue;
            };
            let flags: HashMap<String, RowFlag> = base
                .iter()
                .map(|entry| {
                    let flag = options.evaluate(
                        entry.value.as_deref(),
                        language.entries().value(&entry.key),
                    );
                    (entry.key.clone(), flag)
                })
                .collect();
            evaluation.insert(locale.clone(), flags);
        }
        self.evaluation = evaluation;
    }

    pub fn evaluation(&self) -> &RowEvaluation {
        &self.evaluation
    }

    pub fn row_flag(&self, key: &str, locale: &Locale) -> Option<RowFlag> {
        self.evaluation.flag(key, locale)
    }

    /// Next key after `after` (wrapping around) whose cell in `locale` has
    /// `flag`, according to the last evaluation.
    pub fn next_flagged_row(
        &self,
        locale: &Locale,
        flag: RowFlag,
        after: Option<&str>,
    ) -> Option<&str> {
        let keys: Vec<&str> = self.base.entries().keys().collect();
        let start = after
            .and_then(|after| keys.iter().position(|key| *key == after))
            .map(|position| position + 1)
            .unwrap_or(0);
        (0..keys.len())
            .map(|offset| keys[(start + offset) % keys.len()])
            .find(|key| self.evaluation.flag(key, locale) == Some(flag))
    }

    /// Picks the texts to send for translation. `None` means nothing
    /// qualifies, which callers treat as a no-op.
    pub fn get_text_for_translating(
        &self,
        config: &TranslationConfig,
    ) -> Result<Option<TranslationPlan>, ResourceError> {
        let source = self.column(&config.source)?.entries();
        let target = self.column(&config.target)?.entries();
        let base = self.base.entries();

        let flagged = |flag: RowFlag| {
            base.keys()
                .filter(|key| {
                    config.evaluation.evaluate(base.value(key), target.value(key)) == flag
                })
                .collect::<Vec<_>>()
        };

        let candidates: Vec<&str> = match &config.scope {
            SelectionScope::Selection(keys) => {
                for key in keys {
                    if !base.contains_key(key) {
                        return Err(ResourceError::KeyNotFound(key.clone()));
                    }
                }
                keys.iter().map(String::as_str).collect()
            }
            SelectionScope::AllMissing => flagged(RowFlag::Missing),
            SelectionScope::AllIdenticalToDefault => flagged(RowFlag::IdenticalToDefault),
        };

        let mut keys = Vec::new();
        let mut texts = Vec::new();
        for key in candidates {
            if let Some(text) = source.value(key).filter(|text| !text.trim().is_empty()) {
                keys.push(key.to_string());
                texts.push(text.to_string());
            }
        }

        if texts.is_empty() {
            return Ok(None);
        }
        Ok(Some(TranslationPlan::new(config.clone(), keys, texts)))
    }

    /// Writes `results` into the plan's target column at the plan's
    /// positions. Nothing is written unless every result has a home.
    pub fn set_translated_text(
        &mut self,
        plan: &TranslationPlan,
        results: &[TranslatedText],
    ) -> Result<(), ResourceError> {
        if results.len() != plan.len() {
            return Err(ResourceError::TranslationResultMismatch {
                expected: plan.len(),
                actual: results.len(),
            });
        }
        let target = self.column(&plan.config().target)?;
        if let Some(missing) = plan
            .keys()
            .iter()
            .find(|key| !target.entries().contains_key(key))
        {
            return Err(ResourceError::KeyNotFound(missing.clone()));
        }

        let was_dirty = self.is_dirty();
        let entries = self.column_mut(&plan.config().target)?.entries_mut();
        for (key, result) in plan.keys().iter().zip(results) {
            entries.set_value(key, Some(result.text.clone()));
        }
        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Writes every changed file. New variants are written even when they
    /// carry no values yet so the language exists on disk.
    pub fn save(&mut self) -> Result<(), ResourceError> {
        let was_dirty = self.is_dirty();
        if self.base.is_dirty() {
            self.base.save()?;
        }
        for language in self.languages.values_mut() {
            if language.is_dirty() || !language.exists_on_disk() {
                language.save()?;
            }
        }
        self.added.clear();
        self.removed.clear();
        info!("saved resource {}", self.id);
        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Clears variant values of rows whose base text is not translatable,
    /// then saves.
    pub fn save_without_nontranslatable_data(
        &mut self,
        options: EvaluationOptions,
    ) -> Result<(), ResourceError> {
        let was_dirty = self.is_dirty();
        let keys: Vec<String> = self
            .base
            .entries()
            .iter()
            .filter(|entry| !options.is_translatable(entry.value.as_deref()))
            .map(|entry| entry.key.clone())
            .collect();
        for language in self.languages.values_mut() {
            for key in &keys {
                language.entries_mut().set_value(key, None);
            }
        }
        if !keys.is_empty() {
            debug!("cleared {} non-translatable rows in {}", keys.len(), self.id);
        }
        self.notify_dirty(was_dirty);
        self.save()
    }

    /// Drops every unsaved change, including added or removed languages.
    pub fn revert(&mut self) {
        let was_dirty = self.is_dirty();
        let structure_changed = !self.added.is_empty() || !self.removed.is_empty();
        for locale in std::mem::take(&mut self.added) {
            self.languages.remove(&locale);
        }
        for language in std::mem::take(&mut self.removed) {
            if let Some(locale) = language.locale().cloned() {
                self.languages.insert(locale, language);
            } else {
                warn!("dropping a stashed base file while reverting {}", self.id);
            }
        }
        self.base.revert();
        for language in self.languages.values_mut() {
            language.revert();
        }
        if structure_changed {
            self.events.emit(HolderEvent::LanguagesChanged);
        }
        self.notify_dirty(was_dirty);
    }

    pub fn find(&self, params: &SearchParams) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        for entry in self.base.entries().iter() {
            if params.in_keys && params.matches(&entry.key) {
                hits.push(SearchHit {
                    key: entry.key.clone(),
                    language: None,
                    field: SearchField::Key,
                });
            }
            let columns = std::iter::once((None, &self.base))
                .chain(self.languages.iter().map(|(locale, l)| (Some(locale), l)));
            for (locale, column) in columns {
                let Some(cell) = column.entries().get(&entry.key) else {
                    continue;
                };
                if params.in_values && cell.value.as_deref().is_some_and(|v| params.matches(v)) {
                    hits.push(SearchHit {
                        key: entry.key.clone(),
                        language: locale.cloned(),
                        field: SearchField::Value,
                    });
                }
                if params.in_comments
                    && cell.comment.as_deref().is_some_and(|c| params.matches(c))
                {
                    hits.push(SearchHit {
                        key: entry.key.clone(),
                        language: locale.cloned(),
                        field: SearchField::Comment,
                    });
                }
            }
        }
        hits
    }
}
