use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ResourceError;

/// One row of one language file.
///
/// `value: None` means "not populated yet"; `Some("")` is an intentionally
/// blank value and is never reported as missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub key: String,
    pub value: Option<String>,
    pub comment: Option<String>,
}

impl ResourceEntry {
    pub fn new(key: String, value: Option<String>, comment: Option<String>) -> Self {
        Self {
            key,
            value,
            comment,
        }
    }
}

/// Ordered key → entry storage. Iteration follows insertion order, lookups go
/// through a key → slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceEntrySet {
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceEntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from file order. A repeated key replaces the earlier
    /// value in place.
    pub fn from_entries(entries: impl IntoIterator<Item = ResourceEntry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.set(entry.key, entry.value, entry.comment);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    /// Value of `key`, flattening "absent" and "null" into `None`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|entry| entry.value.as_deref())
    }

    /// Inserts or replaces the entry for `key`.
    pub fn set(&mut self, key: String, value: Option<String>, comment: Option<String>) {
        match self.index.get(&key) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                entry.value = value;
                entry.comment = comment;
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(ResourceEntry::new(key, value, comment));
            }
        }
    }

    /// Updates the value of an existing key; returns `false` when the key is
    /// unknown.
    pub fn set_value(&mut self, key: &str, value: Option<String>) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.entries[slot].value = value;
                true
            }
            None => false,
        }
    }

    pub fn set_comment(&mut self, key: &str, comment: Option<String>) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.entries[slot].comment = comment;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ResourceEntry> {
        let slot = self.index.remove(key)?;
        let removed = self.entries.remove(slot);
        for entry in &self.entries[slot..] {
            if let Some(position) = self.index.get_mut(&entry.key) {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Renames `old` to `new` keeping its position.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), ResourceError> {
        if self.index.contains_key(new) {
            return Err(ResourceError::DuplicateKey(new.to_string()));
        }
        let slot = self
            .index
            .remove(old)
            .ok_or_else(|| ResourceError::KeyNotFound(old.to_string()))?;
        self.entries[slot].key = new.to_string();
        self.index.insert(new.to_string(), slot);
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> + '_ {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceEntrySet {
        let mut set = ResourceEntrySet::new();
        set.set("A".into(), Some("Alpha".into()), None);
        set.set("B".into(), Some("Beta".into()), Some("second".into()));
        set.set("C".into(), None, None);
        set
    }

    #[test]
    fn keeps_insertion_order_and_upserts_in_place() {
        let mut set = sample();
        set.set("A".into(), Some("Apex".into()), None);

        assert_eq!(set.keys().collect::<Vec<_>>(), ["A", "B", "C"]);
        assert_eq!(set.value("A"), Some("Apex"));
        assert_eq!(set.value("C"), None);
        assert!(set.contains_key("C"));
    }

    #[test]
    fn remove_reindexes_following_entries() {
        let mut set = sample();
        let removed = set.remove("A").unwrap();

        assert_eq!(removed.value.as_deref(), Some("Alpha"));
        assert_eq!(set.value("B"), Some("Beta"));
        assert!(set.set_value("C", Some("Gamma".into())));
        assert_eq!(set.get("C").unwrap().value.as_deref(), Some("Gamma"));
        assert!(set.remove("A").is_none());
    }

    #[test]
    fn rename_keeps_position_and_rejects_collisions() {
        let mut set = sample();
        set.rename("B", "Bravo").unwrap();

        assert_eq!(set.keys().collect::<Vec<_>>(), ["A", "Bravo", "C"]);
        assert_eq!(set.get("Bravo").unwrap().comment.as_deref(), Some("second"));
        assert!(matches!(
            set.rename("A", "C"),
            Err(ResourceError::DuplicateKey(key)) if key == "C"
        ));
        assert!(matches!(
            set.rename("Missing", "D"),
            Err(ResourceError::KeyNotFound(key)) if key == "Missing"
        ));
        assert_eq!(set.value("A"), Some("Alpha"));
    }

    #[test]
    fn duplicate_keys_on_load_replace_earlier_values() {
        let set = ResourceEntrySet::from_entries(vec![
            ResourceEntry::new("K".into(), Some("first".into()), None),
            ResourceEntry::new("L".into(), None, None),
            ResourceEntry::new("K".into(), Some("second".into()), None),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.value("K"), Some("second"));
    }
}
