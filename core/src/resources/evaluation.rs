use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::Locale;

/// Translation state of one (key, language) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowFlag {
    /// Value present and not suspicious.
    Default,
    /// No value while the base text is translatable.
    Missing,
    /// Value equals the base text, most likely never translated.
    IdenticalToDefault,
    /// Base text is empty or excluded by the bracket policy.
    NotTranslatable,
}

/// Settings that change how cells are flagged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOptions {
    /// Only base values written as `[text]` are considered translatable.
    pub translatable_in_brackets: bool,
}

impl EvaluationOptions {
    pub fn is_translatable(&self, base: Option<&str>) -> bool {
        match base {
            None => false,
            Some(text) if text.is_empty() => false,
            Some(text) if self.translatable_in_brackets => {
                let trimmed = text.trim();
                trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']')
            }
            Some(_) => true,
        }
    }

    pub fn evaluate(&self, base: Option<&str>, value: Option<&str>) -> RowFlag {
        if !self.is_translatable(base) {
            return RowFlag::NotTranslatable;
        }
        match value {
            None => RowFlag::Missing,
            Some(value) if Some(value) == base => RowFlag::IdenticalToDefault,
            Some(_) => RowFlag::Default,
        }
    }
}

/// Flags computed by the last evaluation pass, per enabled locale.
#[derive(Debug, Clone, Default)]
pub struct RowEvaluation {
    options: EvaluationOptions,
    flags: BTreeMap<Locale, HashMap<String, RowFlag>>,
}

impl RowEvaluation {
    pub(crate) fn new(options: EvaluationOptions) -> Self {
        Self {
            options,
            flags: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, locale: Locale, flags: HashMap<String, RowFlag>) {
        self.flags.insert(locale, flags);
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Locales covered by the last pass.
    pub fn locales(&self) -> impl Iterator<Item = &Locale> + '_ {
        self.flags.keys()
    }

    pub fn flag(&self, key: &str, locale: &Locale) -> Option<RowFlag> {
        self.flags.get(locale)?.get(key).copied()
    }

    /// True when any evaluated language of the row is missing.
    pub fn row_has_missing(&self, key: &str) -> bool {
        self.flags
            .values()
            .any(|flags| flags.get(key) == Some(&RowFlag::Missing))
    }

    pub fn count(&self, locale: &Locale, flag: RowFlag) -> usize {
        self.flags
            .get(locale)
            .map(|flags| flags.values().filter(|&&f| f == flag).count())
            .unwrap_or(0)
    }
}
