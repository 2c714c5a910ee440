use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EvaluationOptions, Locale};

/// A column of a resource: the base file or one variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LanguageRef {
    /// The neutral base file, translated as `TranslationConfig::default_language`.
    Default,
    Locale(Locale),
}

impl LanguageRef {
    pub fn locale(&self) -> Option<&Locale> {
        match self {
            Self::Default => None,
            Self::Locale(locale) => Some(locale),
        }
    }
}

impl From<Locale> for LanguageRef {
    fn from(value: Locale) -> Self {
        Self::Locale(value)
    }
}

impl fmt::Display for LanguageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("(default)"),
            Self::Locale(locale) => write!(f, "{locale}"),
        }
    }
}

/// Which cells of the target column are sent for translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionScope {
    /// Exactly these keys, in this order.
    Selection(Vec<String>),
    /// Rows flagged `Missing` in the target.
    AllMissing,
    /// Rows flagged `IdenticalToDefault` in the target.
    AllIdenticalToDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationConfig {
    pub source: LanguageRef,
    pub target: LanguageRef,
    /// Language code the base file is written in.
    pub default_language: String,
    pub scope: SelectionScope,
    /// Decides which rows the `All*` scopes consider translatable.
    #[serde(default)]
    pub evaluation: EvaluationOptions,
}

impl TranslationConfig {
    pub fn new(source: LanguageRef, target: LanguageRef, scope: SelectionScope) -> Self {
        Self {
            source,
            target,
            default_language: "en".into(),
            scope,
            evaluation: EvaluationOptions::default(),
        }
    }

    pub fn with_evaluation(mut self, options: EvaluationOptions) -> Self {
        self.evaluation = options;
        self
    }

    pub fn with_default_language(mut self, code: impl Into<String>) -> Self {
        self.default_language = code.into();
        self
    }

    pub fn source_code(&self) -> String {
        self.code_of(&self.source)
    }

    pub fn target_code(&self) -> String {
        self.code_of(&self.target)
    }

    fn code_of(&self, language: &LanguageRef) -> String {
        match language {
            LanguageRef::Default => self.default_language.clone(),
            LanguageRef::Locale(locale) => locale.to_string(),
        }
    }
}

/// Texts picked by `ResourceHolder::get_text_for_translating`, with the keys
/// they came from at the same positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationPlan {
    config: TranslationConfig,
    keys: Vec<String>,
    texts: Vec<String>,
}

impl TranslationPlan {
    pub(crate) fn new(config: TranslationConfig, keys: Vec<String>, texts: Vec<String>) -> Self {
        Self { config, keys, texts }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// One translated string as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedText {
    pub text: String,
    pub detected_source_language: Option<String>,
}

impl TranslatedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detected_source_language: None,
        }
    }
}
