//! In-memory model of a resource project: entry sets, the files that hold
//! them, and the holder that keeps a base file and its variants in step.

mod entries;
mod evaluation;
mod holder;
mod language;
mod locale;
mod plan;
mod search;

use std::path::PathBuf;
use thiserror::Error;

use crate::formats::FormatError;

pub use entries::{ResourceEntry, ResourceEntrySet};
pub use evaluation::{EvaluationOptions, RowEvaluation, RowFlag};
pub use holder::{HolderEvent, HolderOptions, ResourceHolder};
pub use language::LanguageHolder;
pub use locale::Locale;
pub use plan::{LanguageRef, SelectionScope, TranslatedText, TranslationConfig, TranslationPlan};
pub use search::{SearchField, SearchHit, SearchParams};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("key already exists: {0}")]
    DuplicateKey(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("resource keys must not be empty")]
    EmptyKey,

    #[error("language already exists: {0}")]
    LanguageAlreadyExists(String),

    #[error("language not found: {0}")]
    LanguageNotFound(String),

    #[error("not a valid language tag: {0:?}")]
    InvalidLocale(String),

    #[error("expected {expected} translated texts, got {actual}")]
    TranslationResultMismatch { expected: usize, actual: usize },

    #[error("{locale}: {source}")]
    Language {
        locale: Locale,
        #[source]
        source: Box<ResourceError>,
    },

    #[error("{}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}
