pub mod backup;
pub mod config;
pub mod events;
pub mod export;
pub mod formats;
pub mod loader;
pub mod resources;
pub mod scanner;
pub mod translate;

pub use config::{EditorSettings, IgnoreOptions, SettingsError, TranslationSettings};
pub use export::{ExportError, ExportSummary};
pub use formats::{get_store, FileFormat, FormatError, ResourceStore};
pub use loader::{LoadFailure, LoaderError, LoaderEvent, ProjectHit, ResourceFilter, ResourceLoader};
pub use resources::{
    EvaluationOptions, HolderEvent, HolderOptions, LanguageHolder, LanguageRef, Locale,
    ResourceEntry, ResourceEntrySet, ResourceError, ResourceHolder, RowFlag, SearchParams,
    SelectionScope, TranslatedText, TranslationConfig, TranslationPlan,
};
pub use scanner::{FileScanner, ResourceGroup, ScanConfig};
pub use translate::{
    BatchConfig, BatchEvent, BatchRun, BatchTranslator, CancelFlag, GoogleTranslateClient,
    ProviderError, TranslationError, TranslationProvider,
};
