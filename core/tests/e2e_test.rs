//! End-to-end tests for a resx project
//!
//! These tests walk the complete editing workflow on real files:
//! 1. Open a directory and group base files with their variants
//! 2. Edit keys and languages through the loader
//! 3. Translate missing cells (with a mocked provider)
//! 4. Save, reopen and check what landed on disk

use async_trait::async_trait;
use resx_translator_core::resources::RowFlag;
use resx_translator_core::{
    get_store, BatchConfig, BatchTranslator, CancelFlag, EditorSettings, EvaluationOptions,
    FileScanner, HolderOptions, LanguageRef, Locale, ProviderError, ResourceHolder,
    ResourceLoader, ScanConfig, SelectionScope, TranslatedText, TranslationConfig,
    TranslationProvider,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BASE_RESX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Hello</value>
    <comment>Shown on start</comment>
  </data>
  <data name="Farewell" xml:space="preserve">
    <value>Goodbye</value>
  </data>
  <data name="Version" xml:space="preserve">
    <value></value>
  </data>
  <data name="Logo" type="System.Drawing.Bitmap, System.Drawing" mimetype="application/x-microsoft.net.object.bytearray.base64">
    <value>iVBORw0KGgo=</value>
  </data>
</root>
"#;

const FRENCH_RESX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <data name="Greeting" xml:space="preserve">
    <value>Bonjour</value>
  </data>
</root>
"#;

/// Prefixes every text with the target code, like a translator that only
/// knows how to say "this is German".
struct PrefixProvider;

#[async_trait]
impl TranslationProvider for PrefixProvider {
    fn name(&self) -> &'static str {
        "prefix"
    }

    async fn list_supported_languages(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["en".into(), "fr".into(), "de".into()])
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source: &str,
        target: &str,
    ) -> Result<Vec<TranslatedText>, ProviderError> {
        Ok(texts
            .iter()
            .map(|text| TranslatedText::new(format!("[{target}] {text}")))
            .collect())
    }
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let props = dir.path().join("Properties");
    fs::create_dir_all(&props).unwrap();
    fs::write(props.join("Strings.resx"), BASE_RESX).unwrap();
    fs::write(props.join("Strings.fr.resx"), FRENCH_RESX).unwrap();
    fs::create_dir_all(dir.path().join("bin")).unwrap();
    fs::write(dir.path().join("bin").join("Strings.resx"), BASE_RESX).unwrap();
    dir
}

fn locale(tag: &str) -> Locale {
    Locale::parse(tag).unwrap()
}

fn read(dir: &Path, relative: &str) -> String {
    fs::read_to_string(dir.join(relative)).unwrap()
}

const ID: &str = "Properties/Strings.resx";

#[test]
fn test_e2e_open_and_flag_missing_translations() {
    let dir = project();
    let mut loader = ResourceLoader::from_settings(&EditorSettings::default());
    loader.open_project(dir.path()).unwrap();

    // bin/ is skipped by the default ignore patterns
    assert_eq!(loader.resources().len(), 1);
    let fr = locale("fr");
    loader.evaluate_all(&[fr.clone()], EvaluationOptions::default());

    let strings = loader.resource(ID).unwrap();
    assert_eq!(strings.keys().collect::<Vec<_>>(), ["Greeting", "Farewell", "Version"]);
    assert_eq!(strings.row_flag("Greeting", &fr), Some(RowFlag::Default));
    assert_eq!(strings.row_flag("Farewell", &fr), Some(RowFlag::Missing));
    assert_eq!(strings.row_flag("Version", &fr), Some(RowFlag::NotTranslatable));
    assert_eq!(strings.evaluation().count(&fr, RowFlag::Missing), 1);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_translate_save_and_reopen() {
    let dir = project();
    let settings = EditorSettings::default();
    let mut loader = ResourceLoader::from_settings(&settings);
    loader.open_project(dir.path()).unwrap();
    let root = loader.opened_path().unwrap().to_path_buf();

    // 1. Structural edits
    loader
        .edit_resource(ID, |holder| {
            holder.add_key("Title", Some("Welcome".into()), Some("Window title".into()))?;
            holder.rename_key("Farewell", "Goodbye")?;
            holder.add_language(&locale("de"), settings.add_default_values_on_language_add)?;
            Ok::<_, resx_translator_core::ResourceError>(())
        })
        .unwrap()
        .unwrap();
    let used: Vec<String> = loader.get_used_languages().iter().map(|l| l.to_string()).collect();
    assert_eq!(used, ["de", "fr"]);

    // 2. Translate every missing German cell
    let translator = BatchTranslator::new(
        Arc::new(PrefixProvider),
        BatchConfig {
            batch_size: 2,
            inter_batch_delay: Duration::from_secs(5),
        },
    );
    let config = TranslationConfig::new(
        LanguageRef::Default,
        LanguageRef::Locale(locale("de")),
        SelectionScope::AllMissing,
    );
    let plan = loader
        .resource(ID)
        .unwrap()
        .get_text_for_translating(&config)
        .unwrap()
        .unwrap();
    assert_eq!(plan.keys(), ["Greeting", "Goodbye", "Title"]);

    let run = translator
        .translate(plan.texts().to_vec(), "en", "de", &CancelFlag::new(), None)
        .await
        .unwrap();
    assert_eq!(run.chunks().len(), 2);
    let results = run.complete_results().unwrap();
    loader
        .edit_resource(ID, |holder| holder.set_translated_text(&plan, &results))
        .unwrap()
        .unwrap();

    // 3. Save and check the files
    assert!(loader.is_dirty());
    assert_eq!(loader.save_all().unwrap(), 1);
    assert!(!loader.is_dirty());

    let base = read(&root, "Properties/Strings.resx");
    assert!(base.contains(r#"<data name="Title" xml:space="preserve">"#));
    assert!(base.contains("<comment>Window title</comment>"));
    assert!(base.contains(r#"name="Logo""#), "typed data survives a save");
    assert!(base.contains("iVBORw0KGgo="));
    let german = read(&root, "Properties/Strings.de.resx");
    assert!(german.contains("<value>[de] Hello</value>"));
    assert!(german.contains("<value>[de] Welcome</value>"));

    // 4. Reopen from disk
    loader.reload().unwrap();
    let strings = loader.resource(ID).unwrap();
    let de = strings.language(&locale("de")).unwrap().entries();
    assert_eq!(de.value("Goodbye"), Some("[de] Goodbye"));
    assert_eq!(de.value("Version"), None);
    let fr = strings.language(&locale("fr")).unwrap().entries();
    assert_eq!(fr.value("Greeting"), Some("Bonjour"));
    assert_eq!(fr.value("Title"), None);
    assert!(!loader.is_dirty());
}

#[tokio::test]
async fn test_e2e_translate_resource_in_one_step() {
    let dir = project();
    let groups = FileScanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let group = groups.into_iter().find(|g| g.id == ID).unwrap();
    let mut holder = ResourceHolder::load(
        group.id,
        group.base_path,
        group.base_exists,
        group.variants,
        get_store(group.format, false).unwrap(),
        HolderOptions::default(),
    )
    .unwrap();
    let translator = BatchTranslator::new(Arc::new(PrefixProvider), BatchConfig::default());
    let config = TranslationConfig::new(
        LanguageRef::Default,
        LanguageRef::Locale(locale("fr")),
        SelectionScope::AllMissing,
    );

    let outcome = translator
        .translate_resource(&mut holder, &config, &CancelFlag::new(), None)
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.plan.keys(), ["Farewell"]);
    holder.save().unwrap();
    let french = read(dir.path(), "Properties/Strings.fr.resx");
    assert!(french.contains("<value>[fr] Goodbye</value>"));
    assert!(french.contains("<value>Bonjour</value>"));
}

#[test]
fn test_e2e_export_and_discard() {
    let dir = project();
    let mut loader = ResourceLoader::default();
    loader.open_project(dir.path()).unwrap();

    loader
        .edit_resource(ID, |holder| holder.delete_key("Greeting"))
        .unwrap()
        .unwrap();
    let out = TempDir::new().unwrap();
    let summary = loader.export_zip(&out.path().join("export.zip")).unwrap();
    assert_eq!(
        summary.entries,
        ["Properties/Strings.fr.resx", "Properties/Strings.resx"]
    );

    loader.discard_changes();
    assert!(!loader.is_dirty());
    assert!(loader.resource(ID).unwrap().keys().any(|key| key == "Greeting"));
}
