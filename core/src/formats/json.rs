/// JSON resource store
/// A flat object: `"Key": "value"`, `"Key": null` or
/// `"Key": { "value": "...", "comment": "..." }`. Key order is kept.
use super::{FileFormat, FormatError, ResourceStore};
use crate::backup::write_atomically;
use crate::resources::ResourceEntry;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
pub struct JsonStore {
    keep_backups: bool,
}

impl JsonStore {
    pub fn new(keep_backups: bool) -> Self {
        Self { keep_backups }
    }

    pub fn parse(&self, content: &str) -> Result<Vec<ResourceEntry>, FormatError> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(map) = value else {
            return Err(FormatError::Parse(
                "JSON resource root must be an object".into(),
            ));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let entry = match value {
                Value::Null => ResourceEntry::new(key, None, None),
                Value::String(text) => ResourceEntry::new(key, Some(text), None),
                Value::Object(fields) => {
                    let value = optional_string(&key, fields.get("value"))?;
                    let comment = optional_string(&key, fields.get("comment"))?;
                    ResourceEntry::new(key, value, comment)
                }
                other => {
                    return Err(FormatError::Parse(format!(
                        "unsupported value for key '{key}': {other}"
                    )))
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    }

    pub fn render(&self, entries: &[ResourceEntry]) -> Result<String, FormatError> {
        let mut map = Map::with_capacity(entries.len());
        for entry in entries {
            let value = match (&entry.value, &entry.comment) {
                (value, Some(comment)) => {
                    let mut fields = Map::new();
                    fields.insert(
                        "value".into(),
                        value.clone().map(Value::String).unwrap_or(Value::Null),
                    );
                    fields.insert("comment".into(), Value::String(comment.clone()));
                    Value::Object(fields)
                }
                (Some(value), None) => Value::String(value.clone()),
                (None, None) => Value::Null,
            };
            map.insert(entry.key.clone(), value);
        }
        let mut out = serde_json::to_string_pretty(&Value::Object(map))?;
        out.push('\n');
        Ok(out)
    }
}

fn optional_string(key: &str, value: Option<&Value>) -> Result<Option<String>, FormatError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(FormatError::Parse(format!(
            "expected string for key '{key}', found {other}"
        ))),
    }
}

impl ResourceStore for JsonStore {
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>, FormatError> {
        let content = fs::read_to_string(path)?;
        self.parse(&content)
    }

    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<(), FormatError> {
        let content = self.render(entries)?;
        write_atomically(path, content.as_bytes(), self.keep_backups)?;
        Ok(())
    }

    fn format(&self) -> FileFormat {
        FileFormat::Json
    }
}
