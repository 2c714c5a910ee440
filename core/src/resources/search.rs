use serde::{Deserialize, Serialize};

use super::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Key,
    Value,
    Comment,
}

/// Find-in-project query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub text: String,
    #[serde(default)]
    pub match_case: bool,
    #[serde(default = "default_true")]
    pub in_keys: bool,
    #[serde(default = "default_true")]
    pub in_values: bool,
    #[serde(default)]
    pub in_comments: bool,
}

fn default_true() -> bool {
    true
}

impl SearchParams {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            match_case: false,
            in_keys: true,
            in_values: true,
            in_comments: false,
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        if self.text.is_empty() {
            return false;
        }
        if self.match_case {
            haystack.contains(&self.text)
        } else {
            haystack.to_lowercase().contains(&self.text.to_lowercase())
        }
    }
}

/// One matching cell. `language` is `None` for the base file and for keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub key: String,
    pub language: Option<Locale>,
    pub field: SearchField,
}
