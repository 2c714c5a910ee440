use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

use super::ResourceError;

/// Shape of a culture suffix in a file name (`fr`, `fr-FR`, `zh-Hans-CN`).
/// Keeps `Strings.Designer` from being read as an 8-letter language.
static LOCALE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})*$").expect("valid locale shape regex")
});

/// ISO 639-1 codes plus the three-letter languages that ship as .NET
/// cultures. A file suffix such as `UI` or `Api` is shaped like a tag but is
/// not a language. Sorted for `binary_search`.
const KNOWN_LANGUAGES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "arn", "as", "ast", "av", "ay", "az",
    "ba", "be", "bg", "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "chr",
    "ckb", "co", "cr", "cs", "cu", "cv", "cy", "da", "de", "dsb", "dv", "dz", "ee", "el",
    "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fil", "fj", "fo", "fr", "fy", "ga",
    "gd", "gl", "gn", "gsw", "gu", "gv", "ha", "haw", "he", "hi", "ho", "hr", "hsb", "ht",
    "hu", "hy", "hz", "ia", "ibb", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu",
    "ja", "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kok", "kr", "ks",
    "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg",
    "mh", "mi", "mk", "ml", "mn", "mni", "moh", "mr", "ms", "mt", "my", "na", "nb", "nd",
    "ne", "ng", "nl", "nn", "no", "nqo", "nr", "nso", "nv", "ny", "oc", "oj", "om", "or",
    "os", "pa", "pi", "pl", "prs", "ps", "pt", "qu", "quc", "quz", "rm", "rn", "ro", "ru",
    "rw", "sa", "sah", "sat", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sma", "smj",
    "smn", "sms", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "syr", "ta", "te",
    "tg", "th", "ti", "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "tzm", "ug",
    "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi", "yo", "yue", "za", "zgh",
    "zh", "zu",
];

fn is_known_language(language: &str) -> bool {
    KNOWN_LANGUAGES.binary_search(&language).is_ok()
}

/// Canonical language tag of a resource variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(tag: &str) -> Result<Self, ResourceError> {
        let trimmed = tag.trim();
        if !LOCALE_SHAPE.is_match(trimmed) {
            return Err(ResourceError::InvalidLocale(tag.to_string()));
        }
        let langid = LanguageIdentifier::from_str(&trimmed.replace('_', "-"))
            .map_err(|_| ResourceError::InvalidLocale(tag.to_string()))?;
        let canonical = langid.to_string();
        let language = canonical.split('-').next().unwrap_or_default();
        if !is_known_language(language) {
            return Err(ResourceError::InvalidLocale(tag.to_string()));
        }
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, `fr` for `fr-FR`.
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = ResourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}
