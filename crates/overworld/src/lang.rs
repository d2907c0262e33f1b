use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Resolves localization keys against the active language.
pub trait Localizer {
    fn language(&self) -> &str;
    fn resolve(&self, key: &str) -> String;
}

/// Per-language key→text tables with one active language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringTable {
    #[serde(default)]
    active: String,
    languages: HashMap<String, HashMap<String, String>>,
}

impl StringTable {
    pub fn new(active: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            languages: HashMap::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn insert(
        &mut self,
        language: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.languages
            .entry(language.into())
            .or_default()
            .insert(key.into(), text.into());
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Switches the active language. Unknown languages are refused.
    pub fn set_language(&mut self, language: &str) -> bool {
        if !self.has_language(language) {
            warn!(language, "unknown_language");
            return false;
        }
        self.active = language.to_string();
        info!(language, "language_changed");
        true
    }
}

impl Localizer for StringTable {
    fn language(&self) -> &str {
        &self.active
    }

    fn resolve(&self, key: &str) -> String {
        match self
            .languages
            .get(&self.active)
            .and_then(|table| table.get(key))
        {
            Some(text) => text.clone(),
            None => {
                warn!(language = %self.active, key, "missing_localized_string");
                key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> StringTable {
        let mut table = StringTable::new("en");
        table.insert("en", "npc.hello", "Hello!");
        table.insert("fr", "npc.hello", "Bonjour !");
        table
    }

    #[test]
    fn resolves_against_active_language() {
        let mut table = sample_table();
        assert_eq!(table.resolve("npc.hello"), "Hello!");
        assert!(table.set_language("fr"));
        assert_eq!(table.resolve("npc.hello"), "Bonjour !");
    }

    #[test]
    fn unknown_language_keeps_current() {
        let mut table = sample_table();
        assert!(!table.set_language("de"));
        assert_eq!(table.language(), "en");
    }

    #[test]
    fn missing_key_falls_back_to_key_text() {
        let table = sample_table();
        assert_eq!(table.resolve("npc.unknown"), "npc.unknown");
    }

    #[test]
    fn decodes_from_json() {
        let table = StringTable::from_json_str(
            r#"{"active": "en", "languages": {"en": {"a": "A"}}}"#,
        )
        .expect("table");
        assert_eq!(table.resolve("a"), "A");
    }
}
