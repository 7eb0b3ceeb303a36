//! Caller-supplied configuration: which header texts name which section, and
//! which keys each section is expected to hold.
use crate::error::FormError;
use crate::error::ResultMessage;
use crate::structure::layout::SheetLayout;
use crate::structure::normalize_key;
use crate::structure::SectionTag;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Section tag '{0}' is declared more than once")]
    DuplicateTagError(String),

    #[error("Section tag must not be empty")]
    EmptyTagError,
}

/// Tag -> ordered list of literal header texts accepted for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionNames {
    entries: Vec<(SectionTag, Vec<String>)>,
}

impl SectionNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds header texts for a tag, appending when the tag is already known.
    pub fn with<S: AsRef<str>>(mut self, tag: impl Into<SectionTag>, headers: &[S]) -> Self {
        let tag = tag.into();
        let headers = headers.iter().map(|header| header.as_ref().trim().to_owned());
        match self.entries.iter_mut().find(|(known, _)| *known == tag) {
            Some((_, known)) => known.extend(headers),
            None => self.entries.push((tag, headers.collect())),
        }
        self
    }

    /// First tag, in declaration order, listing `header` (trimmed, case-sensitive).
    pub fn tag_for(&self, header: &str) -> Option<&SectionTag> {
        let header = header.trim();
        self.entries
            .iter()
            .find(|(_, headers)| headers.iter().any(|known| known == header))
            .map(|(tag, _)| tag)
    }

    pub fn contains_tag(&self, tag: &SectionTag) -> bool {
        self.entries.iter().any(|(known, _)| known == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionTag, &[String])> {
        self.entries.iter().map(|(tag, headers)| (tag, headers.as_slice()))
    }
}

/// Tag -> ordered set of keys expected under it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionKeys {
    entries: Vec<(SectionTag, Vec<String>)>,
}

impl SectionKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds keys for a tag. Keys equal after normalization are kept once, first wins.
    pub fn with<S: AsRef<str>>(mut self, tag: impl Into<SectionTag>, keys: &[S]) -> Self {
        let tag = tag.into();
        let index = match self.entries.iter().position(|(known, _)| *known == tag) {
            Some(index) => index,
            None => {
                self.entries.push((tag, Vec::new()));
                self.entries.len() - 1
            }
        };
        let known = &mut self.entries[index].1;
        for key in keys {
            let key = key.as_ref().trim();
            let normalized = normalize_key(key);
            if !normalized.is_empty() && !known.iter().any(|existing| normalize_key(existing) == normalized) {
                known.push(key.to_owned());
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionTag, &[String])> {
        self.entries.iter().map(|(tag, keys)| (tag, keys.as_slice()))
    }
}

/// One section as written in a configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub tag: SectionTag,
    /// Literal header texts that open this section
    #[serde(default)]
    pub headers: Vec<String>,
    /// Keys expected under this section, in output order
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Full configuration of an extraction run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub sections: Vec<SectionDefinition>,
    /// Column layout; detected from the sheet when absent
    #[serde(default)]
    pub layout: Option<SheetLayout>,
    /// Entity columns with fewer non-empty values are dropped; 0 keeps all
    #[serde(default)]
    pub minimum_entity_values: usize,
}

impl Configuration {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, FormError> {
        let configuration: Configuration = serde_json::from_str(json)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).with_prefix(&path.display().to_string())
    }

    /// Rejects empty and repeated tags.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.tag.as_str().trim().is_empty() {
                return Err(ConfigError::EmptyTagError);
            }
            if !seen.insert(&section.tag) {
                return Err(ConfigError::DuplicateTagError(section.tag.to_string()));
            }
        }
        Ok(())
    }

    /// Mapping consumed by the section detector.
    pub fn section_names(&self) -> SectionNames {
        self.sections
            .iter()
            .filter(|section| !section.headers.is_empty())
            .fold(SectionNames::new(), |names, section| names.with(section.tag.clone(), &section.headers))
    }

    /// Mapping consumed by the template builder.
    pub fn section_keys(&self) -> SectionKeys {
        self.sections
            .iter()
            .fold(SectionKeys::new(), |keys, section| keys.with(section.tag.clone(), &section.keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JSON: &str = r#"{
        "sections": [
            { "tag": "TAKEOVER_DIVIDER",
              "headers": ["STACJA ŁADOWANIA – DANE", "STACJA ŁADOWANIA – PODSTAWOWE DANE"],
              "keys": ["Model", "Numer seryjny", " model "] },
            { "tag": "CONTACT_PERSON",
              "headers": ["OSOBA KONTAKTOWA - EKSPOLATACJA STACJI"],
              "keys": ["Imię i nazwisko"] },
            { "tag": "NOTES" }
        ],
        "minimum_entity_values": 4
    }"#;

    #[test]
    fn parses_json_configuration() {
        let configuration = Configuration::from_json_str(JSON).unwrap();
        assert_eq!(configuration.sections.len(), 3);
        assert_eq!(configuration.layout, None);
        assert_eq!(configuration.minimum_entity_values, 4);

        let names = configuration.section_names();
        assert_eq!(
            names.tag_for(" STACJA ŁADOWANIA – PODSTAWOWE DANE "),
            Some(&SectionTag::from("TAKEOVER_DIVIDER"))
        );
        assert!(!names.contains_tag(&SectionTag::from("NOTES")));

        let keys: Vec<(String, Vec<String>)> = configuration
            .section_keys()
            .iter()
            .map(|(tag, keys)| (tag.to_string(), keys.to_vec()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("TAKEOVER_DIVIDER".to_owned(), vec!["Model".to_owned(), "Numer seryjny".to_owned()]),
                ("CONTACT_PERSON".to_owned(), vec!["Imię i nazwisko".to_owned()]),
                ("NOTES".to_owned(), vec![]),
            ]
        );
    }

    #[test]
    fn parses_explicit_layout() {
        let json = r#"{ "sections": [], "layout": { "section_column": 1, "key_column": 1, "first_entity_column": 2 } }"#;
        let configuration = Configuration::from_json_str(json).unwrap();
        assert_eq!(
            configuration.layout,
            Some(SheetLayout { section_column: 1, key_column: 1, first_entity_column: 2 })
        );
    }

    #[test]
    fn rejects_duplicate_tags() {
        let json = r#"{ "sections": [ { "tag": "A" }, { "tag": "A" } ] }"#;
        let error = Configuration::from_json_str(json).unwrap_err();
        assert!(matches!(error, FormError::ConfigError(ConfigError::DuplicateTagError(tag)) if tag == "A"));
    }

    #[test]
    fn rejects_empty_tags() {
        let json = r#"{ "sections": [ { "tag": " " } ] }"#;
        assert!(matches!(
            Configuration::from_json_str(json),
            Err(FormError::ConfigError(ConfigError::EmptyTagError))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Configuration::from_json_str("{"), Err(FormError::JsonError(_))));
    }

    #[test]
    fn header_lookup_is_case_sensitive() {
        let names = SectionNames::new().with("A", &["DANE"]);
        assert_eq!(names.tag_for("DANE"), Some(&SectionTag::from("A")));
        assert_eq!(names.tag_for("Dane"), None);
    }

    #[test]
    fn first_declared_tag_wins() {
        let names = SectionNames::new().with("A", &["DANE"]).with("B", &["DANE"]);
        assert_eq!(names.tag_for("DANE"), Some(&SectionTag::from("A")));
    }
}
