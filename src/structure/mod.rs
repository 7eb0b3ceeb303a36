//! # Structure Module
//!
//! The section-aware template engine. Given a worksheet grid it
//!
//! 1. decides which columns hold section headers, keys and entities ([`layout`]),
//! 2. partitions the rows into section blocks ([`section`]),
//! 3. projects the configuration into a template of expected keys ([`template`]),
//! 4. resolves every template key to the row it occupies in this file ([`resolver`]),
//! 5. reads one record per entity column ([`extractor`]).
//!
//! All functions here are pure: they read the grid and configuration and
//! return new values.
pub mod config;
pub mod extractor;
pub mod layout;
pub mod resolver;
pub mod section;
pub mod template;

use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Canonical identifier of a logical section, e.g. `CONTACT_PERSON`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionTag(String);

impl SectionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SectionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_owned())
    }
}

/// Label used wherever a block without a configured tag has to be shown.
pub const UNTAGGED: &str = "UNTAGGED";

/// Errors raised by the structure engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Two or more rows in the scope of one section carry the same key.
    /// Rows are zero-based; the message shows sheet row numbers.
    #[error("Key '{key}' in section '{tag}' is ambiguous: found in sheet rows {}", sheet_rows(.rows))]
    AmbiguousKey {
        tag: SectionTag,
        key: String,
        rows: Vec<usize>,
    },
}

fn sheet_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|row| (row + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comparison form of a key: whitespace runs collapsed, trimmed, lowercased.
pub(crate) fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
