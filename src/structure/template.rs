use crate::structure::config::SectionKeys;
use crate::structure::config::SectionNames;
use crate::structure::normalize_key;
use crate::structure::SectionTag;
use serde::Serialize;

/// One expected `(tag, key)` slot and the rows it was found in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TemplateEntry {
    pub tag: SectionTag,
    pub key: String,
    /// Zero-based sheet rows; empty while unresolved
    pub rows: Vec<usize>,
    /// False when no header text is configured for the tag, so the
    /// section can never be detected and the key never resolved
    pub detectable: bool,
}

impl TemplateEntry {
    pub fn new(tag: SectionTag, key: impl Into<String>, detectable: bool) -> Self {
        Self {
            tag,
            key: key.into(),
            rows: Vec::new(),
            detectable,
        }
    }

    /// The single resolved row.
    pub fn row(&self) -> Option<usize> {
        match self.rows.as_slice() {
            [row] => Some(*row),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.row().is_some()
    }

    pub(crate) fn matches(&self, tag: &SectionTag, key: &str) -> bool {
        self.tag == *tag && normalize_key(&self.key) == normalize_key(key)
    }
}

/// Ordered list of template entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Template {
    entries: Vec<TemplateEntry>,
}

impl Template {
    pub fn new(entries: Vec<TemplateEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemplateEntry> {
        self.entries.iter()
    }

    /// Entry for a tag and key; the key is compared in normalized form.
    pub fn get(&self, tag: &SectionTag, key: &str) -> Option<&TemplateEntry> {
        self.entries.iter().find(|entry| entry.matches(tag, key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.entries.iter().filter(|entry| !entry.is_resolved())
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a TemplateEntry;
    type IntoIter = std::slice::Iter<'a, TemplateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Builds the unresolved template: one entry per configured key, tags in
/// declaration order. Never looks at a sheet.
pub fn create_template_structure(names: &SectionNames, keys: &SectionKeys) -> Template {
    let entries = keys
        .iter()
        .flat_map(|(tag, keys)| {
            let detectable = names.contains_tag(tag);
            keys.iter().map(move |key| TemplateEntry::new(tag.clone(), key.as_str(), detectable))
        })
        .collect();
    Template::new(entries)
}
