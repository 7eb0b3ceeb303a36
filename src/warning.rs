//! Non-fatal findings collected while reading a form.
use crate::spreadsheet::reference::index_to_col;
use crate::structure::SectionTag;
use serde::Serialize;
use std::fmt::Display;

/// Something worth telling the caller that does not stop extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Workbook holds more than one worksheet; only `processed` is read
    MultipleWorksheets { count: usize, processed: String },
    /// Keys are configured for a tag that has no header names, so they can never resolve
    UnconfiguredSection { tag: SectionTag },
    /// Header row whose text matches no configured section name (zero-based row)
    UntaggedSection { row: usize, title: String },
    /// Entity column dropped for holding too few values (zero-based column)
    SparseEntity { column: usize, values: usize, minimum: usize },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MultipleWorksheets { count, processed } => {
                write!(f, "Workbook contains {count} worksheets, only '{processed}' is processed")
            }
            Warning::UnconfiguredSection { tag } => {
                write!(f, "Section '{tag}' has keys but no header names")
            }
            Warning::UntaggedSection { row, title } => {
                write!(f, "Header '{title}' in row {} matches no configured section", row + 1)
            }
            Warning::SparseEntity { column, values, minimum } => write!(
                f,
                "Column {} dropped: {values} values, at least {minimum} required",
                index_to_col(*column)
            ),
        }
    }
}

/// Collects warnings in the order raised, logging each one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.items.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_warnings() {
        let warning = Warning::SparseEntity { column: 27, values: 2, minimum: 4 };
        assert_eq!(warning.to_string(), "Column AB dropped: 2 values, at least 4 required");

        let warning = Warning::UntaggedSection { row: 9, title: "UWAGI".to_owned() };
        assert_eq!(warning.to_string(), "Header 'UWAGI' in row 10 matches no configured section");

        let warning = Warning::MultipleWorksheets { count: 3, processed: "Arkusz1".to_owned() };
        assert_eq!(warning.to_string(), "Workbook contains 3 worksheets, only 'Arkusz1' is processed");
    }

    #[test]
    fn keeps_order() {
        let mut warnings = Warnings::new();
        warnings.push(Warning::UnconfiguredSection { tag: SectionTag::from("A") });
        warnings.push(Warning::UnconfiguredSection { tag: SectionTag::from("B") });
        let tags: Vec<String> = warnings
            .iter()
            .map(|warning| match warning {
                Warning::UnconfiguredSection { tag } => tag.to_string(),
                other => other.to_string(),
            })
            .collect();
        assert_eq!(tags, vec!["A", "B"]);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn extend_appends_after_existing() {
        let mut warnings = Warnings::new();
        warnings.push(Warning::UnconfiguredSection { tag: SectionTag::from("A") });
        let mut later = Warnings::new();
        later.push(Warning::UntaggedSection { row: 3, title: "UWAGI".to_owned() });
        later.push(Warning::UnconfiguredSection { tag: SectionTag::from("B") });
        warnings.extend(later);
        assert_eq!(
            warnings.into_vec(),
            vec![
                Warning::UnconfiguredSection { tag: SectionTag::from("A") },
                Warning::UntaggedSection { row: 3, title: "UWAGI".to_owned() },
                Warning::UnconfiguredSection { tag: SectionTag::from("B") },
            ]
        );
        assert!(Warnings::new().is_empty());
    }
}
