use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::grid::GridAccessor;
use crate::structure::section::is_header_text;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::sync::OnceLock;

/// Which zero-based columns of a sheet hold section headers, keys and entities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Column scanned for uppercase section headers
    pub section_column: usize,
    /// Column holding the keys
    pub key_column: usize,
    /// First entity (station) column; every column from here on is one entity
    pub first_entity_column: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            section_column: 0,
            key_column: 1,
            first_entity_column: 2,
        }
    }
}

impl SheetLayout {
    /// Detects the layout of a sheet.
    ///
    /// Without an auxiliary numbering column the default layout applies. When
    /// the first column only holds ordinals (`1`, `2.`, `Lp`, ...) everything
    /// moves one column to the right. Only numbered rows decide where the keys
    /// are: they either share the header column (forms that list headers and
    /// keys under one another) or sit right after it. Titles and other
    /// unnumbered rows never take part.
    pub fn detect<G: GridAccessor + ?Sized>(grid: &G) -> Self {
        if !is_numbering_column(grid, 0) {
            return Self::default();
        }
        let section_column = 1;
        let mut shared = 0usize;
        let mut shifted = 0usize;
        for row in (0..grid.row_count()).filter(|row| !grid.value(*row, 0).is_empty()) {
            let beside = grid.value(row, section_column);
            match beside.as_text() {
                Some(text) if is_header_text(text) => (),
                _ if !beside.is_empty() => shared += 1,
                _ if !grid.value(row, section_column + 1).is_empty() => shifted += 1,
                _ => (),
            }
        }
        let key_column = if shared > shifted { section_column } else { section_column + 1 };
        Self {
            section_column,
            key_column,
            first_entity_column: key_column + 1,
        }
    }
}

/// True when the column has at least one value and every value is an ordinal.
pub fn is_numbering_column<G: GridAccessor + ?Sized>(grid: &G, col: usize) -> bool {
    let mut values = (0..grid.row_count())
        .map(|row| grid.value(row, col))
        .filter(|value| !value.is_empty())
        .peekable();
    values.peek().is_some() && values.all(is_ordinal)
}

/// Ordinal number or numbering-column label ("Lp", "Nr", "No.", "#").
pub fn is_ordinal(value: &CellValue) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    match value {
        CellValue::Number(number) => number.fract() == 0.0 && *number >= 0.0,
        CellValue::Text(text) => PATTERN
            .get_or_init(|| Regex::new(r"(?i)^(\d+[.)]?|l\.?\s?p\.?|nr\.?|no\.?|#)$").expect("Hardcode regex pattern"))
            .is_match(text.trim()),
        _ => false,
    }
}
