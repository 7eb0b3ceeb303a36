//! Conversions between Excel-style references ("B7", "A1:D1") and zero-based indexes.
use regex::Regex;
use serde::Serialize;
use std::fmt::Display;
use std::sync::OnceLock;

/// Zero-based coordinate of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Display for CellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", index_to_reference(self.row, self.col))
    }
}

/// Rectangular block of cells, both corners inclusive. Used for merged regions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CellRange {
    /// Top-left cell, the anchor of a merge
    pub first: CellPosition,
    /// Bottom-right cell
    pub last: CellPosition,
}

impl CellRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first: CellPosition::new(first_row.min(last_row), first_col.min(last_col)),
            last: CellPosition::new(first_row.max(last_row), first_col.max(last_col)),
        }
    }

    /// Parses "A1:C2" or a single "B4".
    pub fn parse(reference: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^\$?([A-Za-z]+)\$?(\d+)(?::\$?([A-Za-z]+)\$?(\d+))?$").expect("Hardcode regex pattern")
        });
        let captures = pattern.captures(reference.trim())?;
        let first_col = col_to_index(captures.get(1)?.as_str())?;
        let first_row = row_to_index(captures.get(2)?.as_str())?;
        let (last_row, last_col) = match (captures.get(3), captures.get(4)) {
            (Some(col), Some(row)) => (row_to_index(row.as_str())?, col_to_index(col.as_str())?),
            _ => (first_row, first_col),
        };
        Some(Self::new(first_row, first_col, last_row, last_col))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.first.row <= row && row <= self.last.row && self.first.col <= col && col <= self.last.col
    }

    pub fn is_anchor(&self, row: usize, col: usize) -> bool {
        self.first.row == row && self.first.col == col
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// Converts zero-based row & column indexes to an Excel-style reference.
///
/// # Arguments
///
/// * `row` - The 0-based row index
/// * `col` - The 0-based column index
///
/// # Returns
///
/// * `String` - Excel-style cell reference in upper case
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut reference = index_to_col(col);
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Column letters of a zero-based column index: 0 -> "A", 27 -> "AB".
pub fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    letters
}

/// Splits a reference like "AB12" into zero-based (row, col).
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters.trim_matches('$'))?))
}

/// Converts column letters ("A", "AB") to a zero-based index.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = (letter.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Converts a one-based row number ("12") to a zero-based index.
pub fn row_to_index(digits: &str) -> Option<usize> {
    digits.trim_start_matches('$').parse::<usize>().ok()?.checked_sub(1)
}
