use crate::spreadsheet::grid::GridAccessor;
use crate::structure::config::SectionNames;
use crate::structure::layout::SheetLayout;
use crate::structure::SectionTag;
use crate::structure::UNTAGGED;
use serde::Serialize;
use std::ops::Range;

/// Contiguous run of rows opened by a header row (or the rows before the first header).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionBlock {
    /// Configured tag of the header text; `None` for UNTAGGED blocks
    pub tag: Option<SectionTag>,
    /// Trimmed header text; `None` for the leading block without a header
    pub title: Option<String>,
    /// Header rows, normally a single row. Empty for the leading block.
    pub header: Range<usize>,
    /// All rows of the block, header included
    pub rows: Range<usize>,
}

impl SectionBlock {
    pub fn is_tagged_with(&self, tag: &SectionTag) -> bool {
        self.tag.as_ref() == Some(tag)
    }

    /// Rows below the header, the only rows keys are searched in.
    pub fn data_rows(&self) -> Range<usize> {
        self.header.end..self.rows.end
    }

    pub fn tag_name(&self) -> &str {
        self.tag.as_ref().map(SectionTag::as_str).unwrap_or(UNTAGGED)
    }
}

/// Header predicate: non-empty after trimming, at least one uppercase letter,
/// no lowercase letter. Digits, punctuation and dashes are ignored, so
/// `"STACJA ŁADOWANIA - DANE"` is a header while `"12"` and `"Model"` are not.
pub fn is_header_text(text: &str) -> bool {
    let text = text.trim();
    let mut has_uppercase = false;
    for character in text.chars() {
        if character.is_lowercase() {
            return false;
        }
        if character.is_uppercase() {
            has_uppercase = true;
        }
    }
    has_uppercase
}

/// True when the section cell of `row` holds header text.
/// Only text cells qualify; a boolean rendered as `TRUE` is not a header.
pub fn is_header_row<G: GridAccessor + ?Sized>(grid: &G, layout: &SheetLayout, row: usize) -> bool {
    grid.value(row, layout.section_column)
        .as_text()
        .map(is_header_text)
        .unwrap_or(false)
}

/// Partitions the grid into section blocks.
///
/// Every header row opens a block that runs until the next header row or the
/// end of the grid. Rows above the first header form a leading UNTAGGED block,
/// and a sheet without any header is one UNTAGGED block. A header cell merged
/// vertically over several rows yields one block whose header spans those rows.
pub fn detect_sections<G: GridAccessor + ?Sized>(
    grid: &G,
    layout: &SheetLayout,
    names: &SectionNames,
) -> Vec<SectionBlock> {
    let row_count = grid.row_count();
    let col = layout.section_column;
    let mut blocks: Vec<SectionBlock> = Vec::new();

    for row in 0..row_count {
        if !is_header_row(grid, layout, row) {
            continue;
        }

        let continues_header = grid.merge_span(row, col)
            .filter(|span| span.first.row < row)
            .zip(blocks.last())
            .map(|(span, last)| last.header.contains(&span.first.row) && last.header.end == row)
            .unwrap_or(false);
        if continues_header {
            if let Some(last) = blocks.last_mut() {
                last.header.end = row + 1;
            }
            continue;
        }

        match blocks.last_mut() {
            Some(last) => last.rows.end = row,
            None if row > 0 => blocks.push(SectionBlock {
                tag: None,
                title: None,
                header: 0..0,
                rows: 0..row,
            }),
            None => (),
        }

        let title = grid.value(row, col).as_text().map(|text| text.trim().to_owned());
        let tag = title.as_deref().and_then(|title| names.tag_for(title)).cloned();
        blocks.push(SectionBlock {
            tag,
            title,
            header: row..row + 1,
            rows: row..row_count,
        });
    }

    if blocks.is_empty() && row_count > 0 {
        blocks.push(SectionBlock {
            tag: None,
            title: None,
            header: 0..0,
            rows: 0..row_count,
        });
    }
    blocks
}
