use crate::spreadsheet::grid::GridAccessor;
use crate::structure::layout::SheetLayout;
use crate::structure::normalize_key;
use crate::structure::section::is_header_row;
use crate::structure::section::SectionBlock;
use crate::structure::template::Template;
use crate::structure::template::TemplateEntry;
use crate::structure::SectionTag;
use crate::structure::StructureError;

/// Resolves every template entry against the sections of one sheet.
///
/// A key is searched only in the data rows of blocks carrying its tag; all
/// such blocks are searched, so repeated sub-sections share one scope. No
/// match leaves the entry unresolved, two or more fail the whole pass.
/// The input template is left untouched.
pub fn compare_structure_with_file<G: GridAccessor + ?Sized>(
    template: &Template,
    grid: &G,
    sections: &[SectionBlock],
    layout: &SheetLayout,
) -> Result<Template, StructureError> {
    let mut entries = Vec::with_capacity(template.len());
    for entry in template {
        let rows = find_rows_for_key(grid, sections, layout, &entry.tag, &entry.key);
        if rows.len() > 1 {
            return Err(StructureError::AmbiguousKey {
                tag: entry.tag.clone(),
                key: entry.key.clone(),
                rows,
            });
        }
        match rows.first() {
            Some(row) => log::trace!("Resolved '{}' in section {} to row {}", entry.key, entry.tag, row + 1),
            None => log::debug!("Key '{}' not found in section {}", entry.key, entry.tag),
        }
        entries.push(TemplateEntry {
            rows,
            ..entry.clone()
        });
    }
    Ok(Template::new(entries))
}

/// Every data row of the blocks tagged `tag` whose key cell matches `key`.
pub fn find_rows_for_key<G: GridAccessor + ?Sized>(
    grid: &G,
    sections: &[SectionBlock],
    layout: &SheetLayout,
    tag: &SectionTag,
    key: &str,
) -> Vec<usize> {
    let key = normalize_key(key);
    if key.is_empty() {
        return Vec::new();
    }
    sections
        .iter()
        .filter(|block| block.is_tagged_with(tag))
        .flat_map(|block| block.data_rows())
        .filter(|row| key_matches(grid, layout, *row, &key))
        .collect()
}

/// First row anywhere in the sheet whose key cell matches `key`, header rows
/// excluded. Useful for forms whose sections are not configured.
pub fn find_row_for_key<G: GridAccessor + ?Sized>(grid: &G, layout: &SheetLayout, key: &str) -> Option<usize> {
    let key = normalize_key(key);
    if key.is_empty() {
        return None;
    }
    (0..grid.row_count())
        .filter(|row| !is_header_row(grid, layout, *row))
        .find(|row| key_matches(grid, layout, *row, &key))
}

fn key_matches<G: GridAccessor + ?Sized>(grid: &G, layout: &SheetLayout, row: usize, normalized: &str) -> bool {
    let col = layout.key_column;
    // A tall key cell matches on its first row only
    if grid.merge_span(row, col).map(|span| span.first.row < row).unwrap_or(false) {
        return false;
    }
    grid.text(row, col)
        .map(|text| normalize_key(&text) == normalized)
        .unwrap_or(false)
}
