use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::CellRange;

static EMPTY: CellValue = CellValue::Empty;

/// Read-only view of a worksheet as a zero-based grid.
///
/// Non-anchor cells of a merged region report the anchor's value, so callers
/// that need to tell the two apart use [`GridAccessor::is_merge_anchor`] and
/// [`GridAccessor::merge_span`] explicitly.
pub trait GridAccessor {
    /// Merge-resolved value at (row, col); `Empty` outside the grid.
    fn value(&self, row: usize, col: usize) -> &CellValue;

    /// True when (row, col) is the top-left cell of a merged region.
    fn is_merge_anchor(&self, row: usize, col: usize) -> bool;

    /// The merged region covering (row, col), if any.
    fn merge_span(&self, row: usize, col: usize) -> Option<CellRange>;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// True when (row, col) is covered by a merge but is not its anchor.
    fn is_merge_continuation(&self, row: usize, col: usize) -> bool {
        self.merge_span(row, col)
            .map(|span| !span.is_anchor(row, col))
            .unwrap_or(false)
    }

    /// Trimmed display text of a non-empty cell.
    fn text(&self, row: usize, col: usize) -> Option<String> {
        let value = self.value(row, col);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string().trim().to_owned())
        }
    }
}

/// In-memory worksheet snapshot. Rows are stored ragged; cells past the end
/// of a row read as `Empty`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<CellValue>>,
    merges: Vec<CellRange>,
}

impl Grid {
    /// Creates a blank grid of the given size.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: Vec::with_capacity(rows),
            merges: Vec::new(),
        }
    }

    /// Builds a grid from ragged rows.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows: rows.len(),
            cols: rows.iter().map(Vec::len).max().unwrap_or(0),
            cells: rows,
            merges: Vec::new(),
        }
    }

    /// Builds a text-only grid; empty strings become `Empty` cells.
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        Self::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|text| CellValue::from(*text)).collect())
                .collect(),
        )
    }

    /// Stores a value, growing the grid when the position lies outside it.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if row >= self.cells.len() {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if col >= cells.len() {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
    }

    /// Registers a merged region; the grid bounds grow to contain it.
    pub fn add_merge(&mut self, range: CellRange) {
        self.rows = self.rows.max(range.last.row + 1);
        self.cols = self.cols.max(range.last.col + 1);
        self.merges.push(range);
    }

    /// Builder-style variant of [`Grid::add_merge`].
    pub fn with_merge(mut self, range: CellRange) -> Self {
        self.add_merge(range);
        self
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// Value stored at the position itself, without merge resolution.
    pub fn raw_value(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(row).and_then(|cells| cells.get(col)).unwrap_or(&EMPTY)
    }
}

impl GridAccessor for Grid {
    fn value(&self, row: usize, col: usize) -> &CellValue {
        match self.merge_span(row, col) {
            Some(span) => self.raw_value(span.first.row, span.first.col),
            None => self.raw_value(row, col),
        }
    }

    fn is_merge_anchor(&self, row: usize, col: usize) -> bool {
        self.merges.iter().any(|span| span.is_anchor(row, col))
    }

    fn merge_span(&self, row: usize, col: usize) -> Option<CellRange> {
        self.merges.iter().find(|span| span.contains(row, col)).copied()
    }

    fn row_count(&self) -> usize {
        self.rows
    }

    fn column_count(&self) -> usize {
        self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_ragged_rows() {
        let grid = Grid::from_strings(&[&["A"], &["", "b", "c"]]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.value(0, 2), &CellValue::Empty);
        assert_eq!(grid.value(1, 1), &CellValue::Text("b".to_owned()));
        assert_eq!(grid.value(7, 7), &CellValue::Empty);
    }

    #[test]
    fn resolves_merged_cells_to_anchor() {
        let grid = Grid::from_strings(&[&["HEADER", "", ""], &["x", "y", "z"]])
            .with_merge(CellRange::new(0, 0, 0, 2));

        assert_eq!(grid.value(0, 2), &CellValue::Text("HEADER".to_owned()));
        assert_eq!(grid.raw_value(0, 2), &CellValue::Empty);
        assert!(grid.is_merge_anchor(0, 0));
        assert!(!grid.is_merge_anchor(0, 1));
        assert!(grid.is_merge_continuation(0, 1));
        assert!(!grid.is_merge_continuation(1, 1));
        assert_eq!(grid.merge_span(0, 1), Some(CellRange::new(0, 0, 0, 2)));
        assert_eq!(grid.merge_span(1, 1), None);
    }

    #[test]
    fn grows_on_set() {
        let mut grid = Grid::new(1, 1);
        grid.set(0, 0, CellValue::from("a"));
        grid.set(2, 3, CellValue::Number(4.0));
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.value(0, 0), &CellValue::Text("a".to_owned()));
        assert_eq!(grid.value(2, 3), &CellValue::Number(4.0));
    }

    #[test]
    fn wide_merge_grows_bounds_without_cells() {
        let mut grid = Grid::from_strings(&[&["UWAGI"]]);
        grid.add_merge(CellRange::new(0, 0, 0, 16383));
        assert_eq!(grid.column_count(), 16384);
        assert_eq!(grid.value(0, 16383), &CellValue::Text("UWAGI".to_owned()));
        assert_eq!(grid.raw_value(0, 16383), &CellValue::Empty);
    }

    #[test]
    fn text_is_trimmed() {
        let grid = Grid::from_strings(&[&["  Model \t", "   "]]);
        assert_eq!(grid.text(0, 0).as_deref(), Some("Model"));
        assert_eq!(grid.text(0, 1), None);
    }
}
