//! # Spreadsheet Module
//!
//! Opens an xlsx package, validates that it is usable, and exposes its first
//! worksheet as a [`Grid`] through the [`GridAccessor`] trait. Everything in
//! this module is I/O facing; the structure engine in `crate::structure` only
//! ever sees the resulting grid.
pub mod cell;
pub(crate) mod excel;
#[cfg(test)]
pub(crate) mod fixture;
pub mod grid;
pub mod reference;
pub(crate) mod xlsx;

pub use cell::CellValue;
pub use grid::Grid;
pub use grid::GridAccessor;
pub use reference::CellPosition;
pub use reference::CellRange;
pub use xlsx::SheetInfo;

use thiserror::Error;

/// Structural errors raised while opening a spreadsheet package.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// The stream is not a zip archive
    #[error("Not a valid xlsx file: {0}")]
    InvalidArchiveError(zip::result::ZipError),

    /// Compound file container: an encrypted workbook or a legacy .xls file
    #[error("Spreadsheet is password protected or in the legacy xls format")]
    CompoundFileError,

    /// A part the package cannot do without is missing
    #[error("Missing part '{0}' in spreadsheet package")]
    FileError(String),

    /// Workbook lists no worksheet
    #[error("Workbook contains no worksheet")]
    NoWorksheetError,

    /// A cell points past the end of the shared string table
    #[error("Shared string {0} referenced in sheet '{1}' does not exist")]
    SharedStringError(usize, String),
}
