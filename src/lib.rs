//! # Form Sheet
//!
//! Extracts per-station records from semi-tabular `.xlsx` forms whose layout
//! encodes a hierarchy by convention: uppercase cells in the section column
//! open sections, the key column holds human-written keys, and every column
//! after it holds one entity (one charging station) worth of values.
//!
//! ## Features
//!
//! - **Section detection**: uppercase headers (Unicode aware, `Ł`, `Ą` included)
//!   mapped to canonical tags through configurable alternate names
//! - **Layout detection**: auxiliary numbering columns (`Lp`, `1.`, `2.`) are
//!   recognized and skipped
//! - **Row resolution**: keys are matched case- and whitespace-insensitively
//!   within their own section; duplicate keys fail loudly, absent keys do not
//! - **Merged cells**: values are read through the merge anchor
//! - **Media**: embedded images and charts with the cell they are anchored to
//!
//! ## Example
//!
//! ```no_run
//! use form_sheet::{Configuration, FormFile};
//!
//! let configuration = Configuration::from_path("sections.json")?;
//! let form = FormFile::open("protocol.xlsx")?;
//! let extraction = form.extract(&configuration)?;
//! for record in &extraction.records {
//!     println!("{}: {} value(s)", record.column_name(), record.value_count());
//! }
//! # Ok::<(), form_sheet::FormError>(())
//! ```
mod error;
mod form;
mod helpers;
pub mod media;
pub mod spreadsheet;
pub mod structure;
pub mod warning;

pub use error::FormError;
pub use form::extract_grid;
pub use form::Extraction;
pub use form::FormFile;
pub use helpers::xml::XmlError;
pub use media::locate_media;
pub use media::MediaKind;
pub use media::MediaReference;
pub use spreadsheet::CellValue;
pub use spreadsheet::Grid;
pub use spreadsheet::GridAccessor;
pub use spreadsheet::SpreadsheetError;
pub use structure::config::Configuration;
pub use structure::config::SectionKeys;
pub use structure::config::SectionNames;
pub use structure::extractor::EntityRecord;
pub use structure::layout::SheetLayout;
pub use structure::section::SectionBlock;
pub use structure::template::Template;
pub use structure::SectionTag;
pub use structure::StructureError;
pub use warning::Warning;
pub use warning::Warnings;
