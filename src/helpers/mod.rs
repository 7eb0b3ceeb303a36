//! Low level helpers shared by the workbook reader and the media locator
pub(crate) mod reader;
pub mod xml;
pub(crate) mod zip;
