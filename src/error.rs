use thiserror::Error;

/// Main error type for the form sheet crate.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Structure module errors
    #[error("{0}")]
    StructureError(#[from] crate::structure::StructureError),

    #[error("{0}")]
    ConfigError(#[from] crate::structure::config::ConfigError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, FormError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| FormError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), FormError> = Err(crate::spreadsheet::SpreadsheetError::NoWorksheetError.into());
        let error = result.with_prefix("xl/workbook.xml").unwrap_err();
        assert_eq!(error.to_string(), "xl/workbook.xml: Workbook contains no worksheet");
    }

    #[test]
    fn with_prefix_keeps_ok() {
        let result: Result<u8, FormError> = Ok(7);
        assert_eq!(result.with_prefix("ignored").unwrap(), 7);
    }
}
