use crate::error::FormError;
use crate::error::ResultMessage;
use crate::helpers::reader::SourceReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::GridAccessor;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::CellRange;
use crate::spreadsheet::SpreadsheetError;
use log::debug;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_MERGE_CELL: QName = QName(b"mergeCell");    // Merged region

const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Worksheet entry of the workbook part
#[derive(Clone, Debug, PartialEq)]
pub struct SheetInfo {
    /// Name shown on the sheet tab
    pub name: String,
    /// Part path of the worksheet XML inside the archive
    pub path: String,
}

/// An opened xlsx package
pub(crate) struct XlsxWorkbook {
    /// ZIP archive containing the XLSX file contents
    pub(crate) zip: ZipArchive<SourceReader>,
    /// Parsed number formats for cell type detection
    number_formats: Vec<CellType>,
    /// Worksheets in tab order
    pub(crate) sheets: Vec<SheetInfo>,
}

impl XlsxWorkbook {
    /// Opens an XLSX package and parses its structure
    ///
    /// # Arguments
    /// * `reader` - The package bytes, on disk or in memory
    ///
    /// # Returns
    /// Result containing the initialized workbook or an error when the
    /// stream is not a usable xlsx package
    pub(crate) fn open(mut reader: SourceReader) -> Result<XlsxWorkbook, FormError> {
        if reader.is_compound_file()? {
            Err(SpreadsheetError::CompoundFileError)?;
        }

        let mut zip = ZipArchive::new(reader).map_err(SpreadsheetError::InvalidArchiveError)?;
        if zip.file(WORKBOOK_PART)?.is_none() {
            Err(SpreadsheetError::FileError(WORKBOOK_PART.to_owned()))?;
        }
        let (sheets, is_1904) = load_workbook(&mut zip).with_prefix(WORKBOOK_PART)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::NoWorksheetError)?;
        }
        let number_formats = load_number_formats(&mut zip, is_1904).with_prefix("xl/styles.xml")?;
        debug!("Opened workbook with {} worksheet(s)", sheets.len());
        Ok(XlsxWorkbook {
            zip,
            number_formats,
            sheets,
        })
    }

    /// Loads all shared strings. Shared strings live in a separate part and
    /// are referenced by index to reduce file size.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, FormError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }

    /// Reads one worksheet into a grid, including its merged regions.
    ///
    /// # Arguments
    /// * `index` - Zero-based position of the sheet in tab order
    pub(crate) fn read_grid(&mut self, index: usize) -> Result<Grid, FormError> {
        let sheet = self.sheets.get(index).cloned().ok_or(SpreadsheetError::NoWorksheetError)?;
        let shared_strings = self.load_shared_strings().with_prefix("xl/sharedStrings.xml")?;
        let mut reader = self.zip.xml_reader(&sheet.path)?
            .ok_or_else(|| SpreadsheetError::FileError(sheet.path.to_owned()))?;

        let mut grid = Grid::default();
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                    row_count = number.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                value.clear();
                kind = event.get_attribute_value("t")?.map(|t| {
                    match t.as_ref() {
                        "inlineStr" | "str" => CellType::InlineString,
                        "s" => CellType::SharedString,
                        "d" => CellType::IsoDateTime,
                        "b" => CellType::Boolean,
                        "e" => CellType::Error,
                        _ => CellType::Number,
                    }
                }).unwrap_or(CellType::Number);
                if let Some(format_id) = event.get_attribute_value("s")? {
                    if kind == CellType::Number && !format_id.is_empty() {
                        let index = format_id.parse::<usize>()?;
                        kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if !value.is_empty() {
                    let cell = if kind == CellType::SharedString {
                        let index = value.trim().parse::<usize>()?;
                        let text = shared_strings.get(index).cloned().ok_or_else(|| {
                            SpreadsheetError::SharedStringError(index, sheet.name.to_owned())
                        })?;
                        CellValue::Text(text)
                    } else {
                        CellValue::from_raw(kind, std::mem::take(&mut value))
                    };
                    grid.set(row, col, cell);
                    value.clear();
                }
                kind = CellType::default();
            }
            Event::Start(event) if event.name() == TAG_MERGE_CELL => {
                if let Some(range) = event.get_attribute_value("ref")?.and_then(|r| CellRange::parse(&r)) {
                    grid.add_merge(range);
                }
            }
        });
        debug!(
            "Read worksheet '{}': {} row(s), {} column(s), {} merge(s)",
            sheet.name,
            grid.row_count(),
            grid.column_count(),
            grid.merges().len()
        );
        Ok(grid)
    }
}

/// Loads workbook structure and worksheet information from XLSX file
///
/// Parses the workbook.xml file to extract worksheet names and their corresponding
/// XML file paths, and determines the date system (1900 vs 1904) used in the file.
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system)
pub(crate) fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<SheetInfo>, bool), FormError> {
    let relationships = load_relationships(zip, WORKBOOK_PART)?;
    let mut reader = zip.xml_reader(WORKBOOK_PART)?
        .ok_or_else(|| SpreadsheetError::FileError(WORKBOOK_PART.to_owned()))?;
    let mut sheets: Vec<SheetInfo> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                // Chartsheets and dialog sheets are listed too; only worksheets hold cells
                if let Some(relationship) = relationships.get(&*id).filter(|r| r.kind == "worksheet") {
                    sheets.push(SheetInfo {
                        name: name.to_string(),
                        path: relationship.target.to_owned(),
                    });
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats and cell styles from XLSX styles.xml file
///
/// Parses custom number formats and cell style indexes to determine
/// which numeric cells hold dates.
///
/// # Returns
/// Vector of CellType values indexed by style ID
fn load_number_formats(zip: &mut ZipArchive<SourceReader>, is_1904: bool) -> Result<Vec<CellType>, FormError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.map(|id| id.to_string()).unwrap_or_default();
            format_indexes.push(id);
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text annotations
/// and properly handling both text nodes and CDATA sections.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, FormError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
