//! In-memory xlsx packages for tests.
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

pub(crate) fn archive_bytes(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub(crate) fn archive(parts: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(archive_bytes(parts))).unwrap()
}

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Inline-string row for the given one-based row number; empty strings are skipped.
pub(crate) fn text_row(number: usize, values: &[&str]) -> String {
    let mut row = format!(r#"<row r="{number}">"#);
    for (col, value) in values.iter().enumerate().filter(|(_, value)| !value.is_empty()) {
        let reference = crate::spreadsheet::reference::index_to_reference(number - 1, col);
        row.push_str(&format!(
            r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
            escape(value)
        ));
    }
    row.push_str("</row>");
    row
}

struct SheetFixture {
    name: String,
    rows: String,
    merges: Vec<String>,
}

/// Builder for a minimal but well-formed xlsx package.
#[derive(Default)]
pub(crate) struct WorkbookFixture {
    sheets: Vec<SheetFixture>,
    shared_strings: Option<String>,
    styles: Option<String>,
    parts: Vec<(String, String)>,
}

impl WorkbookFixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sheet(self, name: &str, rows: &str) -> Self {
        self.sheet_with_merges(name, rows, &[])
    }

    pub(crate) fn sheet_with_merges(mut self, name: &str, rows: &str, merges: &[&str]) -> Self {
        self.sheets.push(SheetFixture {
            name: name.to_owned(),
            rows: rows.to_owned(),
            merges: merges.iter().map(|merge| merge.to_string()).collect(),
        });
        self
    }

    pub(crate) fn shared_strings(self, strings: &[&str]) -> Self {
        let items: String = strings
            .iter()
            .map(|string| format!("<si><t>{}</t></si>", escape(string)))
            .collect();
        self.raw_shared_strings(&items)
    }

    pub(crate) fn raw_shared_strings(mut self, items: &str) -> Self {
        self.shared_strings = Some(items.to_owned());
        self
    }

    pub(crate) fn styles(mut self, inner: &str) -> Self {
        self.styles = Some(inner.to_owned());
        self
    }

    /// Adds an arbitrary part such as a drawing, its relationships or a media asset.
    pub(crate) fn part(mut self, path: &str, content: &str) -> Self {
        self.parts.push((path.to_owned(), content.to_owned()));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, String)> = Vec::new();
        parts.push((
            "[Content_Types].xml".to_owned(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_owned(),
        ));

        let mut sheets = String::new();
        let mut relationships = String::new();
        for (index, sheet) in self.sheets.iter().enumerate() {
            let number = index + 1;
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#,
                escape(&sheet.name)
            ));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
            ));
            let merges = if sheet.merges.is_empty() {
                String::new()
            } else {
                let cells: String = sheet.merges.iter().map(|merge| format!(r#"<mergeCell ref="{merge}"/>"#)).collect();
                format!(r#"<mergeCells count="{}">{cells}</mergeCells>"#, sheet.merges.len())
            };
            parts.push((
                format!("xl/worksheets/sheet{number}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData>{merges}</worksheet>"#,
                    sheet.rows
                ),
            ));
        }
        parts.push((
            "xl/workbook.xml".to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>{sheets}</sheets></workbook>"#
            ),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
            ),
        ));
        if let Some(items) = &self.shared_strings {
            parts.push((
                "xl/sharedStrings.xml".to_owned(),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{items}</sst>"#),
            ));
        }
        if let Some(inner) = &self.styles {
            parts.push((
                "xl/styles.xml".to_owned(),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{inner}</styleSheet>"#),
            ));
        }
        parts.extend(self.parts.iter().cloned());

        let borrowed: Vec<(&str, &str)> = parts.iter().map(|(name, content)| (name.as_str(), content.as_str())).collect();
        archive_bytes(&borrowed)
    }
}
