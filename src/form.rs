use crate::error::FormError;
use crate::error::ResultMessage;
use crate::helpers::reader::SourceReader;
use crate::media::locate_media;
use crate::media::MediaReference;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::grid::GridAccessor;
use crate::spreadsheet::xlsx::SheetInfo;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::structure::config::Configuration;
use crate::structure::extractor::create_data_structure_from_template;
use crate::structure::extractor::discard_sparse_entities;
use crate::structure::extractor::EntityRecord;
use crate::structure::layout::SheetLayout;
use crate::structure::resolver::compare_structure_with_file;
use crate::structure::section::detect_sections;
use crate::structure::section::SectionBlock;
use crate::structure::template::create_template_structure;
use crate::structure::template::Template;
use crate::structure::StructureError;
use crate::warning::Warning;
use crate::warning::Warnings;
use log::debug;
use serde::Serialize;
use std::path::Path;

/// An opened form: the first worksheet as a grid plus the package's media.
#[derive(Debug)]
pub struct FormFile {
    sheets: Vec<SheetInfo>,
    grid: Grid,
    media: Vec<MediaReference>,
    warnings: Warnings,
}

/// Result of running a configuration against a form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Extraction {
    /// One record per entity column that survived the sparse filter
    pub records: Vec<EntityRecord>,
    /// The template with every entry's resolved rows
    pub template: Template,
    pub layout: SheetLayout,
    pub sections: Vec<SectionBlock>,
    /// Warnings raised by this extraction only
    pub warnings: Warnings,
}

impl FormFile {
    /// Opens an xlsx file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FormFile, FormError> {
        let path = path.as_ref();
        let reader = SourceReader::open(path).map_err(FormError::from);
        Self::load(reader.and_then(XlsxWorkbook::open)).with_prefix(&path.display().to_string())
    }

    /// Opens an xlsx package held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<FormFile, FormError> {
        Self::load(XlsxWorkbook::open(SourceReader::from_bytes(bytes)))
    }

    fn load(workbook: Result<XlsxWorkbook, FormError>) -> Result<FormFile, FormError> {
        let mut workbook = workbook?;
        let grid = workbook.read_grid(0)?;
        let mut warnings = Warnings::new();
        let media = locate_media(&mut workbook.zip, &mut warnings)?;
        Ok(FormFile {
            sheets: workbook.sheets,
            grid,
            media,
            warnings,
        })
    }

    pub fn worksheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Worksheet names in tab order; only the first one is read.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn media(&self) -> &[MediaReference] {
        &self.media
    }

    /// Warnings raised while opening the file.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Runs the structure engine over the first worksheet.
    pub fn extract(&self, configuration: &Configuration) -> Result<Extraction, FormError> {
        Ok(extract_grid(&self.grid, configuration)?)
    }
}

/// Runs the whole pipeline over any grid: layout, sections, template,
/// resolution, extraction and the sparse-entity filter.
pub fn extract_grid<G: GridAccessor + ?Sized>(
    grid: &G,
    configuration: &Configuration,
) -> Result<Extraction, StructureError> {
    let mut warnings = Warnings::new();
    let layout = configuration.layout.unwrap_or_else(|| SheetLayout::detect(grid));
    debug!("Using layout {:?}", layout);

    let names = configuration.section_names();
    let sections = detect_sections(grid, &layout, &names);
    for block in sections.iter().filter(|block| block.tag.is_none()) {
        if let Some(title) = &block.title {
            warnings.push(Warning::UntaggedSection {
                row: block.header.start,
                title: title.to_owned(),
            });
        }
    }

    let template = create_template_structure(&names, &configuration.section_keys());
    let mut reported = Vec::new();
    for entry in template.iter().filter(|entry| !entry.detectable) {
        if !reported.contains(&&entry.tag) {
            reported.push(&entry.tag);
            warnings.push(Warning::UnconfiguredSection { tag: entry.tag.clone() });
        }
    }

    let template = compare_structure_with_file(&template, grid, &sections, &layout)?;
    let records = create_data_structure_from_template(&template, grid, &layout);
    let records = discard_sparse_entities(records, configuration.minimum_entity_values, &mut warnings);
    debug!(
        "Extracted {} record(s) from {} section(s), {} of {} key(s) resolved",
        records.len(),
        sections.len(),
        template.len() - template.unresolved().count(),
        template.len()
    );

    Ok(Extraction {
        records,
        template,
        layout,
        sections,
        warnings,
    })
}
