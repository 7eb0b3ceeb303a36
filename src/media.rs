//! # Media Module
//!
//! Finds the pictures and charts embedded in an xlsx package and the cell each
//! one is anchored to. The package is walked the way Excel links it:
//! workbook -> worksheet -> drawing (through the worksheet relationships) ->
//! image or chart (through the drawing relationships).
use crate::error::FormError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::Relationship;
use crate::spreadsheet::reference::CellPosition;
use crate::spreadsheet::xlsx::load_workbook;
use crate::spreadsheet::xlsx::SheetInfo;
use crate::warning::Warning;
use crate::warning::Warnings;
use log::debug;
use quick_xml::events::Event;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const MEDIA_DIRECTORY: &str = "xl/media/";
const CHART_DIRECTORY: &str = "xl/charts/";

// DrawingML local names; prefixes (xdr:, a:, c:) vary between producers
const TAG_TWO_CELL_ANCHOR: &[u8] = b"twoCellAnchor";
const TAG_ONE_CELL_ANCHOR: &[u8] = b"oneCellAnchor";
const TAG_ABSOLUTE_ANCHOR: &[u8] = b"absoluteAnchor";
const TAG_FROM: &[u8] = b"from";
const TAG_COL: &[u8] = b"col";
const TAG_ROW: &[u8] = b"row";
const TAG_BLIP: &[u8] = b"blip";
const TAG_CHART: &[u8] = b"chart";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Chart,
}

/// One placement of an image or chart, or an asset no sheet places.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaReference {
    /// File name of the asset, e.g. `image1.png` or `chart1.xml`
    pub id: String,
    /// Full part path inside the archive
    pub part: String,
    pub kind: MediaKind,
    /// Worksheet showing the asset; `None` for unplaced assets
    pub sheet: Option<String>,
    /// Top-left cell of the placement; `None` when floating
    pub anchor: Option<CellPosition>,
}

impl MediaReference {
    fn new(part: &str, kind: MediaKind, sheet: Option<&str>, anchor: Option<CellPosition>) -> Self {
        Self {
            id: part.rsplit('/').next().unwrap_or(part).to_owned(),
            part: part.to_owned(),
            kind,
            sheet: sheet.map(str::to_owned),
            anchor,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.anchor.is_none()
    }
}

/// Lists every image and chart of the package.
///
/// Each placement in a drawing yields one reference anchored at the `from`
/// cell of its `twoCellAnchor`/`oneCellAnchor`; `absoluteAnchor` placements
/// are floating. Assets under `xl/media` and `xl/charts` that no drawing
/// places are reported once as floating. A workbook with more than one
/// worksheet raises [`Warning::MultipleWorksheets`].
pub fn locate_media<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    warnings: &mut Warnings,
) -> Result<Vec<MediaReference>, FormError> {
    let (sheets, _) = load_workbook(zip).with_prefix("xl/workbook.xml")?;
    if let Some(first) = sheets.first().filter(|_| sheets.len() > 1) {
        warnings.push(Warning::MultipleWorksheets {
            count: sheets.len(),
            processed: first.name.to_owned(),
        });
    }

    let mut references = Vec::new();
    for sheet in &sheets {
        let relationships = load_relationships(zip, &sheet.path).with_prefix(&sheet.path)?;
        let mut drawings: Vec<String> = relationships
            .into_values()
            .filter(|relationship| relationship.kind == "drawing")
            .map(|relationship| relationship.target)
            .collect();
        drawings.sort();
        drawings.dedup();
        for drawing in drawings {
            let placed = read_drawing(zip, &drawing, sheet).with_prefix(&drawing)?;
            references.extend(placed);
        }
    }

    let placed: HashSet<String> = references.iter().map(|reference| reference.part.to_owned()).collect();
    let assets = zip.file_names_under(MEDIA_DIRECTORY).into_iter().map(|part| (part, MediaKind::Image));
    let charts = zip
        .file_names_under(CHART_DIRECTORY)
        .into_iter()
        .filter(|part| is_chart_part(part))
        .map(|part| (part, MediaKind::Chart));
    for (part, kind) in assets.chain(charts) {
        if !placed.contains(&part) {
            references.push(MediaReference::new(&part, kind, None, None));
        }
    }

    debug!("Located {} media reference(s)", references.len());
    Ok(references)
}

/// "xl/charts/chart3.xml", but not its relationships, styles or colors parts.
fn is_chart_part(part: &str) -> bool {
    part.strip_prefix(CHART_DIRECTORY)
        .map(|name| !name.contains('/') && name.starts_with("chart") && name.ends_with(".xml"))
        .unwrap_or(false)
}

#[derive(Copy, Clone, PartialEq)]
enum Coordinate {
    Col,
    Row,
}

/// Placement currently being read
#[derive(Default)]
struct Anchor {
    /// False for `absoluteAnchor`
    cell: bool,
    in_from: bool,
    coordinate: Option<Coordinate>,
    text: String,
    col: Option<usize>,
    row: Option<usize>,
    /// Parts already placed by this anchor; `mc:AlternateContent` repeats them in its fallback
    parts: HashSet<String>,
}

impl Anchor {
    fn cell() -> Self {
        Self {
            cell: true,
            ..Self::default()
        }
    }

    fn position(&self) -> Option<CellPosition> {
        if !self.cell {
            return None;
        }
        self.row.zip(self.col).map(|(row, col)| CellPosition::new(row, col))
    }
}

fn read_drawing<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    drawing: &str,
    sheet: &SheetInfo,
) -> Result<Vec<MediaReference>, FormError> {
    let relationships = load_relationships(zip, drawing)?;
    let mut reader = match zip.xml_reader(drawing)? {
        Some(reader) => reader,
        None => {
            debug!("Drawing part '{}' referenced by '{}' is missing", drawing, sheet.name);
            return Ok(Vec::new());
        }
    };

    let mut references = Vec::new();
    let mut anchor = None::<Anchor>;
    match_xml_events!(reader => {
        Event::Start(event) => {
            let name = event.local_name();
            match name.as_ref() {
                TAG_TWO_CELL_ANCHOR | TAG_ONE_CELL_ANCHOR => anchor = Some(Anchor::cell()),
                TAG_ABSOLUTE_ANCHOR => anchor = Some(Anchor::default()),
                TAG_FROM => {
                    if let Some(anchor) = anchor.as_mut() {
                        anchor.in_from = true;
                    }
                }
                TAG_COL | TAG_ROW => {
                    if let Some(anchor) = anchor.as_mut().filter(|anchor| anchor.in_from) {
                        anchor.coordinate = Some(if name.as_ref() == TAG_COL { Coordinate::Col } else { Coordinate::Row });
                        anchor.text.clear();
                    }
                }
                TAG_BLIP | TAG_CHART => {
                    let (kind, attribute) = if name.as_ref() == TAG_BLIP {
                        (MediaKind::Image, "embed")
                    } else {
                        (MediaKind::Chart, "id")
                    };
                    let id = event.get_local_attribute_value(attribute)?.map(|id| id.to_string());
                    if let (Some(anchor), Some(relationship)) = (anchor.as_mut(), target(&relationships, id.as_deref())) {
                        if anchor.parts.insert(relationship.target.to_owned()) {
                            references.push(MediaReference::new(
                                &relationship.target,
                                kind,
                                Some(&sheet.name),
                                anchor.position(),
                            ));
                        }
                    }
                }
                _ => (),
            }
        }
        Event::Text(event) => {
            if let Some(anchor) = anchor.as_mut().filter(|anchor| anchor.coordinate.is_some()) {
                anchor.text.push_str(&event.xml_content()?);
            }
        }
        Event::End(event) => {
            let name = event.local_name();
            match name.as_ref() {
                TAG_TWO_CELL_ANCHOR | TAG_ONE_CELL_ANCHOR | TAG_ABSOLUTE_ANCHOR => anchor = None,
                TAG_FROM => {
                    if let Some(anchor) = anchor.as_mut() {
                        anchor.in_from = false;
                    }
                }
                TAG_COL | TAG_ROW => {
                    if let Some(anchor) = anchor.as_mut() {
                        if let Some(coordinate) = anchor.coordinate.take() {
                            let value = anchor.text.trim().parse::<usize>()?;
                            match coordinate {
                                Coordinate::Col => anchor.col = Some(value),
                                Coordinate::Row => anchor.row = Some(value),
                            }
                        }
                    }
                }
                _ => (),
            }
        }
    });
    Ok(references)
}

fn target<'a>(relationships: &'a HashMap<String, Relationship>, id: Option<&str>) -> Option<&'a Relationship> {
    id.and_then(|id| relationships.get(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::fixture::WorkbookFixture;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const DRAWING_NAMESPACES: &str = r#"xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart""#;

    fn relationships(entries: &[(&str, &str, &str)]) -> String {
        let items: String = entries
            .iter()
            .map(|(id, kind, target)| {
                format!(r#"<Relationship Id="{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{kind}" Target="{target}"/>"#)
            })
            .collect();
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{items}</Relationships>"#)
    }

    fn drawing(anchors: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><xdr:wsDr {DRAWING_NAMESPACES}>{anchors}</xdr:wsDr>"#)
    }

    fn picture(embed: &str) -> String {
        format!(r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Obraz 1"/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{embed}"/></xdr:blipFill></xdr:pic><xdr:clientData/>"#)
    }

    fn from(row: usize, col: usize) -> String {
        format!("<xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>")
    }

    fn locate(fixture: WorkbookFixture) -> (Vec<MediaReference>, Warnings) {
        let mut zip = ZipArchive::new(Cursor::new(fixture.build())).unwrap();
        let mut warnings = Warnings::new();
        let references = locate_media(&mut zip, &mut warnings).unwrap();
        (references, warnings)
    }

    fn with_drawing(anchors: &str, drawing_relationships: &[(&str, &str, &str)]) -> WorkbookFixture {
        WorkbookFixture::new()
            .sheet("Stacje", "")
            .part("xl/worksheets/_rels/sheet1.xml.rels", &relationships(&[("rId1", "drawing", "../drawings/drawing1.xml")]))
            .part("xl/drawings/drawing1.xml", &drawing(anchors))
            .part("xl/drawings/_rels/drawing1.xml.rels", &relationships(drawing_relationships))
            .part("xl/media/image1.png", "png")
            .part("xl/media/image2.jpeg", "jpeg")
    }

    #[test]
    fn anchors_two_cell_and_one_cell_pictures() {
        let anchors = format!(
            "<xdr:twoCellAnchor>{}<xdr:to><xdr:col>6</xdr:col><xdr:row>12</xdr:row></xdr:to>{}</xdr:twoCellAnchor>\
             <xdr:oneCellAnchor>{}<xdr:ext cx=\"1\" cy=\"1\"/>{}</xdr:oneCellAnchor>",
            from(5, 2),
            picture("rId1"),
            from(20, 3),
            picture("rId2"),
        );
        let (references, warnings) = locate(with_drawing(
            &anchors,
            &[("rId1", "image", "../media/image1.png"), ("rId2", "image", "../media/image2.jpeg")],
        ));

        assert_eq!(
            references,
            vec![
                MediaReference {
                    id: "image1.png".to_owned(),
                    part: "xl/media/image1.png".to_owned(),
                    kind: MediaKind::Image,
                    sheet: Some("Stacje".to_owned()),
                    anchor: Some(CellPosition::new(5, 2)),
                },
                MediaReference {
                    id: "image2.jpeg".to_owned(),
                    part: "xl/media/image2.jpeg".to_owned(),
                    kind: MediaKind::Image,
                    sheet: Some("Stacje".to_owned()),
                    anchor: Some(CellPosition::new(20, 3)),
                },
            ]
        );
        assert_eq!(references[0].anchor.map(|anchor| anchor.to_string()).as_deref(), Some("C6"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn absolute_anchor_is_floating() {
        let anchors = format!(
            r#"<xdr:absoluteAnchor><xdr:pos x="0" y="0"/><xdr:ext cx="1" cy="1"/>{}</xdr:absoluteAnchor>"#,
            picture("rId1")
        );
        let (references, _) = locate(with_drawing(&anchors, &[("rId1", "image", "../media/image1.png")]));
        let image = references.iter().find(|reference| reference.id == "image1.png").unwrap();
        assert!(image.is_floating());
        assert_eq!(image.sheet.as_deref(), Some("Stacje"));
    }

    #[test]
    fn reports_unplaced_assets_once() {
        let anchors = format!("<xdr:twoCellAnchor>{}{}</xdr:twoCellAnchor>", from(1, 1), picture("rId1"));
        let (references, _) = locate(with_drawing(&anchors, &[("rId1", "image", "../media/image1.png")]));
        let unplaced: Vec<&MediaReference> = references.iter().filter(|reference| reference.sheet.is_none()).collect();
        assert_eq!(unplaced.len(), 1);
        assert_eq!(unplaced[0].part, "xl/media/image2.jpeg");
        assert!(unplaced[0].is_floating());
    }

    #[test]
    fn one_reference_per_placement() {
        let anchors = format!(
            "<xdr:twoCellAnchor>{}{}</xdr:twoCellAnchor><xdr:twoCellAnchor>{}{}</xdr:twoCellAnchor>",
            from(1, 2),
            picture("rId1"),
            from(8, 2),
            picture("rId1"),
        );
        let (references, _) = locate(with_drawing(&anchors, &[("rId1", "image", "../media/image1.png")]));
        let anchors: Vec<Option<CellPosition>> = references
            .iter()
            .filter(|reference| reference.part == "xl/media/image1.png")
            .map(|reference| reference.anchor)
            .collect();
        assert_eq!(anchors, vec![Some(CellPosition::new(1, 2)), Some(CellPosition::new(8, 2))]);
    }

    #[test]
    fn alternate_content_fallback_is_not_counted_twice() {
        let anchors = format!(
            r#"<xdr:twoCellAnchor>{}<mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><mc:Choice Requires="a14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent></xdr:twoCellAnchor>"#,
            from(3, 4),
            picture("rId1"),
            picture("rId1"),
        );
        let (references, _) = locate(with_drawing(&anchors, &[("rId1", "image", "../media/image1.png")]));
        assert_eq!(references.iter().filter(|reference| reference.id == "image1.png").count(), 1);
    }

    #[test]
    fn locates_charts() {
        let anchors = format!(
            r#"<xdr:twoCellAnchor>{}<xdr:graphicFrame><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart r:id="rId3"/></a:graphicData></a:graphic></xdr:graphicFrame><xdr:clientData/></xdr:twoCellAnchor>"#,
            from(10, 0)
        );
        let fixture = with_drawing(&anchors, &[("rId3", "chart", "../charts/chart1.xml")])
            .part("xl/charts/chart1.xml", "<c:chartSpace/>")
            .part("xl/charts/chart2.xml", "<c:chartSpace/>")
            .part("xl/charts/_rels/chart1.xml.rels", &relationships(&[]))
            .part("xl/charts/style1.xml", "<cs:chartStyle/>");
        let (references, _) = locate(fixture);

        let charts: Vec<(&str, Option<CellPosition>)> = references
            .iter()
            .filter(|reference| reference.kind == MediaKind::Chart)
            .map(|reference| (reference.id.as_str(), reference.anchor))
            .collect();
        assert_eq!(charts, vec![("chart1.xml", Some(CellPosition::new(10, 0))), ("chart2.xml", None)]);
    }

    #[test]
    fn warns_about_multiple_worksheets() {
        let (references, warnings) = locate(WorkbookFixture::new().sheet("Stacje", "").sheet("Słowniki", ""));
        assert!(references.is_empty());
        assert_eq!(
            warnings.into_vec(),
            vec![Warning::MultipleWorksheets { count: 2, processed: "Stacje".to_owned() }]
        );
    }

    #[test]
    fn workbook_without_drawings_has_only_unplaced_assets() {
        let (references, _) = locate(WorkbookFixture::new().sheet("Stacje", "").part("xl/media/image1.png", "png"));
        assert_eq!(references, vec![MediaReference::new("xl/media/image1.png", MediaKind::Image, None, None)]);
    }

    #[test]
    fn recognizes_chart_parts() {
        assert!(is_chart_part("xl/charts/chart1.xml"));
        assert!(!is_chart_part("xl/charts/_rels/chart1.xml.rels"));
        assert!(!is_chart_part("xl/charts/colors1.xml"));
        assert!(!is_chart_part("xl/media/chart1.xml"));
    }
}
