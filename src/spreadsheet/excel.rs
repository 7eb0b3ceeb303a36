//! Office Open XML package helpers: relationships and part paths
use crate::error::FormError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Single entry of a `.rels` part
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Relationship {
    /// Last segment of the relationship type URI, e.g. "worksheet", "drawing", "image"
    pub(crate) kind: String,
    /// Target resolved to a full part path inside the archive
    pub(crate) target: String,
}

/// Loads the relationships of a part.
/// A missing `.rels` part is not an error, the part simply has no relationships.
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `part` - Part whose relationships are wanted, e.g. "xl/workbook.xml"
///
/// # Returns
/// Mapping of relationship IDs to their kind and resolved target
pub(crate) fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    part: &str,
) -> Result<HashMap<String, Relationship>, FormError> {
    let mut relationships = HashMap::new();
    let mut reader = match zip.xml_reader(&relationships_path(part))? {
        Some(reader) => reader,
        None => return Ok(relationships),
    };
    let base = part_directory(part);
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            let external = event.get_attribute_value("TargetMode")?
                .map(|mode| mode.eq_ignore_ascii_case("External"))
                .unwrap_or(false);
            if let Some((id, target)) = id.zip(target).filter(|_| !external) {
                let kind = kind
                    .map(|uri| uri.rsplit('/').next().unwrap_or_default().to_owned())
                    .unwrap_or_default();
                relationships.insert(id.to_string(), Relationship {
                    kind,
                    target: resolve_target(base, &target),
                });
            }
        }
    });
    Ok(relationships)
}

/// Path of the relationships part belonging to `part`: "xl/workbook.xml" -> "xl/_rels/workbook.xml.rels".
pub(crate) fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((directory, name)) => format!("{directory}/_rels/{name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Directory of a part: "xl/drawings/drawing1.xml" -> "xl/drawings".
pub(crate) fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map(|(directory, _)| directory).unwrap_or("")
}

/// Resolves a relationship target against the directory of the source part.
/// Absolute targets ("/xl/media/image1.png") are taken from the package root.
///
/// # Arguments
/// * `base` - Directory of the part that owns the relationship
/// * `target` - Target as written in the `.rels` part
///
/// # Returns
/// Normalized path suitable for accessing files within the zip archive
pub(crate) fn resolve_target(base: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_owned()
    } else if base.is_empty() {
        target
    } else {
        format!("{base}/{target}")
    };
    for segment in joined.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}
