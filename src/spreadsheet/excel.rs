//! Office Open XML package helpers
use crate::error::SiteSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// A relationship target resolved to a path inside the package
#[derive(Clone, Debug, PartialEq)]
pub(super) struct Relationship {
    pub(super) target: String,
    pub(super) kind: String,
}

impl Relationship {
    /// True when the relationship type URI ends with `/{suffix}`
    pub(super) fn is(&self, suffix: &str) -> bool {
        self.kind.rsplit('/').next() == Some(suffix)
    }
}

/// Loads the relationships of a package part
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `part` - Path of the part that owns the relationships, e.g. `xl/workbook.xml`
///
/// # Returns
/// Mapping of relationship IDs to resolved targets; empty when the part has no
/// relationships file
pub(super) fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, part: &str) -> Result<HashMap<String, Relationship>, SiteSheetError> {
    let (directory, file_name) = split_part(part);
    let rels_path = if directory.is_empty() {
        format!("_rels/{file_name}.rels")
    } else {
        format!("{directory}/_rels/{file_name}.rels")
    };

    let mut relationships: HashMap<String, Relationship> = HashMap::new();
    let mut reader = match zip.xml_reader(&rels_path)? {
        Some(reader) => reader,
        None => return Ok(relationships),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            let external = event.get_attribute_value("TargetMode")?
                .map(|mode| mode == "External")
                .unwrap_or(false);
            if let Some((id, target)) = id.zip(target).filter(|_| !external) {
                relationships.insert(id.to_string(), Relationship {
                    target: resolve_part_path(directory, &target),
                    kind: kind.map(|kind| kind.to_string()).unwrap_or_default(),
                });
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the directory of its source part
///
/// # Arguments
/// * `directory` - Directory of the source part, e.g. `xl/drawings`
/// * `target` - Target as written in the relationships file
///
/// # Returns
/// Normalized path suitable for accessing files within the zip archive
pub(super) fn resolve_part_path(directory: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_owned()
    } else if directory.is_empty() {
        target
    } else {
        format!("{directory}/{target}")
    };
    for segment in joined.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Splits `xl/worksheets/sheet1.xml` into `("xl/worksheets", "sheet1.xml")`
pub(super) fn split_part(part: &str) -> (&str, &str) {
    part.rsplit_once('/').unwrap_or(("", part))
}
