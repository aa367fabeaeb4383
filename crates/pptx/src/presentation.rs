//! The opened template document: package, presentation part, and slides in
//! presentation order.

use crate::package::{unused_part_name, ContentTypes, PptxPackage, CONTENT_TYPES_PART};
use crate::relationships::{rels_path_for, resolve_target, Relationships};
use crate::xml::{local_name, XmlDocument, XmlElement};
use pptfill_core::{Error, Result};

/// Package-level relationships part.
const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// Fallback location of the main presentation part.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Content type of a slide part.
pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Lowest slide id PowerPoint accepts in `p:sldIdLst`.
const MIN_SLIDE_ID: u32 = 256;

/// One slide: its part, its entry in the presentation, and its parsed XML.
#[derive(Debug, Clone)]
pub struct Slide {
    pub(crate) part_name: String,
    pub(crate) rel_id: String,
    pub(crate) slide_id: u32,
    pub(crate) xml: XmlDocument,
    pub(crate) rels: Relationships,
}

impl Slide {
    /// Package path of the slide part, e.g. `ppt/slides/slide1.xml`.
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// The `p:sldId` id.
    pub fn slide_id(&self) -> u32 {
        self.slide_id
    }

    pub fn relationships(&self) -> &Relationships {
        &self.rels
    }

    /// The slide's `p:cSld/p:spTree`.
    pub fn shape_tree(&self) -> Option<&XmlElement> {
        self.xml.root.find(&["cSld", "spTree"])
    }

    pub fn shape_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root.find_mut(&["cSld", "spTree"])
    }
}

/// A presentation package opened for population, extraction, or inspection.
///
/// Edits stay in memory until [`Presentation::to_bytes`]; the source bytes
/// are never touched.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub(crate) package: PptxPackage,
    pub(crate) content_types: ContentTypes,
    main_part: String,
    document: XmlDocument,
    pub(crate) relationships: Relationships,
    pub(crate) slides: Vec<Slide>,
}

impl Presentation {
    /// Open a presentation from uploaded bytes.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        Self::from_package(PptxPackage::from_bytes(bytes)?)
    }

    /// Resolve the presentation part and its slides inside a loaded package.
    pub fn from_package(package: PptxPackage) -> Result<Self> {
        let content_types = ContentTypes::parse(package.require(CONTENT_TYPES_PART)?)?;
        let main_part = main_part_name(&package)?;
        let document = package.require_xml(&main_part)?;
        if !document.root.is("presentation") {
            return Err(Error::InvalidPackage(format!(
                "'{}' is not a presentation part",
                main_part
            )));
        }
        let relationships = Relationships::parse(package.require(&rels_path_for(&main_part))?)?;

        let mut slides = Vec::new();
        if let Some(list) = document.root.child("sldIdLst") {
            for entry in list.children_named("sldId") {
                slides.push(load_slide(&package, &main_part, &relationships, entry)?);
            }
        }

        log::debug!(
            "Opened presentation '{}' with {} slide(s)",
            main_part,
            slides.len()
        );

        Ok(Self {
            package,
            content_types,
            main_part,
            document,
            relationships,
            slides,
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Result<&Slide> {
        let count = self.slides.len();
        self.slides
            .get(index)
            .ok_or(Error::SlideIndexOutOfRange { index, count })
    }

    pub fn slide_mut(&mut self, index: usize) -> Result<&mut Slide> {
        let count = self.slides.len();
        self.slides
            .get_mut(index)
            .ok_or(Error::SlideIndexOutOfRange { index, count })
    }

    /// Fail with `InvalidPackage` when there is nothing to work on.
    pub fn ensure_has_slides(&self) -> Result<()> {
        if self.slides.is_empty() {
            return Err(Error::InvalidPackage(
                "presentation has no slides".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the main presentation part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// A part name like `like` that no package part, slide, or `reserved`
    /// name uses yet.
    pub(crate) fn unused_part_name(&self, like: &str, reserved: &[String]) -> String {
        let taken = self
            .package
            .part_names()
            .chain(self.slides.iter().map(|s| s.part_name.as_str()))
            .chain(reserved.iter().map(String::as_str));
        unused_part_name(like, taken)
    }

    /// Serialize the whole package, slides in their current order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();

        let mut document = self.document.clone();
        rebuild_slide_list(&mut document.root, &self.slides);
        package.set(self.main_part.clone(), document.to_bytes()?);
        package.set(rels_path_for(&self.main_part), self.relationships.to_bytes()?);

        for slide in &self.slides {
            package.set(slide.part_name.clone(), slide.xml.to_bytes()?);
            let rels_part = rels_path_for(&slide.part_name);
            if !slide.rels.is_empty() || package.contains(&rels_part) {
                package.set(rels_part, slide.rels.to_bytes()?);
            }
        }

        package.set(CONTENT_TYPES_PART, self.content_types.to_bytes()?);
        package.to_bytes()
    }
}

/// Target of the package's officeDocument relationship, or the usual path.
fn main_part_name(package: &PptxPackage) -> Result<String> {
    let Some(bytes) = package.get(PACKAGE_RELS_PART) else {
        return Ok(PRESENTATION_PART.to_string());
    };
    let rels = Relationships::parse(bytes)?;
    let main = rels
        .iter()
        .find(|r| r.is_type("officeDocument") && !r.is_external())
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| PRESENTATION_PART.to_string());
    Ok(main)
}

/// The `r:id` attribute of a `p:sldId`, whatever its prefix.
fn relationship_attr(element: &XmlElement) -> Option<&str> {
    element
        .attributes
        .iter()
        .find(|(key, _)| key.contains(':') && local_name(key) == "id")
        .map(|(_, value)| value.as_str())
}

fn load_slide(
    package: &PptxPackage,
    main_part: &str,
    relationships: &Relationships,
    entry: &XmlElement,
) -> Result<Slide> {
    let rel_id = relationship_attr(entry)
        .ok_or_else(|| Error::InvalidPackage("slide entry without r:id".to_string()))?;
    let slide_id = entry
        .attr("id")
        .and_then(|id| id.parse::<u32>().ok())
        .ok_or_else(|| Error::InvalidPackage(format!("slide '{}' has no numeric id", rel_id)))?;
    let rel = relationships.get(rel_id).ok_or_else(|| {
        Error::InvalidPackage(format!("slide relationship '{}' not found", rel_id))
    })?;

    let part_name = resolve_target(main_part, &rel.target);
    let xml = package.require_xml(&part_name)?;
    let rels = match package.get(&rels_path_for(&part_name)) {
        Some(bytes) => Relationships::parse(bytes)?,
        None => Relationships::new(),
    };

    Ok(Slide {
        part_name,
        rel_id: rel_id.to_string(),
        slide_id,
        xml,
        rels,
    })
}

/// Write the current slide order into `p:sldIdLst`.
///
/// Entries of slides that were already listed are kept as they are (extra
/// attributes and `p:extLst` included) and only move; slides added since
/// loading get new entries using the prefixes the list already uses.
fn rebuild_slide_list(root: &mut XmlElement, slides: &[Slide]) {
    let prefix = root.name.split_once(':').map(|(p, _)| p.to_string());
    let qualified = |local: &str| match prefix.as_deref() {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    };

    let position = ["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"]
        .iter()
        .filter_map(|name| root.position_of(name))
        .max()
        .map(|i| i + 1)
        .unwrap_or(0);
    if root.child("sldIdLst").is_none() {
        root.insert_child(position, XmlElement::new(qualified("sldIdLst")));
    }
    let default_entry = qualified("sldId");
    let Some(list) = root.child_mut("sldIdLst") else {
        return;
    };

    let mut existing: Vec<XmlElement> = list.children_named("sldId").cloned().collect();
    let entry_name = existing
        .first()
        .map(|el| el.name.clone())
        .unwrap_or(default_entry);
    let rel_key = existing
        .iter()
        .find_map(|el| {
            el.attributes
                .iter()
                .find(|(key, _)| key.contains(':') && local_name(key) == "id")
                .map(|(key, _)| key.clone())
        })
        .unwrap_or_else(|| "r:id".to_string());

    list.remove_children("sldId");
    for slide in slides {
        let listed = existing
            .iter()
            .position(|el| relationship_attr(el) == Some(slide.rel_id.as_str()));
        let mut entry = match listed {
            Some(i) => existing.swap_remove(i),
            None => XmlElement::new(entry_name.as_str())
                .with_attr("id", "")
                .with_attr(rel_key.as_str(), slide.rel_id.as_str()),
        };
        entry.set_attr("id", slide.slide_id.to_string());
        list.push_child(entry);
    }
}

/// One above the highest slide id in use, at least the format minimum.
pub(crate) fn next_slide_id(slides: &[Slide]) -> u32 {
    slides
        .iter()
        .map(|s| s.slide_id + 1)
        .max()
        .unwrap_or(MIN_SLIDE_ID)
        .max(MIN_SLIDE_ID)
}
