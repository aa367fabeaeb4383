//! Relationship parts (`_rels/*.rels`) and part-path arithmetic.
//!
//! Every OOXML part that points at other parts does so through a sibling
//! relationships file mapping `rId`s to targets relative to the part's folder.

use crate::xml::{XmlDocument, XmlElement};
use pptfill_core::Result;

/// Namespace of relationship parts.
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of a slide, as referenced from the presentation part.
pub const TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `Some("External")` for URLs and other out-of-package targets.
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Whether the target lives outside the package.
    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }

    /// Whether the relationship type ends with the given short name
    /// (`slideLayout`, `notesSlide`, `image`, ...).
    pub fn is_type(&self, short: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(short)
    }
}

/// Ordered relationships of one source part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(bytes)?;
        let entries = doc
            .root
            .children_named("Relationship")
            .filter_map(|el| {
                Some(Relationship {
                    id: el.attr("Id")?.to_string(),
                    rel_type: el.attr("Type").unwrap_or_default().to_string(),
                    target: el.attr("Target")?.to_string(),
                    target_mode: el.attr("TargetMode").map(str::to_string),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// Serialize back to a `.rels` part.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.entries {
            let mut el = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if let Some(mode) = &rel.target_mode {
                el.set_attr("TargetMode", mode.as_str());
            }
            root.push_child(el);
        }
        XmlDocument::new(root).to_bytes()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry verbatim.
    pub fn push(&mut self, rel: Relationship) {
        self.entries.push(rel);
    }

    /// Add an internal relationship under a fresh `rIdN` and return the id.
    pub fn add(&mut self, rel_type: impl Into<String>, target: impl Into<String>) -> String {
        let id = self.next_id();
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.into(),
            target: target.into(),
            target_mode: None,
        });
        id
    }

    /// One above the highest numeric `rIdN` in use.
    pub fn next_id(&self) -> String {
        let max = self
            .entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }
}

/// Path of the relationships part belonging to `part`.
///
/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the folder of its source part.
///
/// Package paths carry no leading slash. `..` segments are collapsed.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Replace the file name at the end of a path or relative target.
pub fn with_file_name(path: &str, file_name: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, file_name),
        None => file_name.to_string(),
    }
}

/// Split a part file name into its alphabetic stem and extension, dropping
/// the trailing number: `image12.png` -> `("image", "png")`.
pub fn numbered_stem(file_name: &str) -> (&str, &str) {
    let (base, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    (base.trim_end_matches(|c: char| c.is_ascii_digit()), ext)
}

/// Number at the end of a part's stem: `ppt/slides/slide12.xml` -> `Some(12)`.
pub fn part_number(part: &str) -> Option<u32> {
    let file = part.rsplit('/').next()?;
    let base = file.rsplit_once('.').map(|(b, _)| b).unwrap_or(file);
    let digits = &base[base.trim_end_matches(|c: char| c.is_ascii_digit()).len()..];
    digits.parse().ok()
}
