//! Shape Locator: field name to top-level shape in a slide's shape tree.

use crate::presentation::Slide;
use crate::xml::{XmlElement, XmlNode};
use pptfill_core::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// `name_N` addressing of the N-th (0-based) shape sharing `name`.
static DUPLICATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)_(\d+)$").unwrap());

/// Shape-tree children that are tree properties, not shapes.
const TREE_PROPERTIES: &[&str] = &["nvGrpSpPr", "grpSpPr", "extLst"];

/// What the engine can do with a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `p:sp`: holds (or can hold) a text body.
    Text,
    /// `p:graphicFrame` wrapping an `a:tbl`.
    Table,
    /// Pictures, groups, connectors, charts, ...
    Other,
}

/// A named top-level shape on one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRef {
    pub name: String,
    pub kind: ShapeKind,
    /// Index of the shape element in the shape tree's child list.
    pub(crate) position: usize,
}

/// Result of resolving a field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Text(ShapeRef),
    Table(ShapeRef),
    NotFound,
}

/// Name from the shape's non-visual properties (`p:nvSpPr/p:cNvPr@name`
/// and its siblings for other shape kinds).
pub fn shape_name(shape: &XmlElement) -> Option<&str> {
    shape
        .elements()
        .find(|el| el.local_name().starts_with("nv"))
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|props| props.attr("name"))
}

pub fn shape_kind(shape: &XmlElement) -> ShapeKind {
    match shape.local_name() {
        "sp" => ShapeKind::Text,
        "graphicFrame" if shape.find(&["graphic", "graphicData", "tbl"]).is_some() => {
            ShapeKind::Table
        }
        _ => ShapeKind::Other,
    }
}

/// Every named top-level shape in document order. Group contents are not
/// descended into.
pub fn shapes(slide: &Slide) -> Vec<ShapeRef> {
    let Some(tree) = slide.shape_tree() else {
        return Vec::new();
    };

    tree.children
        .iter()
        .enumerate()
        .filter_map(|(position, node)| match node {
            XmlNode::Element(el) if !TREE_PROPERTIES.contains(&el.local_name()) => {
                let name = shape_name(el)?;
                if name.is_empty() {
                    return None;
                }
                Some(ShapeRef {
                    name: name.to_string(),
                    kind: shape_kind(el),
                    position,
                })
            }
            _ => None,
        })
        .collect()
}

/// Resolve a field name to a text or table shape.
///
/// An exact, case-sensitive match wins, first in document order. Failing
/// that, `base_N` picks the N-th shape named `base`. `Other` shapes are
/// reported as `NotFound`.
pub fn locate(slide: &Slide, name: &str) -> Lookup {
    let shapes = shapes(slide);

    let found = shapes.iter().find(|s| s.name == name).or_else(|| {
        let caps = DUPLICATE_SUFFIX.captures(name)?;
        let base = caps.get(1)?.as_str();
        let nth: usize = caps.get(2)?.as_str().parse().ok()?;
        shapes.iter().filter(|s| s.name == base).nth(nth)
    });

    match found {
        Some(shape) => match shape.kind {
            ShapeKind::Text => Lookup::Text(shape.clone()),
            ShapeKind::Table => Lookup::Table(shape.clone()),
            ShapeKind::Other => {
                log::debug!("Shape '{}' is neither text nor table", name);
                Lookup::NotFound
            }
        },
        None => Lookup::NotFound,
    }
}

/// Field names for every shape, `_N`-suffixed for repeated names so each
/// name resolves back to its own shape through [`locate`].
pub fn addressable_names(shapes: &[ShapeRef]) -> Vec<String> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let earlier = shapes[..i].iter().filter(|s| s.name == shape.name).count();
            if earlier == 0 {
                shape.name.clone()
            } else {
                format!("{}_{}", shape.name, earlier)
            }
        })
        .collect()
}

impl Slide {
    /// The shape element a [`ShapeRef`] points at.
    pub fn shape(&self, shape: &ShapeRef) -> Result<&XmlElement> {
        self.shape_tree()
            .and_then(|tree| tree.children.get(shape.position))
            .and_then(|node| match node {
                XmlNode::Element(el) => Some(el),
                _ => None,
            })
            .ok_or_else(|| stale(shape))
    }

    pub fn shape_mut(&mut self, shape: &ShapeRef) -> Result<&mut XmlElement> {
        self.shape_tree_mut()
            .and_then(|tree| tree.children.get_mut(shape.position))
            .and_then(|node| match node {
                XmlNode::Element(el) => Some(el),
                _ => None,
            })
            .ok_or_else(|| stale(shape))
    }
}

fn stale(shape: &ShapeRef) -> Error {
    Error::Internal(format!("shape '{}' is no longer in the shape tree", shape.name))
}
