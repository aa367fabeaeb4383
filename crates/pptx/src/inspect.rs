//! Template inspection: what a template offers to a payload, and the
//! autofit maintenance fix.

use crate::presentation::{Presentation, Slide};
use crate::shape::{addressable_names, shapes, ShapeKind};
use crate::style::FontProfile;
use crate::table::{column_count, table_element, table_text};
use crate::text::text_body_text;
use crate::xml::{XmlElement, XmlNode};
use pptfill_core::Result;
use serde::Serialize;
use serde_json::{json, Map, Value as Json};
use std::fmt;

const PREVIEW_CHARS: usize = 50;
const EXAMPLE_TABLE_ROWS: usize = 3;

/// How a text body reacts to text that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Autofit {
    /// `a:noAutofit`: text overflows the shape.
    Off,
    /// `a:spAutoFit`: the shape grows.
    ShapeToFitText,
    /// `a:normAutofit`: the text shrinks.
    TextToFitShape,
    /// No autofit element; the layout decides.
    Unspecified,
}

impl Autofit {
    pub fn of(tx_body: &XmlElement) -> Self {
        let Some(body_props) = tx_body.child("bodyPr") else {
            return Autofit::Unspecified;
        };
        if body_props.child("noAutofit").is_some() {
            Autofit::Off
        } else if body_props.child("spAutoFit").is_some() {
            Autofit::ShapeToFitText
        } else if body_props.child("normAutofit").is_some() {
            Autofit::TextToFitShape
        } else {
            Autofit::Unspecified
        }
    }
}

impl fmt::Display for Autofit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Autofit::Off => "off",
            Autofit::ShapeToFitText => "shape-to-fit-text",
            Autofit::TextToFitShape => "text-to-fit-shape",
            Autofit::Unspecified => "unspecified",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFieldInfo {
    pub name: String,
    pub autofit: Autofit,
    /// First-run font size in points.
    pub font_size: Option<f64>,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideInspection {
    pub slide_index: usize,
    pub text_fields: Vec<TextFieldInfo>,
    pub tables: Vec<TableInfo>,
    /// Named shapes that can't receive data (pictures, groups, charts).
    pub other_shapes: Vec<String>,
}

impl SlideInspection {
    pub fn field_count(&self) -> usize {
        self.text_fields.len() + self.tables.len()
    }
}

/// Inspection of every slide of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInspection {
    pub slides: Vec<SlideInspection>,
}

impl TemplateInspection {
    /// One warning per text field whose autofit is explicitly off.
    pub fn warnings(&self) -> Vec<String> {
        self.slides
            .iter()
            .flat_map(|slide| {
                slide
                    .text_fields
                    .iter()
                    .filter(|field| field.autofit == Autofit::Off)
                    .map(move |field| {
                        format!(
                            "slide {}: text field '{}' has autofit off; longer text will overflow the shape",
                            slide.slide_index, field.name
                        )
                    })
            })
            .collect()
    }

    /// A multi-slide payload with placeholders for every field, ready to be
    /// filled in and sent to population.
    pub fn json_definition(&self) -> Json {
        let slides: Vec<Json> = self
            .slides
            .iter()
            .filter(|slide| slide.field_count() > 0)
            .map(|slide| {
                let mut data = Map::new();
                for field in &slide.text_fields {
                    data.insert(field.name.clone(), Json::String(format!("[{}]", field.name)));
                }
                for table in &slide.tables {
                    let row: Vec<String> =
                        (1..=table.columns).map(|c| format!("Col {}", c)).collect();
                    data.insert(table.name.clone(), json!(vec![row; EXAMPLE_TABLE_ROWS]));
                }
                json!({ "slide_index": slide.slide_index, "data": data })
            })
            .collect();
        json!({ "slides": slides })
    }
}

/// Describe the fields of every slide.
pub fn inspect(presentation: &Presentation) -> Result<TemplateInspection> {
    let slides = presentation
        .slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| inspect_slide(index, slide))
        .collect::<Result<Vec<_>>>()?;
    Ok(TemplateInspection { slides })
}

fn inspect_slide(slide_index: usize, slide: &Slide) -> Result<SlideInspection> {
    let shapes = shapes(slide);
    let names = addressable_names(&shapes);
    let mut inspection = SlideInspection {
        slide_index,
        text_fields: Vec::new(),
        tables: Vec::new(),
        other_shapes: Vec::new(),
    };

    for (shape, name) in shapes.iter().zip(names) {
        let element = slide.shape(shape)?;
        match shape.kind {
            ShapeKind::Text => {
                let body = element.child("txBody");
                inspection.text_fields.push(TextFieldInfo {
                    name,
                    autofit: body.map_or(Autofit::Unspecified, Autofit::of),
                    font_size: body.and_then(|b| FontProfile::capture(b).size_points()),
                    preview: preview(&body.map(text_body_text).unwrap_or_default()),
                });
            }
            ShapeKind::Table => {
                let Some(table) = table_element(element) else {
                    continue;
                };
                let cells = table_text(table);
                inspection.tables.push(TableInfo {
                    name,
                    rows: cells.len(),
                    columns: column_count(table),
                    headers: cells.into_iter().next().unwrap_or_default(),
                });
            }
            ShapeKind::Other => inspection.other_shapes.push(name),
        }
    }

    Ok(inspection)
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

impl Presentation {
    /// Switch every top-level text shape with autofit off to shrink text on
    /// overflow. Returns the number of shapes changed.
    pub fn enable_autofit(&mut self) -> Result<usize> {
        let mut changed = 0;
        for slide in &mut self.slides {
            for shape in shapes(slide) {
                if shape.kind != ShapeKind::Text {
                    continue;
                }
                let element = slide.shape_mut(&shape)?;
                let Some(body_props) = element.find_mut(&["txBody", "bodyPr"]) else {
                    continue;
                };
                if let Some(i) = body_props.position_of("noAutofit") {
                    body_props.children[i] = XmlNode::Element(XmlElement::new("a:normAutofit"));
                    log::info!("Enabled autofit on '{}' in '{}'", shape.name, slide.part_name);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}
