//! Text Populator: replaces the paragraphs of a text body with a field value.

use crate::style::FontProfile;
use crate::xml::XmlElement;
use pptfill_core::{has_markdown, segment, split_paragraphs, unescape, Error, Result};

/// Fill a `p:sp` shape with `value`, creating its text body if it has none.
///
/// Size and autofit settings on `a:bodyPr` are left as they are.
pub fn populate_text_shape(shape: &mut XmlElement, value: &str) -> Result<()> {
    write_text_body(ensure_text_body(shape, "p")?, value);
    Ok(())
}

/// Replace every paragraph of a text body with the lines of `value`.
///
/// The font profile and the first paragraph's `a:pPr`/`a:endParaRPr` are
/// captured before anything is removed and reapplied to each new paragraph.
/// Lines without markers get one plain run; lines with markers are
/// segmented into styled runs. Empty lines get no run.
pub fn write_text_body(tx_body: &mut XmlElement, value: &str) {
    let profile = FontProfile::capture(tx_body);
    let template = tx_body.child("p");
    let paragraph_props = template.and_then(|p| p.child("pPr")).cloned();
    let end_props = template.and_then(|p| p.child("endParaRPr")).cloned();

    let insert_at = tx_body
        .position_of("p")
        .or_else(|| tx_body.position_of("lstStyle").map(|i| i + 1))
        .or_else(|| tx_body.position_of("bodyPr").map(|i| i + 1))
        .unwrap_or(0);
    tx_body.remove_children("p");

    for (offset, line) in split_paragraphs(value).enumerate() {
        let mut paragraph = XmlElement::new("a:p");
        if let Some(props) = &paragraph_props {
            paragraph.push_child(props.clone());
        }

        let runs = if has_markdown(line) {
            profile.styled_runs(&segment(line))
        } else if line.is_empty() {
            Vec::new()
        } else {
            vec![profile.plain_run(&unescape(line))]
        };
        for run in runs {
            paragraph.push_child(run);
        }

        if let Some(props) = &end_props {
            paragraph.push_child(props.clone());
        }
        tx_body.insert_child(insert_at + offset, paragraph);
    }
}

/// The shape's text body, created empty if missing.
///
/// `prefix` is the namespace prefix of the body element: `p` on slide
/// shapes, where the body goes before any `extLst`, and `a` in table cells,
/// where it must be the cell's first child.
pub(crate) fn ensure_text_body<'a>(
    shape: &'a mut XmlElement,
    prefix: &str,
) -> Result<&'a mut XmlElement> {
    if shape.child("txBody").is_none() {
        let body = XmlElement::new(format!("{}:txBody", prefix))
            .with_child(XmlElement::new("a:bodyPr"))
            .with_child(XmlElement::new("a:lstStyle"))
            .with_child(XmlElement::new("a:p"));
        let position = if prefix == "a" {
            0
        } else {
            shape.position_of("extLst").unwrap_or(shape.children.len())
        };
        shape.insert_child(position, body);
    }

    shape
        .child_mut("txBody")
        .ok_or_else(|| Error::Internal(format!("<{}> has no text body", shape_label(prefix))))
}

fn shape_label(prefix: &str) -> &'static str {
    if prefix == "a" {
        "a:tc"
    } else {
        "p:sp"
    }
}

/// Plain text of a text body: paragraphs joined with `\n`, line breaks
/// inside a paragraph as `\n`.
pub fn text_body_text(tx_body: &XmlElement) -> String {
    tx_body
        .children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for el in paragraph.elements() {
        match el.local_name() {
            "r" | "fld" => {
                if let Some(t) = el.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}
