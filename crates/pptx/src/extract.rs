//! Data Extractor: reads shapes back into populate-ready field maps.
//!
//! Text comes back verbatim; run formatting is not turned back into markers.

use crate::presentation::{Presentation, Slide};
use crate::shape::{addressable_names, shapes, ShapeKind};
use crate::table::{table_element, table_text};
use crate::text::text_body_text;
use pptfill_core::{DataRecord, Payload, Result, SlideData, TableMatrix, Value};

/// Field map of one slide: text shapes as text, tables as full matrices
/// (header included). Repeated names get `_N` suffixes.
pub fn extract_slide(slide: &Slide) -> Result<DataRecord> {
    let shapes = shapes(slide);
    let names = addressable_names(&shapes);
    let mut record = DataRecord::new();

    for (shape, name) in shapes.iter().zip(names) {
        let element = slide.shape(shape)?;
        let value = match shape.kind {
            ShapeKind::Text => Value::Text(
                element
                    .child("txBody")
                    .map(text_body_text)
                    .unwrap_or_default(),
            ),
            ShapeKind::Table => match table_element(element) {
                Some(table) => Value::Table(TableMatrix::new(table_text(table))),
                None => continue,
            },
            ShapeKind::Other => continue,
        };
        record.insert(name, value);
    }

    log::debug!(
        "Extracted {} field(s) from '{}'",
        record.len(),
        slide.part_name()
    );
    Ok(record)
}

/// Every slide in presentation order.
pub fn extract_all(presentation: &Presentation) -> Result<Vec<SlideData>> {
    presentation
        .slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| Ok(SlideData::new(index, extract_slide(slide)?)))
        .collect()
}

/// One slide as a flat field map, or all slides in the multi-slide form.
pub fn extract(presentation: &Presentation, slide_index: Option<usize>) -> Result<Payload> {
    presentation.ensure_has_slides()?;
    match slide_index {
        Some(index) => Ok(Payload::Single(extract_slide(presentation.slide(index)?)?)),
        None => Ok(Payload::Multi {
            slides: extract_all(presentation)?,
        }),
    }
}
