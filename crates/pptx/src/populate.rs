//! Population of a template from a payload: slide selection, cloning,
//! per-field dispatch to the text and table populators.

use crate::presentation::{Presentation, Slide};
use crate::shape::{locate, Lookup};
use crate::table::populate_table;
use crate::text::populate_text_shape;
use pptfill_core::{
    DataRecord, Error, Payload, PopulationReport, PopulationResult, Result, SlideReport, Value,
};

/// Options for a population request.
#[derive(Debug, Clone, Default)]
pub struct PopulateOptions {
    /// Template slide the single-slide payload form writes to.
    slide_index: usize,
    /// Whether an unmatched field aborts the request.
    strict: bool,
}

impl PopulateOptions {
    /// Options with slide 0 as the single-slide target and strict mode off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template slide for single-slide payloads.
    pub fn with_slide_index(mut self, index: usize) -> Self {
        self.slide_index = index;
        self
    }

    /// Turn unmatched fields into [`Error::ShapeNotFound`].
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn slide_index(&self) -> usize {
        self.slide_index
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

/// A populated presentation and what was written into it.
#[derive(Debug, Clone)]
pub struct PopulatedDeck {
    pub bytes: Vec<u8>,
    pub report: PopulationReport,
}

/// Populate template bytes from a JSON payload.
///
/// The payload is validated before the package is opened; nothing is
/// returned unless every step succeeds.
pub fn populate_json(template: &[u8], json: &str, options: &PopulateOptions) -> Result<PopulatedDeck> {
    let payload = Payload::from_json_str(json)?;
    populate(template, &payload, options)
}

/// Populate template bytes from a validated payload.
pub fn populate(template: &[u8], payload: &Payload, options: &PopulateOptions) -> Result<PopulatedDeck> {
    let mut presentation = Presentation::open(template)?;
    let report = presentation.populate(payload, options)?;
    let bytes = presentation.to_bytes()?;
    log::info!("{}", report.summary());
    Ok(PopulatedDeck { bytes, report })
}

impl Presentation {
    /// Populate this presentation in memory.
    ///
    /// The first pair naming a template slide fills that slide; every later
    /// pair naming it fills a duplicate taken before any population. With
    /// the multi-slide form, populated slides come first in payload order,
    /// followed by the template slides no pair named.
    pub fn populate(&mut self, payload: &Payload, options: &PopulateOptions) -> Result<PopulationReport> {
        self.ensure_has_slides()?;

        let pairs: Vec<(usize, &DataRecord)> = match payload {
            Payload::Multi { slides } => slides.iter().map(|s| (s.slide_index, &s.data)).collect(),
            Payload::Single(record) => vec![(options.slide_index, record)],
        };

        let count = self.slide_count();
        if let Some(&(index, _)) = pairs.iter().find(|(index, _)| *index >= count) {
            return Err(Error::SlideIndexOutOfRange { index, count });
        }

        let mut used = vec![false; count];
        let mut targets = Vec::with_capacity(pairs.len());
        for &(index, _) in &pairs {
            if used[index] {
                targets.push((self.duplicate_slide(index)?, true));
            } else {
                used[index] = true;
                targets.push((index, false));
            }
        }

        let multi_slide = payload.is_multi_slide();
        let mut report = PopulationReport {
            multi_slide,
            slides: Vec::with_capacity(pairs.len()),
        };

        for (position, (&(index, record), &(target, cloned))) in pairs.iter().zip(&targets).enumerate() {
            let result = populate_slide(self.slide_mut(target)?, record)?;
            if options.strict {
                if let Some(name) = result.unmatched.first() {
                    return Err(Error::ShapeNotFound {
                        slide_index: index,
                        name: name.clone(),
                    });
                }
            }
            report.slides.push(SlideReport {
                slide_index: index,
                position: if multi_slide { position } else { target },
                cloned,
                result,
            });
        }

        if multi_slide {
            let mut order: Vec<usize> = targets.iter().map(|&(target, _)| target).collect();
            order.extend((0..count).filter(|&i| !used[i]));
            self.reorder_slides(&order)?;
        }

        Ok(report)
    }
}

/// Write every field of `record` into its shape on `slide`.
///
/// Names without a shape, and values of the wrong kind for their shape,
/// are recorded as unmatched.
pub fn populate_slide(slide: &mut Slide, record: &DataRecord) -> Result<PopulationResult> {
    let mut result = PopulationResult::default();

    for (name, value) in record.iter() {
        match (locate(slide, name), value) {
            (Lookup::Text(shape), Value::Text(text)) => {
                populate_text_shape(slide.shape_mut(&shape)?, text)?;
                log::debug!("Populated text field '{}'", name);
                result.record_match(name);
            }
            (Lookup::Table(shape), Value::Table(matrix)) => {
                populate_table(slide.shape_mut(&shape)?, matrix, record.skips_header(name))?;
                log::debug!("Populated table '{}' with {} row(s)", name, matrix.row_count());
                result.record_match(name);
            }
            (Lookup::NotFound, _) => {
                log::warn!("No shape named '{}' on '{}'", name, slide.part_name());
                result.record_miss(name);
            }
            (_, value) => {
                log::warn!(
                    "Shape '{}' on '{}' cannot take a {} value",
                    name,
                    slide.part_name(),
                    value.kind()
                );
                result.record_miss(name);
            }
        }
    }

    Ok(result)
}
