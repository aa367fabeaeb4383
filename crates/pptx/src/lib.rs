//! PPTX (Office Open XML) backend for template population and extraction.
//!
//! A .pptx file is a ZIP archive of XML parts. [`Presentation`] loads the
//! parts into memory, resolves the slide list, and lets the populators,
//! the slide cloner, and the extractor work on parsed slide trees before
//! the package is written back out.

pub mod clone;
pub mod extract;
pub mod inspect;
pub mod package;
pub mod populate;
pub mod presentation;
pub mod relationships;
pub mod shape;
pub mod style;
pub mod table;
pub mod text;
pub mod xml;

#[cfg(test)]
mod fixtures;

pub use extract::{extract, extract_all, extract_slide};
pub use inspect::{inspect, Autofit, SlideInspection, TableInfo, TemplateInspection, TextFieldInfo};
pub use populate::{populate, populate_json, populate_slide, PopulateOptions, PopulatedDeck};
pub use presentation::{Presentation, Slide};
pub use shape::{locate, Lookup, ShapeKind, ShapeRef};
pub use style::FontProfile;
