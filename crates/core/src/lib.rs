//! Core domain types, payload validation, and inline markdown segmentation
//! for PowerPoint template population.

pub mod error;
pub mod markdown;
pub mod payload;
pub mod types;

pub use error::{Error, Result};
pub use markdown::{has_markdown, segment, split_paragraphs, unescape, FormattedSegment};
pub use types::{
    DataRecord, Payload, PopulationReport, PopulationResult, SlideData, SlideReport, TableMatrix,
    Value,
};
