//! Error types for PowerPoint template population and extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while populating or extracting a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input is not a well-formed OOXML presentation package.
    #[error("Invalid presentation package: {0}")]
    InvalidPackage(String),

    /// The JSON payload is malformed or has the wrong shape.
    #[error("Invalid data payload: {0}")]
    InvalidPayload(String),

    /// A slide index does not exist in the template.
    #[error("Slide index {index} out of range (template has {count} slides)")]
    SlideIndexOutOfRange { index: usize, count: usize },

    /// A field did not resolve to a shape (raised only in strict mode).
    #[error("Shape '{name}' not found on slide {slide_index}")]
    ShapeNotFound { slide_index: usize, name: String },

    /// Unexpected failure while rewriting document internals.
    #[error("Internal processing error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by the engine.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPackage(_)
                | Error::InvalidPayload(_)
                | Error::SlideIndexOutOfRange { .. }
                | Error::ShapeNotFound { .. }
        )
    }
}
