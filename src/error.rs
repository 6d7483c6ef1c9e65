use thiserror::Error;

/// Fatal errors of a pipeline run. Everything that only affects a single cell,
/// band or feature collection degrades to zero-filled values instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The study boundary is empty or has zero area.
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing one of the run outputs failed.
    #[error("failed to write output: {0}")]
    Output(String),
}

/// Errors raised while reading or combining band rasters.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Neither a ModelTransformation nor a ModelTiepoint/ModelPixelScale pair is present.
    #[error("raster has no georeferencing: {0}")]
    MissingGeoreference(String),

    #[error("unsupported raster layout: {0}")]
    Unsupported(String),

    /// Bands that must be combined pixel by pixel do not share a grid.
    #[error("band {name} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Bands of matching shape that are georeferenced differently.
    #[error("band {name} is not on the same pixel grid as band {reference}")]
    TransformMismatch {
        name: String,
        reference: String,
    },
}
