//! Error types for RPIM operations.

use thiserror::Error;

/// Result type alias using the RPIM Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or evaluating an RPIM model.
#[derive(Error, Debug)]
pub enum Error {
    /// The mesh has no nodes.
    #[error("mesh has no nodes")]
    EmptyMesh,

    /// Mesh construction errors.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// An element references a node that does not exist after reindexing.
    #[error("index consistency violation: {0}")]
    IndexConsistency(String),

    /// Invalid RPIM or quadrature parameters.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Invalid material properties.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Support domain too small to evaluate shape functions.
    #[error("insufficient support: found {found} nodes, {required} required")]
    InsufficientSupport { found: usize, required: usize },

    /// Moment matrix G cannot be inverted.
    #[error("singular moment matrix: {0}")]
    SingularMomentMatrix(String),

    /// Evaluation failed at a specific support-domain point.
    #[error("evaluation failed at point {point}: {source}")]
    PointEvaluation {
        point: usize,
        #[source]
        source: Box<Error>,
    },

    /// Vector or matrix size does not match the model.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Global assembly errors.
    #[error("assembly error: {0}")]
    Assembly(String),
}

impl Error {
    /// Attach the index of the point whose evaluation failed.
    pub fn at_point(self, point: usize) -> Self {
        Error::PointEvaluation {
            point,
            source: Box::new(self),
        }
    }

    /// Index of the failing point, if this error carries one.
    pub fn point(&self) -> Option<usize> {
        match self {
            Error::PointEvaluation { point, .. } => Some(*point),
            _ => None,
        }
    }
}
