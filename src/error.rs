//! Error types for facet layout, aesthetic binding and dispatch.

use thiserror::Error;

/// Result type alias using [`FacetError`].
pub type Result<T> = std::result::Result<T, FacetError>;

/// Errors raised by the faceting core.
///
/// All of them are raised at the call that detects them and none are retried;
/// a `map` call that fails leaves the artifact store partially filled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacetError {
    /// A requested dimension is absent from every relevant variable.
    #[error("Dimension '{dim}' not found in any variable")]
    DimensionNotFound { dim: String },

    /// Variables disagree on presence or size of required facet dimensions,
    /// or the same dimension was requested for both rows and columns.
    #[error("Facet alignment error: {0}")]
    FacetAlignment(String),

    /// Preprocessed data was requested but never attached.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// An aesthetic has no values to tile over its dimensions.
    #[error("Cannot broadcast aesthetic '{key}': no values supplied for {required} slots")]
    BroadcastLength { key: String, required: usize },

    /// Invalid argument (zero column wrap, unknown variable, bad probability...).
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// Array payload does not match its declared dimensions.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Empty data provided where non-empty is required.
    #[error("Empty data provided")]
    EmptyData,

    /// Failure reported by a rendering backend.
    #[error("Backend error: {0}")]
    Backend(String),
}
