//! Unified error handling for the landfence library.
//!
//! Geometry, drawing and scoring follow a permissive policy and report
//! insufficient input through zero/`None`/empty results. The variants here are
//! reserved for caller mistakes (driving the draw engine while idle, building a
//! field from a degenerate ring) and for data that cannot be loaded at all.

use thiserror::Error;

/// Unified error type for landfence operations.
#[derive(Debug, Error)]
pub enum LandfenceError {
    /// A ring has too few points to describe a parcel
    #[error("Field '{field_id}' has {point_count} points, minimum {minimum_required} required")]
    InsufficientPoints {
        field_id: String,
        point_count: usize,
        minimum_required: usize,
    },

    /// A draw operation was issued while no drawing session is active
    #[error("No active drawing session")]
    NotDrawing,

    /// The field store has no field with this id
    #[error("Field '{field_id}' not found")]
    FieldNotFound { field_id: String },

    /// A field with this id already exists in the store
    #[error("Field '{field_id}' already exists")]
    DuplicateField { field_id: String },

    /// User-entered data cannot describe a field
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// Snapshot JSON could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for landfence operations.
pub type Result<T> = std::result::Result<T, LandfenceError>;

/// Extension trait for converting Option to LandfenceError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a field-not-found error.
    fn ok_or_field_not_found(self, field_id: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_field_not_found(self, field_id: &str) -> Result<T> {
        self.ok_or_else(|| LandfenceError::FieldNotFound {
            field_id: field_id.to_string(),
        })
    }
}
