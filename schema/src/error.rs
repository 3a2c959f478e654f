//! Schema validation errors.

use std::fmt;

use crate::{FieldId, LayoutKind};

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Duplicate field ID within a layout.
    DuplicateFieldId { layout: LayoutKind, field: FieldId },

    /// Invalid bit width for fixed-width integers.
    InvalidBitWidth { field: FieldId, bits: u8 },

    /// The delta header counts fields in one byte.
    TooManyFields {
        layout: LayoutKind,
        count: usize,
        max: usize,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFieldId { layout, field } => {
                write!(f, "duplicate field id {field} in {layout} layout")
            }
            Self::InvalidBitWidth { field, bits } => {
                write!(f, "field {field}: invalid bit width {bits}")
            }
            Self::TooManyFields { layout, count, max } => {
                write!(f, "{layout} layout has {count} fields, max {max}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
