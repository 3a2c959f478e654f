//! Field codec definitions.

use crate::FieldId;

/// Widest integer field the delta format carries.
pub const MAX_FIELD_BITS: u8 = 32;

/// The encoding for a field (representation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldCodec {
    /// Boolean (1 bit).
    Bool,

    /// Unsigned integer with fixed bit width.
    UInt { bits: u8 },

    /// Signed two's complement integer with fixed bit width.
    SInt { bits: u8 },

    /// 32-bit float preceded by an "is zero" bit.
    Float,
}

impl FieldCodec {
    /// Creates a boolean field codec.
    #[must_use]
    pub const fn bool() -> Self {
        Self::Bool
    }

    /// Creates an unsigned integer field codec.
    #[must_use]
    pub const fn uint(bits: u8) -> Self {
        Self::UInt { bits }
    }

    /// Creates a signed integer field codec.
    #[must_use]
    pub const fn sint(bits: u8) -> Self {
        Self::SInt { bits }
    }

    /// Creates a float field codec.
    #[must_use]
    pub const fn float() -> Self {
        Self::Float
    }

    /// Returns the integer width, if this is an integer codec.
    #[must_use]
    pub const fn int_bits(self) -> Option<u8> {
        match self {
            Self::UInt { bits } | Self::SInt { bits } => Some(bits),
            Self::Bool | Self::Float => None,
        }
    }
}

/// Field definition within a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub id: FieldId,
    pub codec: FieldCodec,
}

impl FieldDef {
    /// Creates a field definition.
    #[must_use]
    pub const fn new(id: FieldId, codec: FieldCodec) -> Self {
        Self { id, codec }
    }
}
