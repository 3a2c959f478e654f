//! Entity and player state values.

use schema::{FieldCodec, FieldId, StateLayout};
use wire::ENTITY_NONE;

/// A field value in decoded form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldValue {
    Bool(bool),
    UInt(u32),
    SInt(i32),
    Float(f32),
}

impl FieldValue {
    /// The all-zero value for `codec`.
    #[must_use]
    pub const fn zero(codec: FieldCodec) -> Self {
        match codec {
            FieldCodec::Bool => Self::Bool(false),
            FieldCodec::UInt { .. } => Self::UInt(0),
            FieldCodec::SInt { .. } => Self::SInt(0),
            FieldCodec::Float => Self::Float(0.0),
        }
    }
}

pub(crate) fn zero_fields(layout: &StateLayout) -> Vec<FieldValue> {
    layout
        .fields
        .iter()
        .map(|field| FieldValue::zero(field.codec))
        .collect()
}

/// One entity as seen in a snapshot.
///
/// `number` equal to [`ENTITY_NONE`] marks a state the server removed.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntityState {
    pub number: u16,
    /// Field values in layout order.
    pub fields: Vec<FieldValue>,
}

impl EntityState {
    /// The all-zero entity, used as the delta base for baselines.
    #[must_use]
    pub fn null(layout: &StateLayout, number: u16) -> Self {
        Self {
            number,
            fields: zero_fields(layout),
        }
    }

    /// Returns `true` if the server removed this entity.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.number == ENTITY_NONE
    }

    /// Looks a field up by id.
    #[must_use]
    pub fn field(&self, layout: &StateLayout, id: FieldId) -> Option<FieldValue> {
        layout
            .index_of(id)
            .and_then(|index| self.fields.get(index).copied())
    }
}

/// The privileged per-snapshot state of the local player.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlayerState {
    /// Server time of the last input the server processed.
    pub command_time: i32,
    /// Field values in layout order.
    pub fields: Vec<FieldValue>,
}

impl PlayerState {
    /// The all-zero player, used when a snapshot has no base.
    #[must_use]
    pub fn zero(layout: &StateLayout) -> Self {
        Self {
            command_time: 0,
            fields: zero_fields(layout),
        }
    }

    /// Looks a field up by id.
    #[must_use]
    pub fn field(&self, layout: &StateLayout, id: FieldId) -> Option<FieldValue> {
        layout
            .index_of(id)
            .and_then(|index| self.fields.get(index).copied())
    }
}
