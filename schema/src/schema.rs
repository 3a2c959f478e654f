//! State layouts and validation.

use std::collections::HashSet;
use std::fmt;

use crate::error::{SchemaError, SchemaResult};
use crate::{FieldCodec, FieldDef, FieldId, MAX_FIELD_BITS};

/// Largest number of fields a layout may hold.
///
/// The delta header stores the count of leading fields considered in a byte.
pub const MAX_LAYOUT_FIELDS: usize = u8::MAX as usize;

/// Which of the two layouts of a schema a layout describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutKind {
    Entity,
    Player,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// Ordered field definitions of a state "field bag".
///
/// Field order is wire order: index `i` in the layout is index `i` in the
/// delta's changed-bit run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateLayout {
    pub fields: Vec<FieldDef>,
}

impl StateLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layout with the provided fields.
    #[must_use]
    pub fn with_fields(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Adds a field to the layout.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the wire index of the field with `id`.
    #[must_use]
    pub fn index_of(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    fn validate(&self, kind: LayoutKind) -> SchemaResult<()> {
        if self.fields.len() > MAX_LAYOUT_FIELDS {
            return Err(SchemaError::TooManyFields {
                layout: kind,
                count: self.fields.len(),
                max: MAX_LAYOUT_FIELDS,
            });
        }
        let mut field_ids = HashSet::new();
        for field in &self.fields {
            if !field_ids.insert(field.id) {
                return Err(SchemaError::DuplicateFieldId {
                    layout: kind,
                    field: field.id,
                });
            }
            validate_field(field)?;
        }
        Ok(())
    }
}

/// Entity and player layouts used by one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    pub entity: StateLayout,
    pub player: StateLayout,
}

impl Schema {
    /// Creates a schema from its two layouts after validation.
    pub fn new(entity: StateLayout, player: StateLayout) -> SchemaResult<Self> {
        let schema = Self { entity, player };
        schema.validate()?;
        Ok(schema)
    }

    /// Validates schema invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        self.entity.validate(LayoutKind::Entity)?;
        self.player.validate(LayoutKind::Player)
    }

    /// Returns the layout of `kind`.
    #[must_use]
    pub fn layout(&self, kind: LayoutKind) -> &StateLayout {
        match kind {
            LayoutKind::Entity => &self.entity,
            LayoutKind::Player => &self.player,
        }
    }

    /// The stock arena-shooter layouts.
    #[must_use]
    pub fn standard() -> Self {
        use crate::{entity_field as e, player_field as p};

        let entity = StateLayout::new()
            .field(FieldDef::new(e::ORIGIN_X, FieldCodec::float()))
            .field(FieldDef::new(e::ORIGIN_Y, FieldCodec::float()))
            .field(FieldDef::new(e::ORIGIN_Z, FieldCodec::float()))
            .field(FieldDef::new(e::ANGLE_PITCH, FieldCodec::float()))
            .field(FieldDef::new(e::ANGLE_YAW, FieldCodec::float()))
            .field(FieldDef::new(e::ANGLE_ROLL, FieldCodec::float()))
            .field(FieldDef::new(e::EVENT, FieldCodec::uint(10)))
            .field(FieldDef::new(e::EVENT_PARM, FieldCodec::uint(8)))
            .field(FieldDef::new(e::ENTITY_TYPE, FieldCodec::uint(8)))
            .field(FieldDef::new(e::FLAGS, FieldCodec::uint(19)))
            .field(FieldDef::new(e::MODEL_INDEX, FieldCodec::uint(9)))
            .field(FieldDef::new(e::FRAME, FieldCodec::uint(16)))
            .field(FieldDef::new(e::SOLID, FieldCodec::uint(24)))
            .field(FieldDef::new(e::OTHER_ENTITY, FieldCodec::uint(10)))
            .field(FieldDef::new(e::GROUND_ENTITY, FieldCodec::uint(10)))
            .field(FieldDef::new(e::VISIBLE, FieldCodec::bool()));

        let player = StateLayout::new()
            .field(FieldDef::new(p::ORIGIN_X, FieldCodec::float()))
            .field(FieldDef::new(p::ORIGIN_Y, FieldCodec::float()))
            .field(FieldDef::new(p::ORIGIN_Z, FieldCodec::float()))
            .field(FieldDef::new(p::VELOCITY_X, FieldCodec::float()))
            .field(FieldDef::new(p::VELOCITY_Y, FieldCodec::float()))
            .field(FieldDef::new(p::VELOCITY_Z, FieldCodec::float()))
            .field(FieldDef::new(p::VIEW_PITCH, FieldCodec::float()))
            .field(FieldDef::new(p::VIEW_YAW, FieldCodec::float()))
            .field(FieldDef::new(p::PM_TYPE, FieldCodec::uint(8)))
            .field(FieldDef::new(p::PM_FLAGS, FieldCodec::uint(16)))
            .field(FieldDef::new(p::CLIENT_NUM, FieldCodec::uint(8)))
            .field(FieldDef::new(p::WEAPON, FieldCodec::uint(7)))
            .field(FieldDef::new(p::HEALTH, FieldCodec::sint(16)))
            .field(FieldDef::new(p::VIEW_HEIGHT, FieldCodec::sint(8)))
            .field(FieldDef::new(p::ON_GROUND, FieldCodec::bool()));

        Self { entity, player }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate_field(field: &FieldDef) -> SchemaResult<()> {
    if let Some(bits) = field.codec.int_bits() {
        if bits == 0 || bits > MAX_FIELD_BITS {
            return Err(SchemaError::InvalidBitWidth {
                field: field.id,
                bits,
            });
        }
    }
    Ok(())
}
