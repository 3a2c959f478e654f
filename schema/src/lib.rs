//! Field layouts for the netsnap client.
//!
//! Entity and player states travel as "field bags": an ordered list of
//! fields, each with a fixed codec. This crate defines:
//! - Field codecs (bool, fixed-width integers, floats)
//! - Entity and player layouts, and the stock layouts servers use by default
//! - Validation of layout invariants
//!
//! # Design Principles
//!
//! - **Runtime layouts** - Layouts are plain data and can be loaded from configuration.
//! - **Explicit schemas** - No reflection on arbitrary Rust types.
//! - **Wire order is layout order** - Reordering fields changes the protocol.

mod error;
mod field;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use field::{FieldCodec, FieldDef, MAX_FIELD_BITS};
pub use schema::{LayoutKind, Schema, StateLayout, MAX_LAYOUT_FIELDS};

/// A field ID within a layout.
pub type FieldId = u16;

/// Field ids of the stock entity layout.
pub mod entity_field {
    use crate::FieldId;

    pub const ORIGIN_X: FieldId = 1;
    pub const ORIGIN_Y: FieldId = 2;
    pub const ORIGIN_Z: FieldId = 3;
    pub const ANGLE_PITCH: FieldId = 4;
    pub const ANGLE_YAW: FieldId = 5;
    pub const ANGLE_ROLL: FieldId = 6;
    pub const EVENT: FieldId = 7;
    pub const EVENT_PARM: FieldId = 8;
    pub const ENTITY_TYPE: FieldId = 9;
    pub const FLAGS: FieldId = 10;
    pub const MODEL_INDEX: FieldId = 11;
    pub const FRAME: FieldId = 12;
    pub const SOLID: FieldId = 13;
    pub const OTHER_ENTITY: FieldId = 14;
    pub const GROUND_ENTITY: FieldId = 15;
    pub const VISIBLE: FieldId = 16;
}

/// Field ids of the stock player layout.
pub mod player_field {
    use crate::FieldId;

    pub const ORIGIN_X: FieldId = 1;
    pub const ORIGIN_Y: FieldId = 2;
    pub const ORIGIN_Z: FieldId = 3;
    pub const VELOCITY_X: FieldId = 4;
    pub const VELOCITY_Y: FieldId = 5;
    pub const VELOCITY_Z: FieldId = 6;
    pub const VIEW_PITCH: FieldId = 7;
    pub const VIEW_YAW: FieldId = 8;
    pub const PM_TYPE: FieldId = 9;
    pub const PM_FLAGS: FieldId = 10;
    pub const CLIENT_NUM: FieldId = 11;
    pub const WEAPON: FieldId = 12;
    pub const HEALTH: FieldId = 13;
    pub const VIEW_HEIGHT: FieldId = 14;
    pub const ON_GROUND: FieldId = 15;
}
