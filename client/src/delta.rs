//! Field-bag delta decoding.
//!
//! A delta names how many leading fields it covers in one byte, then carries
//! one "changed" bit per covered field followed by the new value when set.
//! Fields that are not covered, or not changed, are copied from the base.
//! The number of bits consumed never depends on the base values, so a delta
//! can be decoded against any base and still leave the reader in sync.

use bitstream::BitReader;
use schema::{FieldCodec, StateLayout};
use tracing::trace;
use wire::ENTITY_NONE;

use crate::entity::{zero_fields, EntityState, FieldValue, PlayerState};
use crate::error::{ClientError, ClientResult};

/// Decodes the delta for entity `number` against `base`.
///
/// The entity number has already been read. A set "remove" bit yields a
/// zeroed state numbered [`ENTITY_NONE`].
pub fn read_entity_delta(
    reader: &mut BitReader<'_>,
    layout: &StateLayout,
    base: &EntityState,
    number: u16,
) -> ClientResult<EntityState> {
    if reader.read_bit()? {
        trace!(number, "entity removed");
        return Ok(EntityState {
            number: ENTITY_NONE,
            fields: zero_fields(layout),
        });
    }
    if !reader.read_bit()? {
        return Ok(EntityState {
            number,
            fields: base.fields.clone(),
        });
    }
    let fields = read_field_bag(reader, layout, &base.fields)?;
    Ok(EntityState { number, fields })
}

/// Decodes a player state delta against `base`.
pub fn read_player_delta(
    reader: &mut BitReader<'_>,
    layout: &StateLayout,
    base: &PlayerState,
) -> ClientResult<PlayerState> {
    let command_time = if reader.read_bit()? {
        reader.read_i32()?
    } else {
        base.command_time
    };
    let fields = read_field_bag(reader, layout, &base.fields)?;
    Ok(PlayerState {
        command_time,
        fields,
    })
}

/// Decodes the changed-field run of a delta on top of `base`.
///
/// `base` may be shorter than the layout (a never-written pool slot); missing
/// values read as zero.
pub fn read_field_bag(
    reader: &mut BitReader<'_>,
    layout: &StateLayout,
    base: &[FieldValue],
) -> ClientResult<Vec<FieldValue>> {
    let last_changed = usize::from(reader.read_u8()?);
    if last_changed > layout.len() {
        return Err(ClientError::FieldCount {
            claimed: last_changed,
            layout: layout.len(),
        });
    }

    let mut fields = Vec::with_capacity(layout.len());
    for (index, field) in layout.fields.iter().enumerate() {
        let current = base
            .get(index)
            .copied()
            .unwrap_or(FieldValue::zero(field.codec));
        if index < last_changed && reader.read_bit()? {
            fields.push(read_field_value(reader, field.codec)?);
        } else {
            fields.push(current);
        }
    }
    Ok(fields)
}

/// Reads a single value encoded with `codec`.
pub fn read_field_value(reader: &mut BitReader<'_>, codec: FieldCodec) -> ClientResult<FieldValue> {
    match codec {
        FieldCodec::Bool => Ok(FieldValue::Bool(reader.read_bit()?)),
        FieldCodec::UInt { bits } => Ok(FieldValue::UInt(reader.read_bits(bits)? as u32)),
        FieldCodec::SInt { bits } => {
            Ok(FieldValue::SInt(reader.read_signed_bits(bits)? as i32))
        }
        FieldCodec::Float => {
            if reader.read_bit()? {
                Ok(FieldValue::Float(0.0))
            } else {
                Ok(FieldValue::Float(reader.read_f32()?))
            }
        }
    }
}
