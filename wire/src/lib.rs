//! Server message vocabulary for the netsnap client.
//!
//! This crate names the opcodes that introduce each record of a server
//! message, the protocol constants shared with the server, and the limits
//! enforced while reading. It holds no client state.
//!
//! # Design Principles
//!
//! - **Stable opcodes** - Byte values are fixed by the protocol.
//! - **Bounded decoding** - All length fields are validated against limits before use.
//! - **No domain knowledge** - Entities and snapshots live in the client crate.

mod error;
mod limits;
mod opcode;
mod protocol;

pub use error::{DecodeError, LimitKind, WireResult};
pub use limits::Limits;
pub use opcode::ServerOp;
pub use protocol::{
    SnapFlags, VoipFlags, CS_SERVERINFO, CS_SYSTEMINFO, ENTITY_NONE, ENTITY_NUM_BITS,
    MAX_ENTITIES, PING_UNKNOWN, VOIP_FLAG_BITS,
};

/// Checks a length read from the wire against its limit.
///
/// # Errors
///
/// Returns [`DecodeError::LimitsExceeded`] if `actual > limit`.
pub fn check_limit(kind: LimitKind, limit: usize, actual: usize) -> WireResult<()> {
    if actual > limit {
        return Err(DecodeError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}

/// Converts a signed wire length into a bounded `usize`.
///
/// # Errors
///
/// Returns [`DecodeError::NegativeLength`] for negative values and
/// [`DecodeError::LimitsExceeded`] when `value > limit`.
pub fn checked_length(kind: LimitKind, limit: usize, value: i32) -> WireResult<usize> {
    let len = usize::try_from(value).map_err(|_| DecodeError::NegativeLength { kind, value })?;
    check_limit(kind, limit, len)?;
    Ok(len)
}
