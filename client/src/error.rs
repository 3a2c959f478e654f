//! Error types for the client connection.

use std::fmt;

use wire::ServerOp;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Fatal errors. Any of these tears the connection down: the byte stream can
/// no longer be trusted once one has been raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Wire framing error.
    Wire(wire::DecodeError),

    /// Bitstream error (read past the end of the message).
    Bitstream(bitstream::BitError),

    /// Invalid field layout.
    Schema(schema::SchemaError),

    /// Invalid limits configuration.
    Config(ConfigError),

    /// Message arrived on a connection that is not connected.
    NotConnected,

    /// Opcode that is only legal in another context.
    UnexpectedOpcode { op: ServerOp, context: OpContext },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Configstring index outside the table.
    ConfigstringIndex { index: i32, max: usize },

    /// Baseline entity number outside `[0, N)`.
    EntityNumberOutOfRange { number: u32 },

    /// Wire entity numbers must be strictly ascending.
    InvalidEntityOrder { previous: u16, current: u16 },

    /// A field-bag delta claimed more fields than the layout has.
    FieldCount { claimed: usize, layout: usize },

    /// The server refused a download.
    DownloadRefused { reason: String },

    /// A game message arrived but no handler is loaded.
    NoGameMessageHandler,

    /// Too many unacknowledged outgoing reliable commands.
    CommandOverflow { capacity: usize },
}

/// Where an opcode was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpContext {
    Message,
    Gamestate,
}

/// Client-level limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    GamestateChars,
    SnapshotEntities,
    SnapshotEvents,
}

/// Invalid [`ClientLimits`](crate::ClientLimits) values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NotPowerOfTwo { name: &'static str, value: usize },
    Zero { name: &'static str },
    PoolMarginTooSmall { margin: usize, max_entities: usize },
    PoolMarginTooLarge { margin: usize, capacity: usize },
}

/// Why a snapshot's delta base was refused.
///
/// Rejections are recoverable: the snapshot is decoded, discarded, and the
/// connection stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SnapshotRejection {
    /// The history slot was never filled or has been invalidated.
    InvalidBase { delta_num: i32 },

    /// The history slot holds a different message (ring wraparound).
    BaseTooOld { delta_num: i32, stored: i32 },

    /// The base's entities have been overwritten in the parse-entity pool.
    BaseEntitiesOverwritten { distance: u64, limit: u64 },
}

/// Why a reliable command lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLookupError {
    /// The sequence has not been received yet.
    NotReceived { sequence: i32, watermark: i32 },

    /// The sequence has been overwritten by newer commands.
    Overwritten { sequence: i32 },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(err) => write!(f, "wire error: {err}"),
            Self::Bitstream(err) => write!(f, "read past end of server message: {err}"),
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::NotConnected => write!(f, "message received while disconnected"),
            Self::UnexpectedOpcode { op, context } => {
                write!(f, "unexpected opcode {} in {context}", op.name())
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::ConfigstringIndex { index, max } => {
                write!(f, "configstring index {index} outside 0..{max}")
            }
            Self::EntityNumberOutOfRange { number } => {
                write!(f, "entity number out of range: {number}")
            }
            Self::InvalidEntityOrder { previous, current } => {
                write!(f, "entity {current} follows {previous}")
            }
            Self::FieldCount { claimed, layout } => {
                write!(f, "delta claims {claimed} fields, layout has {layout}")
            }
            Self::DownloadRefused { reason } => write!(f, "download refused: {reason}"),
            Self::NoGameMessageHandler => {
                write!(f, "game message received without a handler loaded")
            }
            Self::CommandOverflow { capacity } => {
                write!(f, "more than {capacity} unacknowledged reliable commands")
            }
        }
    }
}

impl fmt::Display for OpContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "server message"),
            Self::Gamestate => write!(f, "gamestate"),
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GamestateChars => "gamestate chars",
            Self::SnapshotEntities => "snapshot entities",
            Self::SnapshotEvents => "snapshot events",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPowerOfTwo { name, value } => {
                write!(f, "{name} must be a power of two, got {value}")
            }
            Self::Zero { name } => write!(f, "{name} must be non-zero"),
            Self::PoolMarginTooSmall {
                margin,
                max_entities,
            } => {
                write!(
                    f,
                    "entity pool margin {margin} is below max snapshot entities {max_entities}"
                )
            }
            Self::PoolMarginTooLarge { margin, capacity } => {
                write!(
                    f,
                    "entity pool margin {margin} must be below capacity {capacity}"
                )
            }
        }
    }
}

impl fmt::Display for SnapshotRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase { delta_num } => {
                write!(f, "delta from invalid frame {delta_num}")
            }
            Self::BaseTooOld { delta_num, stored } => {
                write!(f, "delta frame {delta_num} too old (slot holds {stored})")
            }
            Self::BaseEntitiesOverwritten { distance, limit } => {
                write!(
                    f,
                    "delta base entities overwritten: distance {distance} > {limit}"
                )
            }
        }
    }
}

impl fmt::Display for CommandLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReceived {
                sequence,
                watermark,
            } => {
                write!(
                    f,
                    "command {sequence} not received (watermark {watermark})"
                )
            }
            Self::Overwritten { sequence } => write!(f, "command {sequence} overwritten"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(err) => Some(err),
            Self::Bitstream(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for SnapshotRejection {}

impl std::error::Error for CommandLookupError {}

impl From<wire::DecodeError> for ClientError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<bitstream::BitError> for ClientError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Bitstream(err)
    }
}

impl From<schema::SchemaError> for ClientError {
    fn from(err: schema::SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
