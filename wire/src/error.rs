//! Error types for server message framing.

use std::fmt;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Framing errors detected before any client state is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Opcode byte outside the known set.
    UnknownOpcode { op: u8 },

    /// A length field on the wire exceeded the configured limit.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// A signed length field carried a negative value.
    NegativeLength { kind: LimitKind, value: i32 },
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MessageBytes,
    AreaMaskBytes,
    DownloadChunk,
    VoicePayload,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { op } => write!(f, "unknown server opcode: {op}"),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::NegativeLength { kind, value } => {
                write!(f, "negative {kind}: {value}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessageBytes => "message bytes",
            Self::AreaMaskBytes => "area mask bytes",
            Self::DownloadChunk => "download chunk length",
            Self::VoicePayload => "voice payload length",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for DecodeError {}
