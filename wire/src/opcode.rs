//! Server opcode enumeration.

use crate::error::{DecodeError, WireResult};

/// Opcodes that introduce each record of a server message.
///
/// The byte values are part of the protocol and must never change.
/// `Configstring` and `Baseline` are only legal inside a gamestate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerOp {
    Bad = 0,
    Nop = 1,
    Gamestate = 2,
    Configstring = 3,
    Baseline = 4,
    ServerCommand = 5,
    Download = 6,
    Snapshot = 7,
    CenterPrint = 8,
    LocationPrint = 9,
    GameMessage = 10,
    Eof = 11,
    VoipSpeex = 12,
    VoipOpus = 13,
}

impl ServerOp {
    /// Parses an opcode from a raw byte.
    pub fn parse(op: u8) -> WireResult<Self> {
        match op {
            0 => Ok(Self::Bad),
            1 => Ok(Self::Nop),
            2 => Ok(Self::Gamestate),
            3 => Ok(Self::Configstring),
            4 => Ok(Self::Baseline),
            5 => Ok(Self::ServerCommand),
            6 => Ok(Self::Download),
            7 => Ok(Self::Snapshot),
            8 => Ok(Self::CenterPrint),
            9 => Ok(Self::LocationPrint),
            10 => Ok(Self::GameMessage),
            11 => Ok(Self::Eof),
            12 => Ok(Self::VoipSpeex),
            13 => Ok(Self::VoipOpus),
            _ => Err(DecodeError::UnknownOpcode { op }),
        }
    }

    /// Returns the raw byte value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Returns a short diagnostic name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bad => "bad",
            Self::Nop => "nop",
            Self::Gamestate => "gamestate",
            Self::Configstring => "configstring",
            Self::Baseline => "baseline",
            Self::ServerCommand => "server_command",
            Self::Download => "download",
            Self::Snapshot => "snapshot",
            Self::CenterPrint => "center_print",
            Self::LocationPrint => "location_print",
            Self::GameMessage => "game_message",
            Self::Eof => "eof",
            Self::VoipSpeex => "voip_speex",
            Self::VoipOpus => "voip_opus",
        }
    }
}

impl From<ServerOp> for u8 {
    fn from(op: ServerOp) -> Self {
        op.raw()
    }
}
