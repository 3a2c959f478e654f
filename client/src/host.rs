//! Collaborator interfaces the connection calls into.
//!
//! Every method has a no-op default so embedders implement only what they
//! use. [`Host`] is implemented for any type that implements all six.

use std::io;

use bitstream::BitReader;

use crate::error::{ClientError, ClientResult};
use crate::voice::VoicePacket;

/// Game filesystem.
pub trait Filesystem {
    /// Remounts the search path after a gamestate.
    fn restart(&mut self, _checksum_feed: i32) {}

    /// Pak checksums and names the server has loaded.
    fn set_pure_paks(&mut self, _checksums: &str, _names: &str) {}

    /// Pak checksums and names the server references.
    fn set_referenced_paks(&mut self, _checksums: &str, _names: &str) {}
}

/// On-screen text and level loading.
pub trait Ui {
    /// Clears UI state and begins loading `map_name`.
    fn reset(&mut self, _map_name: &str) {}

    fn center_print(&mut self, _text: &str) {}

    fn location_print(&mut self, _x: i16, _y: i16, _text: &str) {}
}

/// Local settings the server may try to change.
pub trait Settings {
    /// Whether the server may set `key`. Keys not allowed are discarded.
    fn is_server_settable(&self, _key: &str) -> bool {
        false
    }

    /// Current local value of `key`.
    fn value(&self, _key: &str) -> Option<String> {
        None
    }

    fn apply(&mut self, _key: &str, _value: &str) {}
}

/// File transfer sink.
pub trait Transfers {
    /// Opens `temp_name` for writing.
    fn open(&mut self, _temp_name: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "downloads not supported",
        ))
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<()> {
        Ok(())
    }

    /// Closes the file and moves it to its final name.
    fn finish(&mut self, _temp_name: &str, _local_name: &str) {}
}

/// Voice playback.
pub trait Voice {
    fn codec_available(&self) -> bool {
        false
    }

    fn is_muted(&self, _sender: usize) -> bool {
        false
    }

    fn play(&mut self, _packet: VoicePacket<'_>) {}
}

/// Game-specific messages whose layout only the game module knows.
pub trait GameMessages {
    /// Consumes one game message from `reader`.
    ///
    /// The handler must read exactly the bytes of its message; the
    /// dispatcher continues from wherever it leaves the reader.
    fn parse_game_message(&mut self, _reader: &mut BitReader<'_>) -> ClientResult<()> {
        Err(ClientError::NoGameMessageHandler)
    }
}

/// Everything the connection needs from its embedder.
pub trait Host: Filesystem + Ui + Settings + Transfers + Voice + GameMessages {}

impl<T> Host for T where T: Filesystem + Ui + Settings + Transfers + Voice + GameMessages + ?Sized {}

/// Host that accepts everything and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Filesystem for NullHost {}
impl Ui for NullHost {}
impl Settings for NullHost {}
impl Transfers for NullHost {}
impl Voice for NullHost {}
impl GameMessages for NullHost {}
