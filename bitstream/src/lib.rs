//! Bit-packed read/write primitives for the netsnap client.
//!
//! This crate provides [`BitReader`] and [`BitWriter`]. A server message is a
//! single continuous bit stream: integers, floats, strings and raw bytes are
//! packed back to back with no alignment and no length prefixes, so the only
//! framing signal is the cumulative number of bits consumed.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked; an overrun is an error, never a panic.
//! - **No domain knowledge** - This crate knows nothing about entities, opcodes, or game state.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_i32(-7);
//! writer.write_string("print").unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_i32().unwrap(), -7);
//! assert_eq!(reader.read_string(64).unwrap(), "print");
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::BitWriter;
