//! Voice payload routing.

use bitstream::BitReader;
use tracing::debug;
use wire::{DecodeError, LimitKind, ServerOp, VoipFlags, VOIP_FLAG_BITS};

use crate::connection::ClientConnection;
use crate::error::ClientResult;
use crate::host::Host;

/// One voice packet accepted for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePacket<'a> {
    pub sender: usize,
    pub generation: u8,
    pub sequence: i32,
    pub frames: u8,
    /// Frames lost since the sender's previous packet, for concealment.
    pub dropped_frames: u32,
    pub flags: VoipFlags,
    pub payload: &'a [u8],
}

/// Per-sender stream position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct VoiceChannel {
    generation: u8,
    sequence: i32,
}

impl VoiceChannel {
    /// Advances the stream and returns the number of dropped frames.
    fn advance(&mut self, generation: u8, sequence: i32, frames: u8, max_gap: usize) -> u32 {
        let gap = sequence.wrapping_sub(self.sequence);
        let dropped = if generation != self.generation {
            debug!(generation, "voice: new generation");
            self.generation = generation;
            0
        } else if gap < 0 {
            debug!(sequence, expected = self.sequence, "voice: misordered sequence");
            0
        } else if gap as usize >= max_gap {
            debug!(gap, "voice: too many dropped frames, restarting");
            0
        } else {
            gap as u32
        };
        self.sequence = sequence.wrapping_add(i32::from(frames));
        dropped
    }
}

impl ClientConnection {
    pub(crate) fn parse_voip<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        reader: &mut BitReader<'_>,
        op: ServerOp,
    ) -> ClientResult<()> {
        let sender = reader.read_i16()?;
        let generation = reader.read_u8()?;
        let sequence = reader.read_i32()?;
        let frames = reader.read_u8()?;
        let raw_len = reader.read_i16()?;
        let len = usize::try_from(raw_len).map_err(|_| DecodeError::NegativeLength {
            kind: LimitKind::VoicePayload,
            value: i32::from(raw_len),
        })?;
        let flags = VoipFlags::from_raw(reader.read_bits(VOIP_FLAG_BITS)? as u8);

        debug!(sender, len, "voice packet");
        if len > self.config.wire.max_voice_payload {
            reader.skip_bytes(len)?;
            debug!(len, "voice: oversized payload ignored");
            return Ok(());
        }
        let payload = reader.read_bytes(len)?;

        if op == ServerOp::VoipSpeex || !self.system_info.voice_enabled {
            return Ok(());
        }
        if !host.codec_available() {
            return Ok(());
        }
        let Some(sender) = usize::try_from(sender)
            .ok()
            .filter(|&sender| sender < self.config.client.max_clients)
        else {
            debug!(sender, "voice: bogus sender");
            return Ok(());
        };
        if sender as i32 == self.client_num || host.is_muted(sender) {
            return Ok(());
        }

        let max_gap = self.config.client.max_voice_gap;
        let Some(channel) = self.voice.get_mut(sender) else {
            return Ok(());
        };
        let dropped_frames = channel.advance(generation, sequence, frames, max_gap);
        host.play(VoicePacket {
            sender,
            generation,
            sequence,
            frames,
            dropped_frames,
            flags,
            payload: &payload,
        });
        Ok(())
    }
}
