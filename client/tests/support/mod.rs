//! Server-side message construction for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;

use bitstream::{BitReader, BitWriter};
use client::{
    ClientConfig, ClientConnection, ClientResult, FieldValue, Filesystem, GameMessages,
    InboundMessage, MessageReport, Settings, SnapshotEvent, Transfers, Ui, Voice, VoicePacket,
};
use schema::{entity_field, FieldCodec, Schema, StateLayout};
use wire::{ServerOp, ENTITY_NONE, ENTITY_NUM_BITS};

/// How one entity appears in a snapshot's entity list.
#[derive(Debug, Clone)]
pub enum Delta {
    /// Number only; the base is copied.
    Unchanged,
    Removed,
    /// Changed fields as `(layout index, value)`.
    Fields(Vec<(usize, FieldValue)>),
}

/// Changes only the animation frame, a 16-bit field of the stock layout.
pub fn frame(value: u32) -> Delta {
    Delta::Fields(vec![(frame_index(), FieldValue::UInt(value))])
}

pub fn frame_index() -> usize {
    Schema::standard()
        .entity
        .index_of(entity_field::FRAME)
        .expect("stock layout has a frame field")
}

pub fn write_field_value(writer: &mut BitWriter, codec: FieldCodec, value: FieldValue) {
    match (codec, value) {
        (FieldCodec::Bool, FieldValue::Bool(value)) => writer.write_bit(value),
        (FieldCodec::UInt { bits }, FieldValue::UInt(value)) => {
            writer.write_bits(u64::from(value), bits).unwrap();
        }
        (FieldCodec::SInt { bits }, FieldValue::SInt(value)) => {
            writer.write_signed_bits(i64::from(value), bits).unwrap();
        }
        (FieldCodec::Float, FieldValue::Float(value)) => {
            if value == 0.0 {
                writer.write_bit(true);
            } else {
                writer.write_bit(false);
                writer.write_f32(value);
            }
        }
        (codec, value) => panic!("{value:?} does not fit {codec:?}"),
    }
}

/// Writes a field bag covering up to the highest changed index.
pub fn write_field_bag(writer: &mut BitWriter, layout: &StateLayout, changes: &[(usize, FieldValue)]) {
    let last_changed = changes.iter().map(|(index, _)| index + 1).max().unwrap_or(0);
    writer.write_u8(last_changed as u8);
    for (index, field) in layout.fields.iter().enumerate().take(last_changed) {
        match changes.iter().find(|(changed, _)| *changed == index) {
            Some((_, value)) => {
                writer.write_bit(true);
                write_field_value(writer, field.codec, *value);
            }
            None => writer.write_bit(false),
        }
    }
}

pub fn write_entity(writer: &mut BitWriter, layout: &StateLayout, number: u16, delta: &Delta) {
    writer
        .write_bits(u64::from(number), ENTITY_NUM_BITS)
        .unwrap();
    match delta {
        Delta::Removed => writer.write_bit(true),
        Delta::Unchanged => {
            writer.write_bit(false);
            writer.write_bit(false);
        }
        Delta::Fields(changes) => {
            writer.write_bit(false);
            writer.write_bit(true);
            write_field_bag(writer, layout, changes);
        }
    }
}

pub fn write_entity_list(writer: &mut BitWriter, layout: &StateLayout, entities: &[(u16, Delta)]) {
    for (number, delta) in entities {
        write_entity(writer, layout, *number, delta);
    }
    writer
        .write_bits(u64::from(ENTITY_NONE), ENTITY_NUM_BITS)
        .unwrap();
}

/// Contents of a gamestate message.
#[derive(Debug, Clone, Default)]
pub struct Gamestate {
    pub command_sequence: i32,
    pub configstrings: Vec<(i16, String)>,
    pub baselines: Vec<(u16, Delta)>,
    pub client_num: i32,
    pub checksum_feed: i32,
    pub frame_time: f32,
}

impl Gamestate {
    pub fn on_map(map: &str) -> Self {
        Self {
            configstrings: vec![
                (0, format!(r"\mapname\{map}\sv_allowDownload\1")),
                (1, r"\sv_serverid\7\sv_voipProtocol\opus\sv_fps\20".to_owned()),
            ],
            frame_time: 0.05,
            ..Self::default()
        }
    }
}

/// Contents of a snapshot record.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub server_time: i32,
    pub residual: u8,
    /// Distance back to the base message; 0 for a keyframe.
    pub delta: u8,
    pub flags: u8,
    pub area_mask: Vec<u8>,
    pub command_time: Option<i32>,
    pub player: Vec<(usize, FieldValue)>,
    pub entities: Vec<(u16, Delta)>,
    pub events: Vec<SnapshotEvent>,
}

impl Frame {
    pub fn keyframe(server_time: i32, entities: Vec<(u16, Delta)>) -> Self {
        Self {
            server_time,
            entities,
            ..Self::default()
        }
    }

    pub fn delta(server_time: i32, delta: u8, entities: Vec<(u16, Delta)>) -> Self {
        Self {
            server_time,
            delta,
            entities,
            ..Self::default()
        }
    }
}

/// Builds one server message: acknowledgment, records, `Eof`.
pub struct MessageBuilder {
    writer: BitWriter,
    schema: Schema,
}

impl MessageBuilder {
    pub fn new(acknowledged: i32) -> Self {
        let mut writer = BitWriter::new();
        writer.write_i32(acknowledged);
        Self {
            writer,
            schema: Schema::standard(),
        }
    }

    pub fn op(mut self, op: ServerOp) -> Self {
        self.writer.write_u8(op.raw());
        self
    }

    pub fn raw(mut self, write: impl FnOnce(&mut BitWriter)) -> Self {
        write(&mut self.writer);
        self
    }

    pub fn server_command(mut self, sequence: i32, text: &str) -> Self {
        self.writer.write_u8(ServerOp::ServerCommand.raw());
        self.writer.write_i32(sequence);
        self.writer.write_string(text).unwrap();
        self
    }

    pub fn center_print(mut self, text: &str) -> Self {
        self.writer.write_u8(ServerOp::CenterPrint.raw());
        self.writer.write_string(text).unwrap();
        self
    }

    pub fn gamestate(mut self, gamestate: &Gamestate) -> Self {
        let w = &mut self.writer;
        w.write_u8(ServerOp::Gamestate.raw());
        w.write_i32(gamestate.command_sequence);
        for (index, value) in &gamestate.configstrings {
            w.write_u8(ServerOp::Configstring.raw());
            w.write_i16(*index);
            w.write_string(value).unwrap();
        }
        for (number, delta) in &gamestate.baselines {
            w.write_u8(ServerOp::Baseline.raw());
            write_entity(w, &self.schema.entity, *number, delta);
        }
        w.write_u8(ServerOp::Eof.raw());
        w.write_i32(gamestate.client_num);
        w.write_i32(gamestate.checksum_feed);
        w.write_f32(gamestate.frame_time);
        self
    }

    pub fn snapshot(mut self, frame: &Frame) -> Self {
        let w = &mut self.writer;
        w.write_u8(ServerOp::Snapshot.raw());
        w.write_i32(frame.server_time);
        w.write_u8(frame.residual);
        w.write_u8(frame.delta);
        w.write_u8(frame.flags);
        w.write_u8(frame.area_mask.len() as u8);
        w.write_bytes(&frame.area_mask);

        match frame.command_time {
            Some(command_time) => {
                w.write_bit(true);
                w.write_i32(command_time);
            }
            None => w.write_bit(false),
        }
        write_field_bag(w, &self.schema.player, &frame.player);
        write_entity_list(w, &self.schema.entity, &frame.entities);

        if frame.events.is_empty() {
            w.write_bit(false);
        } else {
            w.write_bit(true);
            w.write_u8(frame.events.len() as u8);
            for event in &frame.events {
                w.write_bits(u64::from(event.entity), ENTITY_NUM_BITS).unwrap();
                w.write_u16(event.sound_index);
                w.write_u8(event.channel);
                w.write_u8(event.volume);
            }
        }
        self
    }

    pub fn download(mut self, block: i16, size: Option<i32>, chunk: &[u8]) -> Self {
        let w = &mut self.writer;
        w.write_u8(ServerOp::Download.raw());
        w.write_i16(block);
        if block == 0 {
            w.write_i32(size.unwrap_or(0));
        }
        w.write_i16(chunk.len() as i16);
        w.write_bytes(chunk);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.op(ServerOp::Eof).writer.finish()
    }

    /// The message as written so far, without the closing `Eof`.
    pub fn truncated(self) -> Vec<u8> {
        self.writer.finish()
    }
}

/// A connection that has completed the connect handshake.
pub fn connected() -> ClientConnection {
    connected_with(ClientConfig::for_testing())
}

pub fn connected_with(config: ClientConfig) -> ClientConnection {
    let mut connection = ClientConnection::new(config).unwrap();
    connection.reconnect();
    connection
}

pub fn deliver(
    connection: &mut ClientConnection,
    host: &mut TestHost,
    sequence: i32,
    data: &[u8],
) -> ClientResult<MessageReport> {
    connection.parse_server_message(
        host,
        &InboundMessage {
            sequence,
            data,
            realtime: sequence * 50,
        },
    )
}

/// Entity numbers of the current snapshot.
pub fn current_numbers(connection: &ClientConnection) -> Vec<u16> {
    connection.current_entities().map(|state| state.number).collect()
}

/// Frame field of entity `number` in the current snapshot.
pub fn current_frame(connection: &ClientConnection, number: u16) -> Option<FieldValue> {
    let index = frame_index();
    connection
        .current_entities()
        .find(|state| state.number == number)
        .map(|state| state.fields[index])
}

/// Host that records what the connection asked of it.
#[derive(Debug, Default)]
pub struct TestHost {
    pub restarts: Vec<i32>,
    pub maps: Vec<String>,
    pub prints: Vec<String>,
    pub settable: Vec<String>,
    pub settings: BTreeMap<String, String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub open_file: Option<String>,
    pub fail_open: bool,
    pub voice_codec: bool,
    pub muted: Vec<usize>,
    pub voice: Vec<(usize, u32, Vec<u8>)>,
    pub game_messages: usize,
}

impl Filesystem for TestHost {
    fn restart(&mut self, checksum_feed: i32) {
        self.restarts.push(checksum_feed);
    }
}

impl Ui for TestHost {
    fn reset(&mut self, map_name: &str) {
        self.maps.push(map_name.to_owned());
    }

    fn center_print(&mut self, text: &str) {
        self.prints.push(text.to_owned());
    }
}

impl Settings for TestHost {
    fn is_server_settable(&self, key: &str) -> bool {
        self.settable.iter().any(|allowed| allowed == key)
    }

    fn value(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn apply(&mut self, key: &str, value: &str) {
        self.settings.insert(key.to_owned(), value.to_owned());
    }
}

impl Transfers for TestHost {
    fn open(&mut self, temp_name: &str) -> io::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.files.insert(temp_name.to_owned(), Vec::new());
        self.open_file = Some(temp_name.to_owned());
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let name = self
            .open_file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no file open"))?;
        if let Some(file) = self.files.get_mut(name) {
            file.extend_from_slice(data);
        }
        Ok(())
    }

    fn finish(&mut self, temp_name: &str, local_name: &str) {
        if let Some(data) = self.files.remove(temp_name) {
            self.files.insert(local_name.to_owned(), data);
        }
        self.open_file = None;
    }
}

impl Voice for TestHost {
    fn codec_available(&self) -> bool {
        self.voice_codec
    }

    fn is_muted(&self, sender: usize) -> bool {
        self.muted.contains(&sender)
    }

    fn play(&mut self, packet: VoicePacket<'_>) {
        self.voice
            .push((packet.sender, packet.dropped_frames, packet.payload.to_vec()));
    }
}

impl GameMessages for TestHost {
    /// Test game messages are a single `u8` payload.
    fn parse_game_message(&mut self, reader: &mut BitReader<'_>) -> ClientResult<()> {
        reader.read_u8()?;
        self.game_messages += 1;
        Ok(())
    }
}
