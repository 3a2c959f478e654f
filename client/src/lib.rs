//! Client-side ingestion of server messages for the netsnap protocol.
//!
//! A [`ClientConnection`] owns every buffer the decoder touches: the
//! configstring store and baselines delivered by the gamestate, the snapshot
//! history and the parse-entity pool shared by recent snapshots, and the
//! reliable command logs in both directions. Each inbound datagram is handed
//! to [`ClientConnection::parse_server_message`] together with a [`Host`]
//! that receives everything outside the decoder's own state.
//!
//! # Design Principles
//!
//! - **Framing is sacred** - Any read past the end of a message, unknown
//!   opcode or length over its limit drops the connection.
//! - **Decode fully, then judge** - A snapshot with an unusable delta base is
//!   still decoded so the reader stays in sync, then discarded.
//! - **Bounded memory** - Every buffer is a ring or table sized by
//!   [`ClientLimits`] when the connection is created.

mod baseline;
mod command_log;
mod configstrings;
mod connection;
mod delta;
mod dispatch;
mod download;
mod entity;
mod error;
mod gamestate;
mod history;
mod host;
mod info;
mod limits;
mod packets;
mod ring;
mod snapshot;
mod voice;

pub use baseline::BaselineTable;
pub use command_log::{CommandLog, CommandOutcome, OutgoingCommands};
pub use configstrings::ConfigStrings;
pub use connection::{ClientConnection, ConnectionState};
pub use delta::{read_entity_delta, read_field_bag, read_field_value, read_player_delta};
pub use dispatch::{InboundMessage, MessageReport, SnapshotOutcome, SnapshotReport};
pub use download::DownloadState;
pub use entity::{EntityState, FieldValue, PlayerState};
pub use error::{
    ClientError, ClientResult, CommandLookupError, ConfigError, LimitKind, OpContext,
    SnapshotRejection,
};
pub use gamestate::{apply_system_settings, ServerInfo, SystemInfo};
pub use history::{EntityPool, SnapshotHistory};
pub use host::{Filesystem, GameMessages, Host, NullHost, Settings, Transfers, Ui, Voice};
pub use info::{info_int, info_pairs, info_value, InfoPairs};
pub use limits::{ClientConfig, ClientLimits};
pub use packets::{OutgoingPacket, OutgoingPackets};
pub use snapshot::{read_packet_entities, EntityRange, Snapshot, SnapshotEvent};
pub use voice::VoicePacket;
