//! The connection-scoped decode context.

use tracing::{debug, info};

use crate::baseline::BaselineTable;
use crate::command_log::{CommandLog, OutgoingCommands};
use crate::configstrings::ConfigStrings;
use crate::download::DownloadState;
use crate::entity::EntityState;
use crate::error::{ClientResult, CommandLookupError};
use crate::gamestate::{ServerInfo, SystemInfo};
use crate::history::{EntityPool, SnapshotHistory};
use crate::limits::ClientConfig;
use crate::packets::{OutgoingPacket, OutgoingPackets};
use crate::snapshot::Snapshot;
use crate::voice::VoiceChannel;

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConnectionState {
    /// No session; every inbound message is refused.
    #[default]
    Disconnected,
    /// Session established, waiting for the gamestate.
    Connected,
    /// Gamestate received, waiting for the first valid snapshot.
    Loading,
    /// Snapshots are flowing.
    Active,
}

/// All state the server message decoder reads and writes.
///
/// Owned by the caller and passed by `&mut` into every decode; nothing is
/// shared between connections.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub(crate) config: ClientConfig,
    pub(crate) state: ConnectionState,

    pub(crate) configstrings: ConfigStrings,
    pub(crate) baselines: BaselineTable,
    pub(crate) system_info: SystemInfo,
    pub(crate) server_info: ServerInfo,
    pub(crate) client_num: i32,
    pub(crate) checksum_feed: i32,
    pub(crate) server_frame_time: f32,

    pub(crate) history: SnapshotHistory,
    pub(crate) pool: EntityPool,
    pub(crate) current: Snapshot,
    pub(crate) server_start_time: i32,
    pub(crate) new_snapshot: bool,

    pub(crate) commands: CommandLog,
    pub(crate) outgoing: OutgoingCommands,
    pub(crate) packets: OutgoingPackets,
    pub(crate) download: Option<DownloadState>,
    pub(crate) voice: Vec<VoiceChannel>,
}

impl ClientConnection {
    /// Creates a disconnected connection sized by `config`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: ClientConfig) -> Self {
        let limits = &config.client;
        Self {
            configstrings: ConfigStrings::new(limits.max_configstrings, limits.max_gamestate_chars),
            baselines: BaselineTable::new(&config.schema.entity),
            system_info: SystemInfo::default(),
            server_info: ServerInfo::default(),
            client_num: 0,
            checksum_feed: 0,
            server_frame_time: 0.0,
            history: SnapshotHistory::new(limits.history_capacity),
            pool: EntityPool::new(limits.entity_pool_capacity),
            current: Snapshot::default(),
            server_start_time: 0,
            new_snapshot: false,
            commands: CommandLog::new(limits.command_capacity),
            outgoing: OutgoingCommands::new(limits.command_capacity),
            packets: OutgoingPackets::new(limits.rtt_window),
            download: None,
            voice: vec![VoiceChannel::default(); limits.max_clients],
            state: ConnectionState::Disconnected,
            config,
        }
    }

    /// Starts a fresh session, discarding everything from the previous one.
    pub fn reconnect(&mut self) {
        let config = self.config.clone();
        *self = Self::with_config(config);
        self.state = ConnectionState::Connected;
        info!("connection reset");
    }

    /// Tears the session down. Buffers are kept until the next
    /// [`reconnect`](Self::reconnect).
    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "disconnected");
        }
        self.state = ConnectionState::Disconnected;
        self.download = None;
    }

    /// Clears the world state ahead of a gamestate.
    pub(crate) fn clear_world(&mut self) {
        self.configstrings.clear();
        self.baselines.reset(&self.config.schema.entity);
        self.system_info = SystemInfo::default();
        self.server_info = ServerInfo::default();
        self.current = Snapshot::default();
        self.server_start_time = 0;
        self.new_snapshot = false;
        self.history.invalidate_all();
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The most recently accepted snapshot.
    #[must_use]
    pub const fn current_snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Entities of the current snapshot, in ascending number order.
    pub fn current_entities(&self) -> impl Iterator<Item = &EntityState> {
        self.snapshot_entities(&self.current)
    }

    /// Entities of any snapshot still reachable in the pool.
    pub fn snapshot_entities<'a>(
        &'a self,
        snapshot: &Snapshot,
    ) -> impl Iterator<Item = &'a EntityState> + 'a {
        self.pool.range(snapshot.first_entity, snapshot.num_entities)
    }

    /// Returns `true` once per accepted snapshot.
    pub fn take_new_snapshot(&mut self) -> bool {
        std::mem::take(&mut self.new_snapshot)
    }

    /// Looks up an accepted snapshot still held in the history.
    #[must_use]
    pub fn snapshot(&self, message_num: i32) -> Option<&Snapshot> {
        self.history.get(message_num)
    }

    #[must_use]
    pub const fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    #[must_use]
    pub const fn entity_pool(&self) -> &EntityPool {
        &self.pool
    }

    #[must_use]
    pub const fn baselines(&self) -> &BaselineTable {
        &self.baselines
    }

    #[must_use]
    pub const fn configstrings(&self) -> &ConfigStrings {
        &self.configstrings
    }

    /// Configstring `index`, or "" when unset or out of range.
    #[must_use]
    pub fn configstring(&self, index: usize) -> &str {
        self.configstrings.get(index)
    }

    #[must_use]
    pub const fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    #[must_use]
    pub const fn client_num(&self) -> i32 {
        self.client_num
    }

    #[must_use]
    pub const fn checksum_feed(&self) -> i32 {
        self.checksum_feed
    }

    #[must_use]
    pub const fn server_frame_time(&self) -> f32 {
        self.server_frame_time
    }

    /// Server time of the first snapshot after the last map restart.
    #[must_use]
    pub const fn server_start_time(&self) -> i32 {
        self.server_start_time
    }

    /// Highest contiguous reliable command received.
    #[must_use]
    pub const fn server_command_sequence(&self) -> i32 {
        self.commands.watermark()
    }

    /// Next unconsumed reliable command, in order.
    pub fn next_server_command(&mut self) -> Option<(i32, &str)> {
        self.commands.next_command()
    }

    /// Reliable command `sequence`, if still held.
    pub fn server_command(&self, sequence: i32) -> Result<&str, CommandLookupError> {
        self.commands.command(sequence)
    }

    /// Queues a reliable command for the server and returns its sequence.
    pub fn add_reliable_command(&mut self, text: impl Into<String>) -> ClientResult<i32> {
        self.outgoing.push(text)
    }

    #[must_use]
    pub const fn outgoing_commands(&self) -> &OutgoingCommands {
        &self.outgoing
    }

    /// Records a packet sent to the server, for ping estimation.
    pub fn record_outgoing_packet(&mut self, server_time: i32, realtime: i32) {
        self.packets.record(OutgoingPacket {
            server_time,
            realtime,
        });
    }
}
