//! Server message dispatch.

use bitstream::BitReader;
use tracing::{debug, warn};
use wire::{LimitKind as WireLimitKind, ServerOp};

use crate::command_log::CommandOutcome;
use crate::connection::{ClientConnection, ConnectionState};
use crate::error::{ClientError, ClientResult, OpContext, SnapshotRejection};
use crate::host::Host;
use crate::snapshot::Snapshot;

/// One complete datagram from the server.
#[derive(Debug, Clone, Copy)]
pub struct InboundMessage<'a> {
    /// Transport sequence number of the datagram.
    pub sequence: i32,
    pub data: &'a [u8],
    /// Local clock when the datagram arrived, in milliseconds.
    pub realtime: i32,
}

/// What happened to a snapshot carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SnapshotOutcome {
    Accepted,
    Rejected(SnapshotRejection),
}

/// Summary of one decoded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SnapshotReport {
    pub message_num: i32,
    pub delta_num: Option<i32>,
    pub server_time: i32,
    pub num_entities: usize,
    pub ping: i32,
    pub outcome: SnapshotOutcome,
}

impl SnapshotReport {
    pub(crate) fn new(snapshot: &Snapshot, outcome: SnapshotOutcome) -> Self {
        Self {
            message_num: snapshot.message_num,
            delta_num: snapshot.delta_num,
            server_time: snapshot.server_time,
            num_entities: snapshot.num_entities,
            ping: snapshot.ping,
            outcome,
        }
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.outcome, SnapshotOutcome::Accepted)
    }
}

/// Everything a message did to the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageReport {
    pub sequence: i32,
    /// Reliable acknowledgment after clamping.
    pub acknowledged: i32,
    /// Opcodes in the order they were read, `Eof` included.
    pub ops: Vec<ServerOp>,
    /// A gamestate reset the connection.
    pub gamestate: bool,
    pub snapshots: Vec<SnapshotReport>,
    pub commands: Vec<(i32, CommandOutcome)>,
}

impl ClientConnection {
    /// Decodes one server message.
    ///
    /// Any error is fatal: the connection is moved to
    /// [`ConnectionState::Disconnected`] before the error is returned, and
    /// no further messages are accepted until [`reconnect`](Self::reconnect).
    pub fn parse_server_message<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        message: &InboundMessage<'_>,
    ) -> ClientResult<MessageReport> {
        if self.state == ConnectionState::Disconnected {
            return Err(ClientError::NotConnected);
        }
        let result = self.dispatch(host, message);
        if let Err(err) = &result {
            warn!(sequence = message.sequence, %err, "dropping connection");
            self.disconnect();
        }
        result
    }

    fn dispatch<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        message: &InboundMessage<'_>,
    ) -> ClientResult<MessageReport> {
        wire::check_limit(
            WireLimitKind::MessageBytes,
            self.config.wire.max_message_bytes,
            message.data.len(),
        )?;

        let mut reader = BitReader::new(message.data);
        let mut report = MessageReport {
            sequence: message.sequence,
            ..MessageReport::default()
        };
        report.acknowledged = self.acknowledge(reader.read_i32()?);

        loop {
            let op = ServerOp::parse(reader.read_u8()?)?;
            debug!(op = op.name(), offset = reader.bytes_consumed(), "server op");
            report.ops.push(op);
            match op {
                ServerOp::Eof => break,
                ServerOp::Nop => {}
                ServerOp::ServerCommand => {
                    let sequence = reader.read_i32()?;
                    let text = reader.read_string(self.config.wire.max_string_chars)?;
                    let outcome = self.commands.push(sequence, text);
                    report.commands.push((sequence, outcome));
                }
                ServerOp::Gamestate => {
                    self.parse_gamestate(host, &mut reader)?;
                    report.gamestate = true;
                }
                ServerOp::Snapshot => self.parse_snapshot(&mut reader, message, &mut report)?,
                ServerOp::Download => self.parse_download(host, &mut reader)?,
                ServerOp::CenterPrint => {
                    let text = reader.read_string(self.config.wire.max_string_chars)?;
                    host.center_print(&text);
                }
                ServerOp::LocationPrint => {
                    let x = reader.read_i16()?;
                    let y = reader.read_i16()?;
                    let text = reader.read_string(self.config.wire.max_string_chars)?;
                    host.location_print(x, y, &text);
                }
                ServerOp::GameMessage => host.parse_game_message(&mut reader)?,
                ServerOp::VoipSpeex | ServerOp::VoipOpus => {
                    self.parse_voip(host, &mut reader, op)?;
                }
                ServerOp::Bad | ServerOp::Configstring | ServerOp::Baseline => {
                    return Err(ClientError::UnexpectedOpcode {
                        op,
                        context: OpContext::Message,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Clamps a reliable acknowledgment into the window of commands sent.
    fn acknowledge(&mut self, acknowledged: i32) -> i32 {
        let sequence = self.outgoing.sequence();
        let oldest = i64::from(sequence) - self.config.client.ack_window as i64;
        let acknowledged = if i64::from(acknowledged) < oldest || acknowledged > sequence {
            debug!(acknowledged, sequence, "acknowledgment out of window");
            sequence
        } else {
            acknowledged
        };
        self.outgoing.acknowledge(acknowledged);
        acknowledged
    }
}
