//! Replay and inspection tools for the netsnap client.
//!
//! Captures are sequences of server messages as the transport delivered
//! them. Each record is laid out as:
//!
//! ```text
//! u32 LE sequence | u32 LE realtime | u32 LE length | length bytes
//! ```
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Same decoder** - Replays go through the exact code path a live client uses.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use client::{
    ClientConfig, ClientConnection, CommandOutcome, InboundMessage, MessageReport, NullHost,
    SnapshotOutcome, SnapshotReport,
};
use serde::Serialize;

const RECORD_HEADER_BYTES: usize = 12;

/// One captured server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub sequence: i32,
    pub realtime: i32,
    pub data: Vec<u8>,
}

/// Splits a capture file into its records.
pub fn parse_capture(bytes: &[u8]) -> Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < RECORD_HEADER_BYTES {
            bail!(
                "truncated record header after {} records ({} bytes left)",
                records.len(),
                rest.len()
            );
        }
        let word = |offset: usize| {
            u32::from_le_bytes([
                rest[offset],
                rest[offset + 1],
                rest[offset + 2],
                rest[offset + 3],
            ])
        };
        let sequence = word(0) as i32;
        let realtime = word(4) as i32;
        let len = word(8) as usize;
        let body = &rest[RECORD_HEADER_BYTES..];
        if body.len() < len {
            bail!(
                "record {} claims {len} bytes, {} available",
                records.len(),
                body.len()
            );
        }
        records.push(CaptureRecord {
            sequence,
            realtime,
            data: body[..len].to_vec(),
        });
        rest = &body[len..];
    }
    Ok(records)
}

/// Encodes records in the capture layout.
pub fn write_capture(records: &[CaptureRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        out.extend_from_slice(&(record.sequence as u32).to_le_bytes());
        out.extend_from_slice(&(record.realtime as u32).to_le_bytes());
        out.extend_from_slice(&(record.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&record.data);
    }
    out
}

/// Per-message outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub sequence: i32,
    pub acknowledged: i32,
    pub ops: Vec<&'static str>,
    pub gamestate: bool,
    pub snapshots: Vec<SnapshotReport>,
    pub commands: Vec<(i32, CommandOutcome)>,
}

impl From<MessageReport> for MessageSummary {
    fn from(report: MessageReport) -> Self {
        Self {
            sequence: report.sequence,
            acknowledged: report.acknowledged,
            ops: report.ops.iter().map(|op| op.name()).collect(),
            gamestate: report.gamestate,
            snapshots: report.snapshots,
            commands: report.commands,
        }
    }
}

/// The last accepted snapshot of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub message_num: i32,
    pub server_time: i32,
    pub command_time: i32,
    pub ping: i32,
    pub entities: Vec<u16>,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub messages: Vec<MessageSummary>,
    /// The fatal error that ended the replay, if any.
    pub error: Option<String>,
    pub final_snapshot: Option<SnapshotSummary>,
}

/// Feeds `records` through a fresh connection.
///
/// Decoding stops at the first fatal error, which is reported rather than
/// returned.
pub fn replay(records: &[CaptureRecord], config: ClientConfig) -> Result<ReplaySummary> {
    let mut connection = ClientConnection::new(config).context("invalid client config")?;
    connection.reconnect();
    let mut host = NullHost;

    let mut messages = Vec::with_capacity(records.len());
    let mut error = None;
    for record in records {
        let message = InboundMessage {
            sequence: record.sequence,
            data: &record.data,
            realtime: record.realtime,
        };
        match connection.parse_server_message(&mut host, &message) {
            Ok(report) => messages.push(MessageSummary::from(report)),
            Err(err) => {
                error = Some(format!("message {}: {err}", record.sequence));
                break;
            }
        }
    }

    let current = connection.current_snapshot();
    let final_snapshot = current.valid.then(|| SnapshotSummary {
        message_num: current.message_num,
        server_time: current.server_time,
        command_time: current.player.command_time,
        ping: current.ping,
        entities: connection.current_entities().map(|entity| entity.number).collect(),
    });

    Ok(ReplaySummary {
        messages,
        error,
        final_snapshot,
    })
}

fn format_snapshot(out: &mut String, snapshot: &SnapshotReport) {
    let base = snapshot
        .delta_num
        .map_or_else(|| "keyframe".to_owned(), |num| format!("delta {num}"));
    let _ = match snapshot.outcome {
        SnapshotOutcome::Accepted => writeln!(
            out,
            "  snapshot {} ({base}) time {} entities {} ping {}",
            snapshot.message_num, snapshot.server_time, snapshot.num_entities, snapshot.ping
        ),
        SnapshotOutcome::Rejected(reason) => writeln!(
            out,
            "  snapshot {} ({base}) rejected: {reason}",
            snapshot.message_num
        ),
    };
}

/// Renders a replay for humans.
pub fn format_text(summary: &ReplaySummary) -> String {
    let mut out = String::new();
    for message in &summary.messages {
        let _ = writeln!(
            out,
            "message {} ack {}: {}",
            message.sequence,
            message.acknowledged,
            message.ops.join(" ")
        );
        for snapshot in &message.snapshots {
            format_snapshot(&mut out, snapshot);
        }
        for (sequence, outcome) in &message.commands {
            let _ = writeln!(out, "  command {sequence}: {outcome:?}");
        }
    }
    if let Some(error) = &summary.error {
        let _ = writeln!(out, "error: {error}");
    }
    match &summary.final_snapshot {
        Some(snapshot) => {
            let _ = writeln!(
                out,
                "final snapshot {} time {} command time {} ping {}",
                snapshot.message_num, snapshot.server_time, snapshot.command_time, snapshot.ping
            );
            let _ = writeln!(out, "entities: {:?}", snapshot.entities);
        }
        None => {
            let _ = writeln!(out, "no valid snapshot");
        }
    }
    out
}
