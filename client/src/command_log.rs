//! Reliable command rings.
//!
//! [`CommandLog`] holds server commands until the game consumes them;
//! [`OutgoingCommands`] holds client commands until the server acknowledges
//! them.

use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult, CommandLookupError};
use crate::ring::{seq_key, Ring};

/// What happened to a received command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CommandOutcome {
    /// Stored; the watermark may have advanced.
    Stored,
    /// Already stored or already passed the watermark.
    Duplicate,
    /// Too far ahead of the consumer to store without losing commands.
    OutOfWindow,
}

#[derive(Debug, Clone, Default)]
struct StoredCommand {
    sequence: i32,
    text: String,
}

/// Ordered, deduplicated log of server commands.
///
/// The watermark is the highest sequence such that it and every sequence
/// before it have been stored. Commands arriving ahead of a hole are kept
/// until the hole fills, so consumers always see sequence order.
#[derive(Debug, Clone)]
pub struct CommandLog {
    ring: Ring<Option<StoredCommand>>,
    watermark: i32,
    consumed: i32,
}

impl CommandLog {
    /// Creates an empty log whose watermark is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            watermark: 0,
            consumed: 0,
        }
    }

    /// Returns the capacity of the log.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Highest contiguously stored sequence.
    #[must_use]
    pub const fn watermark(&self) -> i32 {
        self.watermark
    }

    /// Highest sequence handed out by [`next_command`](Self::next_command).
    #[must_use]
    pub const fn consumed(&self) -> i32 {
        self.consumed
    }

    /// Drops every command and restarts at `sequence`.
    ///
    /// Commands up to and including `sequence` count as already executed.
    pub fn reset(&mut self, sequence: i32) {
        self.ring.clear();
        self.watermark = sequence;
        self.consumed = sequence;
    }

    /// Accepts a command from the server.
    pub fn push(&mut self, sequence: i32, text: String) -> CommandOutcome {
        if sequence <= self.watermark {
            return CommandOutcome::Duplicate;
        }
        // Storing past `consumed + capacity` would overwrite a command the
        // game has not read yet.
        if i64::from(sequence) > i64::from(self.consumed) + self.capacity() as i64 {
            debug!(
                sequence,
                consumed = self.consumed,
                "reliable command out of window"
            );
            return CommandOutcome::OutOfWindow;
        }

        let slot = self.ring.get_mut(seq_key(sequence));
        if slot.as_ref().is_some_and(|stored| stored.sequence == sequence) {
            return CommandOutcome::Duplicate;
        }
        *slot = Some(StoredCommand { sequence, text });

        while let Some(next) = self.watermark.checked_add(1) {
            let stored = self
                .ring
                .get(seq_key(next))
                .as_ref()
                .is_some_and(|stored| stored.sequence == next);
            if !stored {
                break;
            }
            self.watermark = next;
        }
        CommandOutcome::Stored
    }

    /// Returns the next unconsumed command at or below the watermark.
    pub fn next_command(&mut self) -> Option<(i32, &str)> {
        while self.consumed < self.watermark {
            self.consumed += 1;
            let sequence = self.consumed;
            let present = self
                .ring
                .get(seq_key(sequence))
                .as_ref()
                .is_some_and(|stored| stored.sequence == sequence);
            if present {
                return self
                    .ring
                    .get(seq_key(sequence))
                    .as_ref()
                    .map(|stored| (sequence, stored.text.as_str()));
            }
            warn!(sequence, "reliable command overwritten before use");
        }
        None
    }

    /// Looks up a specific command.
    pub fn command(&self, sequence: i32) -> Result<&str, CommandLookupError> {
        if sequence > self.watermark {
            return Err(CommandLookupError::NotReceived {
                sequence,
                watermark: self.watermark,
            });
        }
        match self.ring.get(seq_key(sequence)) {
            Some(stored) if stored.sequence == sequence => Ok(&stored.text),
            _ => Err(CommandLookupError::Overwritten { sequence }),
        }
    }
}

/// Client-to-server reliable commands awaiting acknowledgment.
#[derive(Debug, Clone)]
pub struct OutgoingCommands {
    ring: Ring<String>,
    sequence: i32,
    acknowledged: i32,
}

impl OutgoingCommands {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            sequence: 0,
            acknowledged: 0,
        }
    }

    /// Sequence of the most recently queued command.
    #[must_use]
    pub const fn sequence(&self) -> i32 {
        self.sequence
    }

    /// Highest sequence the server has acknowledged.
    #[must_use]
    pub const fn acknowledged(&self) -> i32 {
        self.acknowledged
    }

    /// Queues a command and returns its sequence.
    pub fn push(&mut self, text: impl Into<String>) -> ClientResult<i32> {
        let capacity = self.ring.capacity();
        if i64::from(self.sequence) - i64::from(self.acknowledged) >= capacity as i64 {
            return Err(ClientError::CommandOverflow { capacity });
        }
        self.sequence += 1;
        *self.ring.get_mut(seq_key(self.sequence)) = text.into();
        Ok(self.sequence)
    }

    /// Records the server's acknowledgment.
    pub fn acknowledge(&mut self, acknowledged: i32) {
        self.acknowledged = acknowledged;
    }

    /// Unacknowledged commands, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = (i32, &str)> {
        (self.acknowledged + 1..=self.sequence)
            .map(move |sequence| (sequence, self.ring.get(seq_key(sequence)).as_str()))
    }
}
