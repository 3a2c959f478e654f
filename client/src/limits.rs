//! Limits and configuration for a client connection.

use crate::error::{ConfigError, ClientResult};

/// Client-side capacities and policy windows.
///
/// Ring capacities must be powers of two: slots are addressed with
/// `sequence & (capacity - 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientLimits {
    /// Snapshots kept for delta decoding.
    pub history_capacity: usize,
    /// Entity states kept across all recent snapshots.
    pub entity_pool_capacity: usize,
    /// Pool slack: a base is usable only if fewer than `capacity - margin`
    /// states have been written since it.
    pub entity_pool_margin: usize,
    /// Reliable commands kept in each direction.
    pub command_capacity: usize,
    /// Acknowledgments older than this many commands are treated as corrupt.
    pub ack_window: usize,
    /// Outgoing packets remembered for round-trip estimation.
    pub rtt_window: usize,
    /// Configstring table size.
    pub max_configstrings: usize,
    /// Total configstring bytes, terminators included.
    pub max_gamestate_chars: usize,
    /// Number of client slots; voice senders must be below this.
    pub max_clients: usize,
    /// Entities a single snapshot may carry.
    pub max_snapshot_entities: usize,
    /// Events a single snapshot may carry.
    pub max_snapshot_events: usize,
    /// Voice sequence gaps at or above this restart the stream.
    pub max_voice_gap: usize,
}

impl Default for ClientLimits {
    fn default() -> Self {
        Self {
            history_capacity: 32,
            entity_pool_capacity: 16384,
            entity_pool_margin: 512,
            command_capacity: 64,
            ack_window: 64,
            rtt_window: 32,
            max_configstrings: 2736,
            max_gamestate_chars: 40000,
            max_clients: 64,
            max_snapshot_entities: 512,
            max_snapshot_events: 64,
            max_voice_gap: 16,
        }
    }
}

impl ClientLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            history_capacity: 8,
            entity_pool_capacity: 256,
            entity_pool_margin: 64,
            command_capacity: 8,
            ack_window: 8,
            rtt_window: 8,
            max_configstrings: 64,
            max_gamestate_chars: 2048,
            max_clients: 8,
            max_snapshot_entities: 64,
            max_snapshot_events: 8,
            max_voice_gap: 4,
        }
    }

    /// Checks the structural requirements of the rings.
    pub fn validate(&self) -> ClientResult<()> {
        power_of_two("history_capacity", self.history_capacity)?;
        power_of_two("entity_pool_capacity", self.entity_pool_capacity)?;
        power_of_two("command_capacity", self.command_capacity)?;
        power_of_two("rtt_window", self.rtt_window)?;
        if self.max_configstrings == 0 {
            return Err(ConfigError::Zero {
                name: "max_configstrings",
            }
            .into());
        }
        if self.entity_pool_margin < self.max_snapshot_entities {
            return Err(ConfigError::PoolMarginTooSmall {
                margin: self.entity_pool_margin,
                max_entities: self.max_snapshot_entities,
            }
            .into());
        }
        if self.entity_pool_margin >= self.entity_pool_capacity {
            return Err(ConfigError::PoolMarginTooLarge {
                margin: self.entity_pool_margin,
                capacity: self.entity_pool_capacity,
            }
            .into());
        }
        Ok(())
    }
}

fn power_of_two(name: &'static str, value: usize) -> ClientResult<()> {
    if value == 0 {
        return Err(ConfigError::Zero { name }.into());
    }
    if !value.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { name, value }.into());
    }
    Ok(())
}

/// Everything needed to open a [`ClientConnection`](crate::ClientConnection).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    pub wire: wire::Limits,
    pub client: ClientLimits,
    pub schema: schema::Schema,
}

impl ClientConfig {
    /// Small limits and the stock layouts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            wire: wire::Limits::for_testing(),
            client: ClientLimits::for_testing(),
            schema: schema::Schema::standard(),
        }
    }

    /// Validates every part of the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        self.client.validate()?;
        self.schema.validate()?;
        Ok(())
    }
}
