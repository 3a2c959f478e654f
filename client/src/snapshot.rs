//! Snapshot decoding and the packet-entity merge.

use bitstream::BitReader;
use schema::StateLayout;
use tracing::{debug, trace, warn};
use wire::{LimitKind as WireLimitKind, SnapFlags, ENTITY_NONE, ENTITY_NUM_BITS};

use crate::baseline::BaselineTable;
use crate::connection::{ClientConnection, ConnectionState};
use crate::delta::{read_entity_delta, read_player_delta};
use crate::dispatch::{InboundMessage, MessageReport, SnapshotOutcome, SnapshotReport};
use crate::entity::{EntityState, PlayerState};
use crate::error::{ClientError, ClientResult, LimitKind, SnapshotRejection};
use crate::history::EntityPool;

/// One reconstructed frame of world state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Set for keyframes and for deltas whose base checked out.
    pub valid: bool,
    /// Sequence of the message that carried the snapshot.
    pub message_num: i32,
    /// Message the snapshot was delta-compressed against; `None` for keyframes.
    pub delta_num: Option<i32>,
    pub server_time: i32,
    pub server_time_residual: u8,
    pub snap_flags: SnapFlags,
    /// Visibility bits for map areas.
    pub area_mask: Vec<u8>,
    pub player: PlayerState,
    /// Pool counter of the first entity.
    pub first_entity: u64,
    pub num_entities: usize,
    /// Highest reliable command received when the snapshot arrived.
    pub server_command_num: i32,
    /// Round-trip estimate in milliseconds.
    pub ping: i32,
    pub events: Vec<SnapshotEvent>,
}

/// A sound event attached to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SnapshotEvent {
    pub entity: u16,
    pub sound_index: u16,
    pub channel: u8,
    pub volume: u8,
}

/// Entities of a base snapshot inside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRange {
    pub first: u64,
    pub count: usize,
}

struct DeltaBase {
    player: PlayerState,
    entities: EntityRange,
}

impl ClientConnection {
    pub(crate) fn parse_snapshot(
        &mut self,
        reader: &mut BitReader<'_>,
        message: &InboundMessage<'_>,
        report: &mut MessageReport,
    ) -> ClientResult<()> {
        let message_num = message.sequence;
        let server_time = reader.read_i32()?;
        let server_time_residual = reader.read_u8()?;
        let delta = reader.read_u8()?;
        let delta_num = (delta != 0).then(|| message_num.wrapping_sub(i32::from(delta)));
        let snap_flags = SnapFlags::from_raw(reader.read_u8()?);

        // A rejected base is still decoded through, against no base, so the
        // reader ends where the server's writer did.
        let (base, rejection) = match delta_num.filter(|&num| num > 0) {
            None => (None, None),
            Some(num) => match self.delta_base(num) {
                Ok(base) => (Some(base), None),
                Err(rejection) => (None, Some(rejection)),
            },
        };

        let area_len = usize::from(reader.read_u8()?);
        wire::check_limit(
            WireLimitKind::AreaMaskBytes,
            self.config.wire.max_area_mask_bytes,
            area_len,
        )?;
        let area_mask = reader.read_bytes(area_len)?;

        let schema = &self.config.schema;
        let player = match &base {
            Some(base) => read_player_delta(reader, &schema.player, &base.player)?,
            None => read_player_delta(reader, &schema.player, &PlayerState::zero(&schema.player))?,
        };

        let first_entity = self.pool.written();
        let num_entities = read_packet_entities(
            reader,
            &schema.entity,
            base.as_ref().map(|base| base.entities),
            &self.baselines,
            &mut self.pool,
            self.config.client.max_snapshot_entities,
        )?;
        let events = read_events(reader, self.config.client.max_snapshot_events)?;

        let snapshot = Snapshot {
            valid: rejection.is_none(),
            message_num,
            delta_num,
            server_time,
            server_time_residual,
            snap_flags,
            area_mask,
            player,
            first_entity,
            num_entities,
            server_command_num: self.commands.watermark(),
            ping: wire::PING_UNKNOWN,
            events,
        };

        if let Some(rejection) = rejection {
            warn!(message_num, %rejection, "snapshot discarded");
            report.snapshots.push(SnapshotReport::new(&snapshot, SnapshotOutcome::Rejected(rejection)));
            return Ok(());
        }

        let snapshot = self.commit_snapshot(snapshot, message.realtime);
        report.snapshots.push(SnapshotReport::new(snapshot, SnapshotOutcome::Accepted));
        Ok(())
    }

    fn delta_base(&self, delta_num: i32) -> Result<DeltaBase, SnapshotRejection> {
        let base = self.history.base(delta_num)?;
        let distance = self.pool.distance(base.first_entity);
        let limit = (self.pool.capacity() - self.config.client.entity_pool_margin) as u64;
        if distance > limit {
            return Err(SnapshotRejection::BaseEntitiesOverwritten { distance, limit });
        }
        Ok(DeltaBase {
            player: base.player.clone(),
            entities: EntityRange {
                first: base.first_entity,
                count: base.num_entities,
            },
        })
    }

    fn commit_snapshot(&mut self, mut snapshot: Snapshot, realtime: i32) -> &Snapshot {
        self.history
            .invalidate_between(self.current.message_num, snapshot.message_num);

        if self.current.valid
            && self
                .current
                .snap_flags
                .server_count_changed(snapshot.snap_flags)
        {
            debug!(server_time = snapshot.server_time, "server restarted");
            self.server_start_time = snapshot.server_time;
        }

        snapshot.ping = self.packets.ping(snapshot.player.command_time, realtime);
        debug!(
            message_num = snapshot.message_num,
            delta_num = ?snapshot.delta_num,
            entities = snapshot.num_entities,
            ping = snapshot.ping,
            "snapshot accepted"
        );

        self.history.commit(snapshot.clone());
        self.current = snapshot;
        self.new_snapshot = true;
        if self.state == ConnectionState::Loading {
            self.state = ConnectionState::Active;
        }
        &self.current
    }
}

/// Merges a base entity list with the wire delta into the pool.
///
/// Both the base list and the wire numbers ascend, so one forward pass
/// produces the new ascending list:
/// - base entities the wire skips over are copied unchanged,
/// - entities on both sides are delta-decoded against the base state,
/// - entities only on the wire are delta-decoded against their baseline.
///
/// Removed entities are not stored. Returns the number of entities stored.
pub fn read_packet_entities(
    reader: &mut BitReader<'_>,
    layout: &StateLayout,
    base: Option<EntityRange>,
    baselines: &BaselineTable,
    pool: &mut EntityPool,
    max_entities: usize,
) -> ClientResult<usize> {
    let base = base.unwrap_or(EntityRange { first: 0, count: 0 });
    let old_number = |pool: &EntityPool, index: usize| -> u32 {
        if index < base.count {
            u32::from(pool.get(base.first + index as u64).number)
        } else {
            u32::MAX
        }
    };

    let mut stored = 0usize;
    let mut old_index = 0usize;
    let mut previous: Option<u16> = None;
    loop {
        let new_number = reader.read_bits(ENTITY_NUM_BITS)? as u16;
        if new_number == ENTITY_NONE {
            break;
        }
        if let Some(previous) = previous.filter(|&previous| new_number <= previous) {
            return Err(ClientError::InvalidEntityOrder {
                previous,
                current: new_number,
            });
        }
        previous = Some(new_number);

        while old_number(pool, old_index) < u32::from(new_number) {
            let state = pool.get(base.first + old_index as u64).clone();
            trace!(number = state.number, "unchanged");
            store(pool, state, &mut stored, max_entities)?;
            old_index += 1;
        }

        let state = if old_number(pool, old_index) == u32::from(new_number) {
            trace!(number = new_number, "delta");
            let old = pool.get(base.first + old_index as u64);
            old_index += 1;
            read_entity_delta(reader, layout, old, new_number)?
        } else {
            trace!(number = new_number, "baseline");
            read_entity_delta(reader, layout, baselines.get(new_number), new_number)?
        };
        store(pool, state, &mut stored, max_entities)?;
    }

    while old_index < base.count {
        let state = pool.get(base.first + old_index as u64).clone();
        trace!(number = state.number, "unchanged");
        store(pool, state, &mut stored, max_entities)?;
        old_index += 1;
    }
    Ok(stored)
}

fn store(
    pool: &mut EntityPool,
    state: EntityState,
    stored: &mut usize,
    max_entities: usize,
) -> ClientResult<()> {
    if state.is_removed() {
        return Ok(());
    }
    if *stored >= max_entities {
        return Err(ClientError::LimitsExceeded {
            kind: LimitKind::SnapshotEntities,
            limit: max_entities,
            actual: *stored + 1,
        });
    }
    pool.push(state);
    *stored += 1;
    Ok(())
}

fn read_events(reader: &mut BitReader<'_>, max_events: usize) -> ClientResult<Vec<SnapshotEvent>> {
    if !reader.read_bit()? {
        return Ok(Vec::new());
    }
    let count = usize::from(reader.read_u8()?);
    if count > max_events {
        return Err(ClientError::LimitsExceeded {
            kind: LimitKind::SnapshotEvents,
            limit: max_events,
            actual: count,
        });
    }
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        events.push(SnapshotEvent {
            entity: reader.read_bits(ENTITY_NUM_BITS)? as u16,
            sound_index: reader.read_u16()?,
            channel: reader.read_u8()?,
            volume: reader.read_u8()?,
        });
    }
    Ok(events)
}
