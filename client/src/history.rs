//! Snapshot history and the shared parse-entity pool.

use crate::entity::EntityState;
use crate::error::SnapshotRejection;
use crate::ring::{seq_key, Ring};
use crate::snapshot::Snapshot;

/// Recently accepted snapshots, addressed by message number.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    ring: Ring<Snapshot>,
}

impl SnapshotHistory {
    /// Creates a history of `capacity` invalid slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
        }
    }

    /// Returns the capacity of the history.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the snapshot for `message_num` if its slot still holds it.
    #[must_use]
    pub fn get(&self, message_num: i32) -> Option<&Snapshot> {
        let slot = self.ring.get(seq_key(message_num));
        (slot.valid && slot.message_num == message_num).then_some(slot)
    }

    /// Looks up a delta base, reporting why it cannot be used.
    ///
    /// Pool reachability is checked separately by the caller.
    pub fn base(&self, delta_num: i32) -> Result<&Snapshot, SnapshotRejection> {
        let slot = self.ring.get(seq_key(delta_num));
        if !slot.valid {
            return Err(SnapshotRejection::InvalidBase { delta_num });
        }
        if slot.message_num != delta_num {
            return Err(SnapshotRejection::BaseTooOld {
                delta_num,
                stored: slot.message_num,
            });
        }
        Ok(slot)
    }

    /// Invalidates the slots of every message strictly between `last` and
    /// `next`, at most `capacity - 1` of them.
    pub fn invalidate_between(&mut self, last: i32, next: i32) {
        let span = (self.capacity() - 1) as i64;
        let mut message = i64::from(last) + 1;
        if i64::from(next) - message >= span {
            message = i64::from(next) - span;
        }
        while message < i64::from(next) {
            self.ring.get_mut(seq_key(message as i32)).valid = false;
            message += 1;
        }
    }

    /// Marks every slot invalid.
    pub fn invalidate_all(&mut self) {
        for slot in self.ring.iter_mut() {
            slot.valid = false;
        }
    }

    /// Stores an accepted snapshot in its slot.
    pub fn commit(&mut self, snapshot: Snapshot) {
        let key = seq_key(snapshot.message_num);
        *self.ring.get_mut(key) = snapshot;
    }
}

/// Ring of entity states shared by every snapshot in the history.
///
/// Each snapshot owns the contiguous range
/// `[first_entity, first_entity + num_entities)` of the global write counter.
#[derive(Debug, Clone)]
pub struct EntityPool {
    ring: Ring<EntityState>,
    written: u64,
}

impl EntityPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            written: 0,
        }
    }

    /// Returns the capacity of the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Total number of states ever written.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Appends a state and returns its counter.
    pub fn push(&mut self, state: EntityState) -> u64 {
        let counter = self.written;
        *self.ring.get_mut(counter) = state;
        self.written += 1;
        counter
    }

    /// Returns the state stored for `counter`.
    ///
    /// The slot may have been overwritten if `counter` is older than
    /// `written - capacity`; callers check [`distance`](Self::distance) first.
    #[must_use]
    pub fn get(&self, counter: u64) -> &EntityState {
        self.ring.get(counter)
    }

    /// States written since `counter`.
    #[must_use]
    pub const fn distance(&self, counter: u64) -> u64 {
        self.written.saturating_sub(counter)
    }

    /// Iterates over `count` states starting at `first`.
    pub fn range(&self, first: u64, count: usize) -> impl Iterator<Item = &EntityState> {
        (first..first + count as u64).map(move |counter| self.ring.get(counter))
    }
}
