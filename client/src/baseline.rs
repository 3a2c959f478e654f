//! Per-entity baselines established by the gamestate.

use schema::StateLayout;
use wire::MAX_ENTITIES;

use crate::entity::EntityState;
use crate::error::{ClientError, ClientResult};

/// Baseline state for every entity number.
///
/// Entities the gamestate did not mention keep the null state.
#[derive(Debug, Clone)]
pub struct BaselineTable {
    entries: Vec<EntityState>,
}

impl BaselineTable {
    /// Creates a table of null states laid out by `layout`.
    #[must_use]
    pub fn new(layout: &StateLayout) -> Self {
        let entries = (0..MAX_ENTITIES)
            .map(|number| EntityState::null(layout, number as u16))
            .collect();
        Self { entries }
    }

    /// Returns the baseline for `number`.
    ///
    /// # Panics
    ///
    /// Panics if `number >= MAX_ENTITIES`; wire entity numbers are
    /// `ENTITY_NUM_BITS` wide and cannot exceed it.
    #[must_use]
    pub fn get(&self, number: u16) -> &EntityState {
        &self.entries[usize::from(number)]
    }

    /// Replaces the baseline for `number`.
    pub fn set(&mut self, number: u16, state: EntityState) -> ClientResult<()> {
        let slot = self
            .entries
            .get_mut(usize::from(number))
            .ok_or(ClientError::EntityNumberOutOfRange {
                number: u32::from(number),
            })?;
        *slot = state;
        Ok(())
    }

    /// Resets every entry to the null state.
    pub fn reset(&mut self, layout: &StateLayout) {
        for (number, entry) in self.entries.iter_mut().enumerate() {
            *entry = EntityState::null(layout, number as u16);
        }
    }

    /// Iterates over entries that differ from the null state.
    pub fn non_null<'a>(
        &'a self,
        layout: &'a StateLayout,
    ) -> impl Iterator<Item = &'a EntityState> + 'a {
        self.entries
            .iter()
            .filter(move |entry| **entry != EntityState::null(layout, entry.number))
    }
}
