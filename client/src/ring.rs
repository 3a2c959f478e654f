//! Power-of-two ring storage addressed by sequence number.

/// Fixed ring of slots addressed by `sequence & (capacity - 1)`.
///
/// The ring itself does not know which sequence a slot currently holds;
/// callers store that alongside the value and check it on read.
#[derive(Debug, Clone)]
pub(crate) struct Ring<T> {
    slots: Vec<T>,
    mask: usize,
}

impl<T: Default> Ring<T> {
    /// Creates a ring of `capacity` default slots.
    ///
    /// `capacity` must be a power of two; [`ClientLimits::validate`] checks
    /// this before any ring is built.
    ///
    /// [`ClientLimits::validate`]: crate::ClientLimits::validate
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Self {
            slots,
            mask: capacity - 1,
        }
    }

    /// Resets every slot to its default.
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = T::default());
    }
}

impl<T> Ring<T> {
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, sequence: u64) -> &T {
        &self.slots[self.index(sequence)]
    }

    pub(crate) fn get_mut(&mut self, sequence: u64) -> &mut T {
        let index = self.index(sequence);
        &mut self.slots[index]
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }

    fn index(&self, sequence: u64) -> usize {
        (sequence as usize) & self.mask
    }
}

/// Maps a signed wire sequence onto ring addressing.
///
/// Negative sequences wrap the same way the two's complement mask would.
pub(crate) const fn seq_key(sequence: i32) -> u64 {
    sequence as u32 as u64
}
