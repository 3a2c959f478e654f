//! Packed configstring storage.

use crate::error::{ClientError, ClientResult, LimitKind};

/// Indexed strings delivered by the gamestate, packed into one buffer.
///
/// Byte 0 of the buffer is a shared empty string: every index starts out
/// pointing at it. Each stored string is followed by a NUL terminator that
/// counts against the byte budget.
#[derive(Debug, Clone)]
pub struct ConfigStrings {
    offsets: Vec<usize>,
    data: String,
    max_chars: usize,
}

impl ConfigStrings {
    /// Creates an empty table of `count` strings sharing `max_chars` bytes.
    #[must_use]
    pub fn new(count: usize, max_chars: usize) -> Self {
        Self {
            offsets: vec![0; count],
            data: String::from("\0"),
            max_chars,
        }
    }

    /// Number of indices in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if the table has no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Bytes used so far, including the shared empty string.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Appends `value` and points `index` at it.
    pub fn set(&mut self, index: usize, value: &str) -> ClientResult<()> {
        if index >= self.offsets.len() {
            return Err(ClientError::ConfigstringIndex {
                index: index as i32,
                max: self.offsets.len(),
            });
        }
        let needed = self.data.len() + value.len() + 1;
        if needed > self.max_chars {
            return Err(ClientError::LimitsExceeded {
                kind: LimitKind::GamestateChars,
                limit: self.max_chars,
                actual: needed,
            });
        }
        self.offsets[index] = self.data.len();
        self.data.push_str(value);
        self.data.push('\0');
        Ok(())
    }

    /// Returns the string at `index`, or `""` if unset or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        let Some(&offset) = self.offsets.get(index) else {
            return "";
        };
        let tail = &self.data[offset..];
        tail.split('\0').next().unwrap_or("")
    }

    /// Iterates over the indices holding a non-empty string.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.offsets
            .iter()
            .enumerate()
            .filter(|(_, &offset)| offset != 0)
            .map(|(index, _)| (index, self.get(index)))
    }

    /// Drops every string.
    pub fn clear(&mut self) {
        self.offsets.iter_mut().for_each(|offset| *offset = 0);
        self.data.clear();
        self.data.push('\0');
    }
}
