//! Size limits applied while reading a server message.

/// Byte and character bounds enforced by the message reader.
///
/// Every length read from the wire is compared against these before any
/// buffer is allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Maximum size of one inbound message.
    pub max_message_bytes: usize,
    /// Maximum length of a snapshot's area visibility mask.
    pub max_area_mask_bytes: usize,
    /// Characters kept from an ordinary string. Longer strings are consumed and truncated.
    pub max_string_chars: usize,
    /// Characters kept from a configstring or other big string.
    pub max_big_string_chars: usize,
    /// Maximum bytes carried by one download chunk.
    pub max_download_chunk: usize,
    /// Largest voice payload the client will accept for playback.
    pub max_voice_payload: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_bytes: 16384,
            max_area_mask_bytes: 32,
            max_string_chars: 1024,
            max_big_string_chars: 8192,
            max_download_chunk: 16384,
            max_voice_payload: 4000,
        }
    }
}

impl Limits {
    /// Smaller limits for exercising bound checks in tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_message_bytes: 2048,
            max_area_mask_bytes: 8,
            max_string_chars: 64,
            max_big_string_chars: 256,
            max_download_chunk: 512,
            max_voice_payload: 128,
        }
    }

    /// Effectively unbounded limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_message_bytes: usize::MAX,
            max_area_mask_bytes: usize::MAX,
            max_string_chars: usize::MAX,
            max_big_string_chars: usize::MAX,
            max_download_chunk: usize::MAX,
            max_voice_payload: usize::MAX,
        }
    }
}
