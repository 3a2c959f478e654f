//! Protocol constants shared by the server and the client.

/// Bits used to encode an entity number.
pub const ENTITY_NUM_BITS: u8 = 10;

/// Number of addressable entity numbers.
pub const MAX_ENTITIES: usize = 1 << ENTITY_NUM_BITS;

/// Reserved entity number: terminates an entity list and marks a removed entity.
pub const ENTITY_NONE: u16 = (MAX_ENTITIES - 1) as u16;

/// Configstring index holding the server info string.
pub const CS_SERVERINFO: usize = 0;

/// Configstring index holding the system info string.
pub const CS_SYSTEMINFO: usize = 1;

/// Bits used by the voice flag field.
pub const VOIP_FLAG_BITS: u8 = 2;

/// Ping reported when no outgoing packet matches a snapshot.
pub const PING_UNKNOWN: i32 = 999;

/// Snapshot flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SnapFlags(u8);

impl SnapFlags {
    /// The server withheld this snapshot because of rate limiting.
    pub const RATE_DELAYED: u8 = 1 << 0;

    /// The client is not yet active on the server.
    pub const NOT_ACTIVE: u8 = 1 << 1;

    /// Toggled by the server every time the world restarts.
    pub const SERVERCOUNT: u8 = 1 << 2;

    /// Creates new flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if the rate-delayed bit is set.
    #[must_use]
    pub const fn is_rate_delayed(self) -> bool {
        self.0 & Self::RATE_DELAYED != 0
    }

    /// Returns `true` if the not-active bit is set.
    #[must_use]
    pub const fn is_not_active(self) -> bool {
        self.0 & Self::NOT_ACTIVE != 0
    }

    /// Returns `true` if the world-restart bit differs between `self` and `other`.
    #[must_use]
    pub const fn server_count_changed(self, other: Self) -> bool {
        (self.0 ^ other.0) & Self::SERVERCOUNT != 0
    }
}

/// Voice playback flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VoipFlags(u8);

impl VoipFlags {
    /// Play positioned at the speaking entity.
    pub const SPATIAL: u8 = 1 << 0;

    /// Play directly, unpositioned.
    pub const DIRECT: u8 = 1 << 1;

    /// Creates new flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if spatial playback is requested.
    #[must_use]
    pub const fn is_spatial(self) -> bool {
        self.0 & Self::SPATIAL != 0
    }

    /// Returns `true` if direct playback is requested.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        self.0 & Self::DIRECT != 0
    }
}
