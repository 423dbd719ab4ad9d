use core::fmt;

/// A 64-bit Snowflake ID as issued by an [`Engine`].
///
/// - 1 bit reserved (always zero, so the value also fits an `i64`)
/// - 41 bits timestamp (ms since the engine's epoch)
/// - 10 bits instance ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              12 11             0
///              +--------------+----------------+------------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | instance ID (10) | sequence (12) |
///              +--------------+----------------+------------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------->|
/// ```
///
/// IDs compare by their raw value, which orders them by timestamp first, then
/// instance ID, then sequence.
///
/// # Example
///
/// ```
/// use flurry::FlakeId;
///
/// let id = FlakeId::from_components(1000, 513, 9);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.instance_id(), 513);
/// assert_eq!(id.sequence(), 9);
/// assert_eq!(FlakeId::from_raw(id.to_raw()), id);
/// ```
///
/// [`Engine`]: crate::Engine
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlakeId {
    id: u64,
}

impl FlakeId {
    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for the 10-bit instance ID field. Occupies bits 12 through 21.
    pub const INSTANCE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its position.
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the instance ID to its position.
    pub const INSTANCE_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field.
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the three fields into an ID.
    ///
    /// Each component is masked to its field width first, so out-of-range
    /// values wrap instead of bleeding into the neighbouring field.
    pub const fn from_components(timestamp: u64, instance_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let instance_id = (instance_id & Self::INSTANCE_ID_MASK) << Self::INSTANCE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | instance_id | sequence,
        }
    }

    /// Extracts the timestamp (ms since the epoch) from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the instance ID from the packed ID.
    pub const fn instance_id(&self) -> u64 {
        (self.id >> Self::INSTANCE_ID_SHIFT) & Self::INSTANCE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the largest timestamp the layout can hold.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the largest instance ID the layout can hold.
    pub const fn max_instance_id() -> u64 {
        Self::INSTANCE_ID_MASK
    }

    /// Returns the largest sequence value the layout can hold.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the raw 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw 64-bit value without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 20-digit string.
    ///
    /// Padded strings sort lexicographically in the same order as the IDs.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for FlakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakeId")
            .field("id", &format_args!("{} (0x{:016x})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("instance_id", &self.instance_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
