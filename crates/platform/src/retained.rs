//! Retained (sleep-surviving) state
//!
//! A small record that lives in battery-backed storage (RTC backup registers
//! on hardware). It is written just before deep sleep and read once at boot.
//!
//! # Encoding
//!
//! ```text
//! offset  size  field
//!      0     4  magic "PWRS" (little-endian u32)
//!      4     8  clock_offset_us
//!     12     8  rtc_at_sleep_us      (u64::MAX = none)
//!     20     8  planned_sleep_us     (u64::MAX = none)
//!     28     8  alarm_snoozed_at_us
//!     36     4  CRC-32 of bytes 0..36
//! ```
//!
//! The record is 40 bytes, exactly ten 32-bit backup registers.

use thiserror_no_std::Error;

/// Encoded size of a [`RetainedState`] in bytes.
pub const RETAINED_LEN: usize = 40;

const MAGIC: u32 = u32::from_le_bytes(*b"PWRS");
const NONE_SENTINEL: u64 = u64::MAX;
const CRC_OFFSET: usize = RETAINED_LEN - 4;

/// Retained storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Magic or checksum mismatch (never written, or lost power)
    #[error("retained record corrupt or never written")]
    Corrupt,
    /// Backing store could not be accessed
    #[error("retained storage unavailable")]
    Unavailable,
}

impl StorageError {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            StorageError::Corrupt => "corrupt",
            StorageError::Unavailable => "unavailable",
        }
    }
}

/// State that survives deep sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetainedState {
    /// Monotonic time since first boot at the moment deep sleep began.
    pub clock_offset_us: u64,
    /// Wall clock reading taken just before sleeping, if it was set.
    pub rtc_at_sleep_us: Option<u64>,
    /// Length of the armed wake timer, if one was armed.
    pub planned_sleep_us: Option<u64>,
    /// Alarm snooze time, in the same timebase as `clock_offset_us`.
    pub alarm_snoozed_at_us: u64,
}

impl RetainedState {
    /// Encode into the fixed layout described in the module docs.
    pub fn to_bytes(&self) -> [u8; RETAINED_LEN] {
        let mut out = [0u8; RETAINED_LEN];
        let fields: [u64; 4] = [
            self.clock_offset_us,
            self.rtc_at_sleep_us.unwrap_or(NONE_SENTINEL),
            self.planned_sleep_us.unwrap_or(NONE_SENTINEL),
            self.alarm_snoozed_at_us,
        ];
        let (magic, rest) = out.split_at_mut(4);
        magic.copy_from_slice(&MAGIC.to_le_bytes());
        for (chunk, value) in rest.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        let crc = checksum(&out);
        if let Some(tail) = out.get_mut(CRC_OFFSET..) {
            tail.copy_from_slice(&crc.to_le_bytes());
        }
        out
    }

    /// Decode a record, validating magic and checksum.
    pub fn from_bytes(bytes: &[u8; RETAINED_LEN]) -> Result<Self, StorageError> {
        let (body, crc) = bytes.split_at(CRC_OFFSET);
        let stored_crc = u32::from_le_bytes(crc.try_into().map_err(|_| StorageError::Corrupt)?);
        if stored_crc != checksum(bytes) {
            return Err(StorageError::Corrupt);
        }
        let (magic, fields) = body.split_at(4);
        if u32::from_le_bytes(magic.try_into().map_err(|_| StorageError::Corrupt)?) != MAGIC {
            return Err(StorageError::Corrupt);
        }

        let mut values = [0u64; 4];
        for (value, chunk) in values.iter_mut().zip(fields.chunks_exact(8)) {
            *value = u64::from_le_bytes(chunk.try_into().map_err(|_| StorageError::Corrupt)?);
        }
        let [clock_offset_us, rtc, planned, alarm_snoozed_at_us] = values;
        let optional = |v: u64| (v != NONE_SENTINEL).then_some(v);

        Ok(Self {
            clock_offset_us,
            rtc_at_sleep_us: optional(rtc),
            planned_sleep_us: optional(planned),
            alarm_snoozed_at_us,
        })
    }
}

fn checksum(record: &[u8; RETAINED_LEN]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(record.get(..CRC_OFFSET).unwrap_or_default());
    hasher.finalize()
}

/// Battery-backed storage for one [`RetainedState`].
pub trait RetainedStore {
    /// Read the record. [`StorageError::Corrupt`] after a cold start.
    fn load(&mut self) -> Result<RetainedState, StorageError>;

    /// Overwrite the record.
    fn store(&mut self, state: &RetainedState) -> Result<(), StorageError>;

    /// Invalidate the record so the next boot is treated as a first boot.
    fn invalidate(&mut self) -> Result<(), StorageError>;
}
