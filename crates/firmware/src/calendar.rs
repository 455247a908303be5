//! RTC calendar → seconds.
//!
//! The STM32 RTC keeps BCD calendar registers rather than a counter. The
//! sleep bridge only needs differences between two readings, so the
//! calendar is flattened to seconds since 2000-01-01 00:00:00 (the reset
//! value of the RTC date register).

// Every input is range-checked in `CalendarTime::new`; the sums below are
// bounded by 100 years of seconds.
#![allow(clippy::arithmetic_side_effects)]

const SECONDS_PER_DAY: u64 = 86_400;

/// Days before the first of each month in a non-leap year.
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Decode one packed BCD byte (`0x59` → 59).
pub const fn from_bcd(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}

const fn is_leap(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Calendar reading in the RTC's range (years 2000–2099, 24-hour clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl CalendarTime {
    /// Validate a reading. `None` if any field is out of range.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let valid = (2000..=2099).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour < 24
            && minute < 60
            && second < 60;
        valid.then_some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Days since 2000-01-01.
    pub fn days_since_epoch(&self) -> u64 {
        let mut days: u64 = (2000..self.year)
            .map(|y| if is_leap(y) { 366 } else { 365 })
            .sum();
        let month_index = usize::from(self.month - 1);
        days += DAYS_BEFORE_MONTH
            .get(month_index)
            .copied()
            .map_or(0, u64::from);
        if self.month > 2 && is_leap(self.year) {
            days += 1;
        }
        days + u64::from(self.day - 1)
    }

    /// Seconds since 2000-01-01 00:00:00.
    pub fn seconds_since_epoch(&self) -> u64 {
        self.days_since_epoch() * SECONDS_PER_DAY
            + u64::from(self.hour) * 3_600
            + u64::from(self.minute) * 60
            + u64::from(self.second)
    }

    /// Microseconds since 2000-01-01 00:00:00.
    pub fn micros_since_epoch(&self) -> u64 {
        self.seconds_since_epoch() * 1_000_000
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bcd_digits() {
        assert_eq!(from_bcd(0x00), 0);
        assert_eq!(from_bcd(0x09), 9);
        assert_eq!(from_bcd(0x59), 59);
        assert_eq!(from_bcd(0x23), 23);
    }

    #[test]
    fn epoch_is_zero() {
        let t = CalendarTime::new(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(t.seconds_since_epoch(), 0);
    }

    #[test]
    fn leap_day_of_2000_is_counted() {
        // 31 (Jan) + 29 (Feb) days before March.
        let march = CalendarTime::new(2000, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(march.days_since_epoch(), 60);
        let next_year = CalendarTime::new(2001, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(next_year.days_since_epoch(), 366);
    }

    #[test]
    fn mid_century_reading() {
        let t = CalendarTime::new(2024, 2, 29, 12, 34, 56).unwrap();
        assert_eq!(t.days_since_epoch(), 8_825);
        assert_eq!(t.seconds_since_epoch(), 762_525_296);
    }

    #[test]
    fn difference_across_midnight() {
        let before = CalendarTime::new(2031, 12, 31, 23, 59, 30).unwrap();
        let after = CalendarTime::new(2032, 1, 1, 0, 0, 15).unwrap();
        assert_eq!(after.micros_since_epoch() - before.micros_since_epoch(), 45_000_000);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(CalendarTime::new(1999, 12, 31, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2000, 13, 1, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2000, 1, 0, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2000, 1, 1, 24, 0, 0).is_none());
    }
}
