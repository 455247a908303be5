//! Retained state in the RTC backup registers.
//!
//! The backup domain stays powered in standby, so the 32 backup registers
//! survive deep sleep. The record takes the first ten.

use embassy_stm32::pac;
use platform::{RetainedState, RetainedStore, StorageError, RETAINED_LEN};

const WORDS: usize = RETAINED_LEN / 4;

/// [`RetainedStore`] over `RTC_BKP0R`..`RTC_BKP9R`.
pub struct BackupRegisters;

impl BackupRegisters {
    fn read_bytes() -> [u8; RETAINED_LEN] {
        let mut bytes = [0u8; RETAINED_LEN];
        for (i, chunk) in bytes.chunks_exact_mut(4).enumerate().take(WORDS) {
            chunk.copy_from_slice(&pac::RTC.bkpr(i).read().bkp().to_le_bytes());
        }
        bytes
    }

    fn write_bytes(bytes: &[u8; RETAINED_LEN]) {
        pac::PWR.cr1().modify(|w| w.set_dbp(true));
        for (i, chunk) in bytes.chunks_exact(4).enumerate().take(WORDS) {
            let word = u32::from_le_bytes([
                chunk.first().copied().unwrap_or(0),
                chunk.get(1).copied().unwrap_or(0),
                chunk.get(2).copied().unwrap_or(0),
                chunk.get(3).copied().unwrap_or(0),
            ]);
            pac::RTC.bkpr(i).write(|w| w.set_bkp(word));
        }
    }
}

impl RetainedStore for BackupRegisters {
    fn load(&mut self) -> Result<RetainedState, StorageError> {
        RetainedState::from_bytes(&Self::read_bytes())
    }

    fn store(&mut self, state: &RetainedState) -> Result<(), StorageError> {
        Self::write_bytes(&state.to_bytes());
        Ok(())
    }

    fn invalidate(&mut self) -> Result<(), StorageError> {
        Self::write_bytes(&[0u8; RETAINED_LEN]);
        Ok(())
    }
}
