//! Bitbang ISP helpers
//!
//! Programmers that drive the ISP lines through software-controlled GPIO
//! (Linux GPIO character device, microcontroller pins) implement
//! [`BitbangIspPins`] and get byte exchange from [`transfer_byte`].
//!
//! Hardware SPI programmers should implement `IspTransport::transfer`
//! directly instead.
//!
//! The ISP clock must stay below a quarter of the target's CPU clock, so a
//! factory-fresh chip running at 1 MHz needs a half period of at least 2us.

use crate::error::{ProtocolError, Result};

/// Trait for low-level bitbang ISP operations
pub trait BitbangIspPins {
    /// Set the RESET line level
    fn set_reset(&mut self, high: bool);

    /// Set clock line value
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line value
    fn get_miso(&self) -> bool;

    /// Delay for half a clock period
    fn half_period_delay(&self);

    /// Optional: Set SCK and get MISO atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `get_miso`.
    fn set_sck_get_miso(&mut self, sck: bool) -> bool {
        self.set_sck(sck);
        self.get_miso()
    }

    /// Report and clear a pin failure since the last call
    ///
    /// Pin methods cannot return errors, so implementations that can fail
    /// latch the first failure and hand it back here.
    fn take_fault(&mut self) -> bool {
        false
    }
}

/// Exchange one byte, MSB first, SPI mode 0
///
/// MOSI is set up while SCK is low, MISO is sampled on the rising edge, and
/// SCK is left low on return.
pub fn transfer_byte<B: BitbangIspPins + ?Sized>(pins: &mut B, byte: u8) -> u8 {
    let mut result = 0u8;
    for bit in (0..8).rev() {
        pins.set_mosi((byte >> bit) & 1 != 0);
        pins.half_period_delay();
        if pins.set_sck_get_miso(true) {
            result |= 1 << bit;
        }
        pins.half_period_delay();
        pins.set_sck(false);
    }
    result
}

/// Exchange one byte and fail if any pin operation failed during it
pub fn transfer_checked<B: BitbangIspPins + ?Sized>(pins: &mut B, byte: u8) -> Result<u8> {
    let result = transfer_byte(pins, byte);
    if pins.take_fault() {
        return Err(ProtocolError::TransferFailed.into());
    }
    Ok(result)
}
