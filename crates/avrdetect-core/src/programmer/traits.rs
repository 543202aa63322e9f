//! Programmer trait definitions
//!
//! The ISP link is strictly synchronous: one byte is clocked out while one
//! byte is clocked in, and only one instruction is ever in flight.

use crate::error::Result;

/// ISP byte transport
///
/// This trait represents a programmer that can drive the RESET and SCK lines
/// of an AVR target and exchange bytes with it over MOSI/MISO.
///
/// ## Line levels
///
/// RESET is active low on the target: `set_reset(false)` holds the chip in
/// reset, which is the state it must be in while in programming mode.
/// SCK must be held low while RESET is pulsed.
///
/// ## Example: Hardware SPI programmer
///
/// ```ignore
/// impl IspTransport for MySpi {
///     fn transfer(&mut self, byte: u8) -> Result<u8> {
///         self.spi.exchange(byte).map_err(|_| ProtocolError::TransferFailed.into())
///     }
///
///     fn set_reset(&mut self, high: bool) -> Result<()> {
///         self.reset_pin.set(high)
///     }
///     // ...
/// }
/// ```
pub trait IspTransport {
    /// Exchange one byte with the target (SPI mode 0, MSB first)
    fn transfer(&mut self, byte: u8) -> Result<u8>;

    /// Drive the target RESET line
    fn set_reset(&mut self, high: bool) -> Result<()>;

    /// Drive the SCK line
    fn set_sck(&mut self, high: bool) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Let the target run again after a session
    ///
    /// Default implementation releases RESET.
    fn release(&mut self) -> Result<()> {
        self.set_reset(true)
    }
}

// Blanket impl for boxed transports to allow trait objects
#[cfg(feature = "alloc")]
impl IspTransport for alloc::boxed::Box<dyn IspTransport + Send> {
    fn transfer(&mut self, byte: u8) -> Result<u8> {
        (**self).transfer(byte)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        (**self).set_reset(high)
    }

    fn set_sck(&mut self, high: bool) -> Result<()> {
        (**self).set_sck(high)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

/// Information about a programmer
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the programmer
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this programmer requires elevated privileges
    pub requires_root: bool,
}
