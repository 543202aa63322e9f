//! ISP session controller
//!
//! Owns the transport and the per-run [`SessionState`]. Entering programming
//! mode is the only operation that is retried; every read after that is a
//! single 4-byte exchange through [`IspSession::read_byte`].

use crate::error::{ProtocolError, Result};
use crate::isp::{opcodes, IspCommand};
use crate::programmer::IspTransport;

/// Default number of programming enable attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
/// Default delay before each programming enable attempt (ms)
pub const DEFAULT_RETRY_DELAY_MS: u32 = 100;
/// Default positive RESET pulse width (us), at least two target clocks
pub const DEFAULT_RESET_PULSE_US: u32 = 10;
/// Default wait after pulling RESET low (ms), at least 20 ms
pub const DEFAULT_RESET_SETTLE_MS: u32 = 25;

/// Timing and retry configuration for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of programming enable attempts before giving up
    pub max_attempts: u32,
    /// Delay before each attempt in milliseconds
    pub retry_delay_ms: u32,
    /// Width of the RESET high pulse in microseconds
    pub reset_pulse_us: u32,
    /// Time to wait after RESET goes low in milliseconds
    pub reset_settle_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            reset_pulse_us: DEFAULT_RESET_PULSE_US,
            reset_settle_ms: DEFAULT_RESET_SETTLE_MS,
        }
    }
}

impl SessionConfig {
    /// Set the number of programming enable attempts (at least 1)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay before each attempt
    pub fn with_retry_delay_ms(mut self, ms: u32) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    /// Set the RESET pulse width
    pub fn with_reset_pulse_us(mut self, us: u32) -> Self {
        self.reset_pulse_us = us;
        self
    }

    /// Set the settle time after RESET goes low
    pub fn with_reset_settle_ms(mut self, ms: u32) -> Self {
        self.reset_settle_ms = ms;
        self
    }
}

/// Mutable state of one detection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The target acknowledged programming enable
    pub in_programming_mode: bool,
    /// Programming enable was given up on; the session stays unusable
    pub entry_failed: bool,
    /// Bits 16+ of the byte address whose extended address was last loaded
    ///
    /// `None` until the first flash read.
    pub last_extended_address: Option<u8>,
}

/// ISP session over a transport
pub struct IspSession<T: IspTransport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
}

impl<T: IspTransport> IspSession<T> {
    /// Create a new session; the target is not touched until
    /// [`enter_programming_mode`](Self::enter_programming_mode)
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: SessionState::default(),
        }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the current session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Whether reads may be issued
    pub fn is_in_programming_mode(&self) -> bool {
        self.state.in_programming_mode
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Pulse RESET and send programming enable until the target acknowledges
    ///
    /// Each attempt waits `retry_delay_ms`, holds SCK low, pulses RESET high
    /// for `reset_pulse_us`, pulls it low, waits `reset_settle_ms` and sends
    /// `AC 53 00 00`. The target is in sync when it echoes `0x53` as the
    /// third response byte.
    ///
    /// Returns the number of attempts used. After `max_attempts` failures
    /// the session is marked failed and every later call, including reads,
    /// returns an error.
    pub fn enter_programming_mode(&mut self) -> Result<u32> {
        if self.state.entry_failed {
            return Err(ProtocolError::EntryTimeout {
                attempts: self.config.max_attempts,
            }
            .into());
        }
        if self.state.in_programming_mode {
            return Ok(0);
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            self.transport.delay_ms(self.config.retry_delay_ms);
            self.transport.set_sck(false)?;
            self.transport.set_reset(true)?;
            self.transport.delay_us(self.config.reset_pulse_us);
            self.transport.set_reset(false)?;
            self.transport.delay_ms(self.config.reset_settle_ms);

            let response = self.exchange(IspCommand::program_enable())?;
            if response[2] == opcodes::PROGRAM_ACKNOWLEDGE {
                log::debug!("isp: Programming mode entered after {} attempt(s)", attempts);
                self.state.in_programming_mode = true;
                self.state.last_extended_address = None;
                return Ok(attempts);
            }

            log::trace!(
                "isp: Attempt {} not acknowledged (got {:02X} {:02X} {:02X} {:02X})",
                attempts,
                response[0],
                response[1],
                response[2],
                response[3]
            );

            if attempts >= self.config.max_attempts {
                log::warn!(
                    "isp: Target did not enter programming mode after {} attempts",
                    attempts
                );
                self.state.entry_failed = true;
                return Err(ProtocolError::EntryTimeout { attempts }.into());
            }
        }
    }

    /// Issue one 4-byte instruction and return the fourth response byte
    pub fn read_byte(&mut self, opcode: u8, arg2: u8, arg3: u8, arg4: u8) -> Result<u8> {
        self.command(IspCommand::new(opcode, arg2, arg3, arg4))
    }

    /// Issue one 4-byte instruction and return the fourth response byte
    pub fn command(&mut self, cmd: IspCommand) -> Result<u8> {
        if !self.state.in_programming_mode {
            return Err(ProtocolError::NotInProgrammingMode.into());
        }
        let response = self.exchange(cmd)?;
        Ok(response[3])
    }

    /// Read the oscillator calibration byte
    pub fn read_calibration(&mut self) -> Result<u8> {
        self.command(IspCommand::read_calibration())
    }

    /// Release the target and give the transport back
    pub fn finish(mut self) -> T {
        if let Err(e) = self.transport.release() {
            log::warn!("isp: Failed to release target: {}", e);
        }
        self.transport
    }

    fn exchange(&mut self, cmd: IspCommand) -> Result<[u8; 4]> {
        let mut response = [0u8; 4];
        for (slot, byte) in response.iter_mut().zip(cmd.bytes()) {
            *slot = self.transport.transfer(byte)?;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::MockTarget;

    #[test]
    fn test_enter_programming_mode_first_try() {
        let mut session = IspSession::new(MockTarget::new(), SessionConfig::default());
        assert_eq!(session.enter_programming_mode(), Ok(1));
        assert!(session.is_in_programming_mode());
        assert_eq!(session.transport_mut().frames.len(), 1);
    }

    #[test]
    fn test_enter_programming_mode_retries() {
        let target = MockTarget::new().with_sync_failures(3);
        let mut session = IspSession::new(target, SessionConfig::default());
        assert_eq!(session.enter_programming_mode(), Ok(4));
        assert_eq!(session.transport_mut().reset_pulses, 4);
        // 100 ms before each attempt plus 25 ms settle time
        assert_eq!(session.transport_mut().delayed_us, 4 * (100_000 + 25_000 + 10));
    }

    #[test]
    fn test_entry_timeout_after_50_attempts() {
        let target = MockTarget::new().with_sync_failures(u32::MAX);
        let mut session = IspSession::new(target, SessionConfig::default());
        assert_eq!(
            session.enter_programming_mode(),
            Err(Error::Protocol(ProtocolError::EntryTimeout { attempts: 50 }))
        );
        assert_eq!(session.transport_mut().reset_pulses, 50);
        assert!(session.state().entry_failed);

        // The session stays unusable
        assert_eq!(
            session.read_byte(opcodes::READ_SIGNATURE, 0, 0, 0),
            Err(Error::Protocol(ProtocolError::NotInProgrammingMode))
        );
        let frames_before = session.transport_mut().frames.len();
        assert!(session.enter_programming_mode().is_err());
        assert_eq!(session.transport_mut().frames.len(), frames_before);
    }

    #[test]
    fn test_read_byte_requires_programming_mode() {
        let mut session = IspSession::new(MockTarget::new(), SessionConfig::default());
        assert_eq!(
            session.read_calibration(),
            Err(Error::Protocol(ProtocolError::NotInProgrammingMode))
        );
        assert!(session.transport_mut().frames.is_empty());
    }

    #[test]
    fn test_read_byte_is_four_transfers() {
        let target = MockTarget::new().with_calibration(0x9A);
        let mut session = IspSession::new(target, SessionConfig::default());
        session.enter_programming_mode().unwrap();
        let transfers_before = session.transport_mut().transfers;
        assert_eq!(session.read_calibration(), Ok(0x9A));
        assert_eq!(session.transport_mut().transfers - transfers_before, 4);
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::default()
            .with_max_attempts(0)
            .with_retry_delay_ms(5);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.retry_delay_ms, 5);
        assert_eq!(config.reset_settle_ms, DEFAULT_RESET_SETTLE_MS);
    }
}
