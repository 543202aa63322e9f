//! avrdetect-dummy - Emulated AVR target for testing
//!
//! This crate provides an ISP transport that answers like an AVR held in
//! reset, with its signature, fuses and flash kept in memory. It's useful
//! for testing and development without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
mod options;

#[cfg(feature = "std")]
pub use options::{open_dummy, parse_options, DummyError, DummyOptions};

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use avrdetect_core::device::{find_by_name, DeviceDescriptor, Signature};
use avrdetect_core::error::Result;
use avrdetect_core::isp::opcodes;
use avrdetect_core::programmer::IspTransport;

/// Part emulated when nothing else is asked for
pub const DEFAULT_DEVICE: &str = "ATmega328P";

/// Configuration for the emulated target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// Signature bytes
    pub signature: Signature,
    /// Flash size in bytes
    pub flash_size: u32,
    /// Low fuse
    pub low_fuse: u8,
    /// High fuse
    pub high_fuse: u8,
    /// Extended fuse
    pub ext_fuse: u8,
    /// Lock byte
    pub lock: u8,
    /// Oscillator calibration byte
    pub calibration: u8,
    /// Number of programming enable attempts to ignore before syncing
    pub sync_failures: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            signature: Signature::new(0x1E, 0x95, 0x0F), // ATmega328P
            flash_size: 32 * 1024,
            low_fuse: 0xFF,
            high_fuse: 0xDE,
            ext_fuse: 0xFD,
            lock: 0xCF,
            calibration: 0x80,
            sync_failures: 0,
        }
    }
}

impl DummyConfig {
    /// Emulate a part from the signature table with default fuses
    pub fn for_device(device: &DeviceDescriptor) -> Self {
        Self {
            signature: device.signature,
            flash_size: device.flash_size,
            ..Default::default()
        }
    }

    /// Emulate a part by name
    pub fn for_device_name(name: &str) -> Option<Self> {
        find_by_name(name).map(Self::for_device)
    }

    /// Set the fuse bytes
    pub fn with_fuses(mut self, low: u8, high: u8, ext: u8) -> Self {
        self.low_fuse = low;
        self.high_fuse = high;
        self.ext_fuse = ext;
        self
    }

    /// Set the lock byte
    pub fn with_lock(mut self, lock: u8) -> Self {
        self.lock = lock;
        self
    }

    /// Ignore the first `attempts` programming enable commands
    pub fn with_sync_failures(mut self, attempts: u32) -> Self {
        self.sync_failures = attempts;
        self
    }
}

/// Emulated AVR target
#[cfg(feature = "alloc")]
pub struct DummyTarget {
    config: DummyConfig,
    flash: Vec<u8>,
    reset_low: bool,
    in_programming_mode: bool,
    sync_failures: u32,
    frame: [u8; 4],
    pos: usize,
    extended_address: u8,
    enable_attempts: u32,
    extended_loads: u32,
    transfers: u64,
    elapsed_us: u64,
}

#[cfg(feature = "alloc")]
impl DummyTarget {
    /// Create a new target with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![opcodes::ERASED_BYTE; config.flash_size as usize];
        let sync_failures = config.sync_failures;
        Self {
            config,
            flash,
            reset_low: false,
            in_programming_mode: false,
            sync_failures,
            frame: [0; 4],
            pos: 0,
            extended_address: 0,
            enable_attempts: 0,
            extended_loads: 0,
            transfers: 0,
            elapsed_us: 0,
        }
    }

    /// Create a new target with default configuration (ATmega328P)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Copy `data` into flash at `addr`, clipped to the flash size
    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let start = (addr as usize).min(self.flash.len());
        let len = data.len().min(self.flash.len() - start);
        self.flash[start..start + len].copy_from_slice(&data[..len]);
    }

    /// Copy `data` so that it ends at the top of flash
    pub fn load_top(&mut self, data: &[u8]) {
        let addr = self.config.flash_size.saturating_sub(data.len() as u32);
        self.load(addr, data);
    }

    /// Get a reference to the flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Get a mutable reference to the flash contents
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Programming enable commands received
    pub fn enable_attempts(&self) -> u32 {
        self.enable_attempts
    }

    /// Load Extended Address commands received
    pub fn extended_loads(&self) -> u32 {
        self.extended_loads
    }

    /// Bytes exchanged
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// Total time the host asked to wait, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Whether the emulated target is in programming mode
    pub fn is_in_programming_mode(&self) -> bool {
        self.in_programming_mode
    }

    fn read_flash(&self, word: u32, high: bool) -> u8 {
        let addr = ((u32::from(self.extended_address) << 16) | word) * 2 + u32::from(high);
        self.flash
            .get(addr as usize)
            .copied()
            .unwrap_or(opcodes::ERASED_BYTE)
    }

    /// Output byte for the fourth position of the current frame
    fn data_byte(&mut self) -> u8 {
        let [op, a2, a3, _] = self.frame;
        let word = (u32::from(a2) << 8) | u32::from(a3);
        match (op, a2) {
            (opcodes::READ_SIGNATURE, _) => {
                let index = usize::from(a3 & 0x03);
                self.config.signature.bytes().get(index).copied().unwrap_or(0)
            }
            (opcodes::READ_LOW_FUSE, opcodes::FUSE_SELECT_UPPER) => self.config.ext_fuse,
            (opcodes::READ_LOW_FUSE, _) => self.config.low_fuse,
            (opcodes::READ_HIGH_FUSE, opcodes::FUSE_SELECT_UPPER) => self.config.high_fuse,
            (opcodes::READ_LOCK, _) => self.config.lock,
            (opcodes::READ_CALIBRATION, _) => self.config.calibration,
            (opcodes::READ_PROGRAM_MEMORY, _) => self.read_flash(word, false),
            (op, _) if op == opcodes::READ_PROGRAM_MEMORY | opcodes::PROGRAM_MEMORY_HIGH => {
                self.read_flash(word, true)
            }
            (opcodes::LOAD_EXTENDED_ADDRESS, _) => {
                self.extended_address = a3;
                self.extended_loads += 1;
                log::trace!("dummy: Extended address {:02X}", a3);
                0
            }
            _ => 0,
        }
    }

    fn end_of_frame(&mut self) {
        if self.frame[0] != opcodes::PROGRAM_ENABLE {
            return;
        }
        self.enable_attempts += 1;
        if self.sync_failures > 0 {
            self.sync_failures -= 1;
            log::trace!("dummy: Ignoring programming enable");
        } else if !self.in_programming_mode {
            log::debug!("dummy: Entered programming mode");
            self.in_programming_mode = true;
        }
    }
}

#[cfg(feature = "alloc")]
impl IspTransport for DummyTarget {
    fn transfer(&mut self, byte: u8) -> Result<u8> {
        self.transfers += 1;

        // Not listening while RESET is high
        if !self.reset_low {
            return Ok(0xFF);
        }

        self.frame[self.pos] = byte;
        let out = match self.pos {
            0 => 0x00,
            1 => self.frame[0],
            2 if self.frame[0] == opcodes::PROGRAM_ENABLE && self.sync_failures > 0 => 0x00,
            2 => self.frame[1],
            _ if self.in_programming_mode => self.data_byte(),
            _ => 0x00,
        };

        self.pos += 1;
        if self.pos == self.frame.len() {
            self.pos = 0;
            self.end_of_frame();
        }
        Ok(out)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.reset_low = !high;
        if high {
            self.in_programming_mode = false;
            self.pos = 0;
        }
        Ok(())
    }

    fn set_sck(&mut self, _high: bool) -> Result<()> {
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
    }
}
