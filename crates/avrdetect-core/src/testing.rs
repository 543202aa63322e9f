//! Recording mock target for unit tests

use std::vec;
use std::vec::Vec;

use crate::error::Result;
use crate::programmer::IspTransport;

/// Minimal AVR ISP slave that records every frame it receives
pub(crate) struct MockTarget {
    pub signature: [u8; 3],
    pub low: u8,
    pub high: u8,
    pub ext: u8,
    pub lock: u8,
    pub calibration: u8,
    pub flash: Vec<u8>,
    pub frames: Vec<[u8; 4]>,
    pub extended_loads: Vec<u8>,
    pub transfers: u32,
    pub reset_pulses: u32,
    pub delayed_us: u64,
    sync_failures: u32,
    pending: [u8; 4],
    pos: usize,
    in_programming_mode: bool,
    extended: u8,
}

impl MockTarget {
    pub fn new() -> Self {
        Self {
            signature: [0x1E, 0x95, 0x0F],
            low: 0xFF,
            high: 0xDE,
            ext: 0xFD,
            lock: 0xCF,
            calibration: 0x80,
            flash: vec![0xFF; 32 * 1024],
            frames: Vec::new(),
            extended_loads: Vec::new(),
            transfers: 0,
            reset_pulses: 0,
            delayed_us: 0,
            sync_failures: 0,
            pending: [0; 4],
            pos: 0,
            in_programming_mode: false,
            extended: 0,
        }
    }

    pub fn with_sync_failures(mut self, failures: u32) -> Self {
        self.sync_failures = failures;
        self
    }

    pub fn with_signature(mut self, signature: [u8; 3]) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_fuses(mut self, low: u8, high: u8, ext: u8) -> Self {
        self.low = low;
        self.high = high;
        self.ext = ext;
        self
    }

    pub fn with_calibration(mut self, calibration: u8) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_flash(mut self, flash: Vec<u8>) -> Self {
        self.flash = flash;
        self
    }

    fn respond(&mut self) -> u8 {
        if !self.in_programming_mode {
            return 0;
        }
        let frame = self.pending;
        match frame[0] {
            0x30 => self.signature.get(frame[2] as usize).copied().unwrap_or(0xFF),
            0x50 if frame[1] == 0x08 => self.ext,
            0x50 => self.low,
            0x58 if frame[1] == 0x08 => self.high,
            0x58 => self.lock,
            0x38 => self.calibration,
            0x20 | 0x28 => {
                let word = ((self.extended as usize) << 16)
                    | ((frame[1] as usize) << 8)
                    | frame[2] as usize;
                let addr = word * 2 + usize::from(frame[0] == 0x28);
                self.flash.get(addr).copied().unwrap_or(0xFF)
            }
            0x4D => {
                self.extended = frame[2];
                self.extended_loads.push(frame[2]);
                0
            }
            _ => 0,
        }
    }
}

impl IspTransport for MockTarget {
    fn transfer(&mut self, byte: u8) -> Result<u8> {
        self.transfers += 1;
        self.pending[self.pos] = byte;
        let out = match self.pos {
            0 => 0,
            1 => self.pending[0],
            2 if self.pending[0] == 0xAC && self.sync_failures > 0 => 0xFF,
            2 => self.pending[1],
            _ => self.respond(),
        };
        self.pos += 1;
        if self.pos == 4 {
            self.pos = 0;
            self.frames.push(self.pending);
            if self.pending[0] == 0xAC {
                if self.sync_failures > 0 {
                    self.sync_failures -= 1;
                } else {
                    self.in_programming_mode = true;
                }
            }
        }
        Ok(out)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        if high {
            self.reset_pulses += 1;
            self.in_programming_mode = false;
        }
        Ok(())
    }

    fn set_sck(&mut self, _high: bool) -> Result<()> {
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += u64::from(us);
    }
}
