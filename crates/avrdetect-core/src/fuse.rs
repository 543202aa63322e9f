//! Fuse and lock byte interpretation
//!
//! Fuse bits are active low: a bit reads 0 when the fuse is programmed.

use core::fmt;

use bitflags::bitflags;

use crate::device::BootFuse;
use crate::error::Result;
use crate::isp::IspCommand;
use crate::programmer::IspTransport;
use crate::session::IspSession;

/// BOOTRST: reset vector points at the boot section when programmed
pub const BOOTRST: u8 = 1 << 0;
/// BOOTSZ1:0 field position within the boot fuse
pub const BOOTSZ_SHIFT: u8 = 1;
/// BOOTSZ1:0 field mask (after shifting)
pub const BOOTSZ_MASK: u8 = 0x03;
/// EESAVE: EEPROM is kept through chip erase when programmed (high fuse)
pub const EESAVE: u8 = 1 << 3;
/// WDTON: watchdog is forced on when programmed (high fuse)
pub const WDTON: u8 = 1 << 4;

bitflags! {
    /// Programmed lock bits
    ///
    /// Built from the inverted lock byte, so a set flag means the lock bit
    /// is programmed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LockBits: u8 {
        /// LB1
        const LB1   = 1 << 0;
        /// LB2
        const LB2   = 1 << 1;
        /// BLB01: application section SPM lock
        const BLB01 = 1 << 2;
        /// BLB02: application section LPM lock
        const BLB02 = 1 << 3;
        /// BLB11: boot section SPM lock
        const BLB11 = 1 << 4;
        /// BLB12: boot section LPM lock
        const BLB12 = 1 << 5;
    }
}

/// Memory lock mode selected by LB2:LB1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// No memory lock features enabled
    Unlocked,
    /// Further programming of flash and EEPROM is disabled
    WriteProtected,
    /// Programming and verification (reading) are disabled
    ReadWriteProtected,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked => write!(f, "no memory lock"),
            Self::WriteProtected => write!(f, "further programming disabled"),
            Self::ReadWriteProtected => write!(f, "programming and verification disabled"),
        }
    }
}

impl LockBits {
    /// Decode a raw lock byte
    pub fn from_lock_byte(lock: u8) -> Self {
        Self::from_bits_truncate(!lock)
    }

    /// Memory lock mode
    pub fn mode(&self) -> LockMode {
        if self.contains(Self::LB2) {
            LockMode::ReadWriteProtected
        } else if self.contains(Self::LB1) {
            LockMode::WriteProtected
        } else {
            LockMode::Unlocked
        }
    }
}

/// All configuration bytes read from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuseSnapshot {
    /// Low fuse
    pub low: u8,
    /// High fuse
    pub high: u8,
    /// Extended fuse
    pub ext: u8,
    /// Lock byte
    pub lock: u8,
    /// Oscillator calibration byte
    pub calibration: u8,
}

impl FuseSnapshot {
    /// The byte holding BOOTRST/BOOTSZ for a part, if it has one
    pub fn select(&self, fuse: BootFuse) -> Option<u8> {
        match fuse {
            BootFuse::Low => Some(self.low),
            BootFuse::High => Some(self.high),
            BootFuse::Ext => Some(self.ext),
            BootFuse::None => None,
        }
    }

    /// Whether the reset vector jumps to the bootloader
    ///
    /// `None` when the part has no bootloader fuse.
    pub fn bootloader_enabled(&self, fuse: BootFuse) -> Option<bool> {
        self.select(fuse).map(|b| b & BOOTRST == 0)
    }

    /// BOOTSZ1:0 of the selected fuse byte
    pub fn boot_size_bits(&self, fuse: BootFuse) -> Option<u8> {
        self.select(fuse).map(|b| (b >> BOOTSZ_SHIFT) & BOOTSZ_MASK)
    }

    /// EEPROM survives a chip erase
    pub fn eeprom_preserved(&self) -> bool {
        self.high & EESAVE == 0
    }

    /// Watchdog timer is always on
    pub fn watchdog_always_on(&self) -> bool {
        self.high & WDTON == 0
    }

    /// Decoded lock bits
    pub fn lock_bits(&self) -> LockBits {
        LockBits::from_lock_byte(self.lock)
    }
}

/// Read the low, high and extended fuses, lock byte and calibration byte
pub fn read_fuses<T: IspTransport>(session: &mut IspSession<T>) -> Result<FuseSnapshot> {
    let snapshot = FuseSnapshot {
        low: session.command(IspCommand::read_low_fuse())?,
        high: session.command(IspCommand::read_high_fuse())?,
        ext: session.command(IspCommand::read_ext_fuse())?,
        lock: session.command(IspCommand::read_lock())?,
        calibration: session.read_calibration()?,
    };
    log::debug!(
        "isp: Fuses L={:02X} H={:02X} E={:02X} lock={:02X} cal={:02X}",
        snapshot.low,
        snapshot.high,
        snapshot.ext,
        snapshot.lock,
        snapshot.calibration
    );
    Ok(snapshot)
}
