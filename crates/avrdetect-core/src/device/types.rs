//! Device type definitions

use core::fmt;

/// 3-byte device signature
///
/// The first byte is the Atmel vendor code `0x1E`, the second encodes the
/// flash size and the third the part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 3]);

impl Signature {
    /// Create a signature from its three bytes
    pub const fn new(b0: u8, b1: u8, b2: u8) -> Self {
        Self([b0, b1, b2])
    }

    /// Get the raw bytes
    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// All-0x00 or all-0xFF usually means nothing is answering on the bus
    pub fn is_blank(&self) -> bool {
        self.0 == [0x00; 3] || self.0 == [0xFF; 3]
    }
}

impl From<[u8; 3]> for Signature {
    fn from(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X} {:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Which fuse byte holds BOOTRST and BOOTSZ1:0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootFuse {
    /// Low fuse
    Low,
    /// High fuse
    High,
    /// Extended fuse
    Ext,
    /// Part has no bootloader fuse
    #[default]
    None,
}

impl fmt::Display for BootFuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
            Self::Ext => write!(f, "extended"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Static description of one AVR part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Signature bytes
    pub signature: Signature,
    /// Part name (e.g., "ATmega328P")
    pub name: &'static str,
    /// Total flash size in bytes
    pub flash_size: u32,
    /// Smallest bootloader section in bytes (BOOTSZ = 11), 0 if unsupported
    pub boot_base_size: u32,
    /// Flash page size in bytes
    pub page_size: u16,
    /// Fuse byte holding the bootloader configuration
    pub boot_fuse: BootFuse,
    /// Part needs fixed write delays instead of busy polling
    pub timed_writes: bool,
}

impl DeviceDescriptor {
    /// Check if this device matches the given signature
    pub fn matches_signature(&self, sig: Signature) -> bool {
        self.signature == sig
    }

    /// Whether the part supports a hardware bootloader section at all
    pub fn has_boot_section(&self) -> bool {
        self.boot_base_size != 0 && self.boot_fuse != BootFuse::None
    }
}

/// Shorthand for the static table
pub(crate) const fn dev(
    sig: [u8; 3],
    name: &'static str,
    flash_kib: u32,
    boot_base_size: u32,
    page_size: u16,
    boot_fuse: BootFuse,
    timed_writes: bool,
) -> DeviceDescriptor {
    DeviceDescriptor {
        signature: Signature(sig),
        name,
        flash_size: flash_kib * 1024,
        boot_base_size,
        page_size,
        boot_fuse,
        timed_writes,
    }
}
