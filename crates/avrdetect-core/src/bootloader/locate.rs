//! Boot section geometry

use crate::device::DeviceDescriptor;
use crate::fuse::{FuseSnapshot, BOOTSZ_MASK, BOOTSZ_SHIFT};

/// Address range of the boot section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootloaderRegion {
    /// First byte address of the section
    pub start: u32,
    /// Section length in bytes
    pub length: u32,
}

impl BootloaderRegion {
    /// One past the last byte address
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Check if a byte address falls inside the section
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end()
    }
}

/// Boot section size multiplier for a fuse byte
///
/// BOOTSZ1:0 = 00 selects the largest section (8x the base size),
/// 11 the smallest (1x).
pub const fn size_multiplier(fuse: u8) -> u32 {
    8 >> ((fuse >> BOOTSZ_SHIFT) & BOOTSZ_MASK)
}

/// Compute the boot section of a device from its fuses
///
/// Returns `None` for parts without a boot section.
pub fn locate(device: &DeviceDescriptor, fuses: &FuseSnapshot) -> Option<BootloaderRegion> {
    if device.boot_base_size == 0 {
        return None;
    }
    let fuse = fuses.select(device.boot_fuse)?;
    let length = device.boot_base_size * size_multiplier(fuse);
    let start = device.flash_size.checked_sub(length)?;
    log::debug!(
        "bootloader: {} boot section 0x{:05X}..0x{:05X} ({} bytes)",
        device.name,
        start,
        device.flash_size,
        length
    );
    Some(BootloaderRegion { start, length })
}
