//! ISP instruction opcodes
//!
//! First-byte values of the serial programming instruction set shared by
//! the classic AVR families, plus the second-byte selectors that pick a
//! specific fuse or byte half.

// ============================================================================
// Programming mode
// ============================================================================

/// Programming enable (first byte)
pub const PROGRAM_ENABLE: u8 = 0xAC;
/// Programming enable (second byte), echoed back as the acknowledge
pub const PROGRAM_ACKNOWLEDGE: u8 = 0x53;

// ============================================================================
// Identification and configuration reads
// ============================================================================

/// Read signature byte (third byte selects index 0..2)
pub const READ_SIGNATURE: u8 = 0x30;
/// Read calibration byte
pub const READ_CALIBRATION: u8 = 0x38;
/// Read low fuse (second byte 0x00) or extended fuse (second byte 0x08)
pub const READ_LOW_FUSE: u8 = 0x50;
/// Read high fuse (second byte 0x08) or lock bits (second byte 0x00)
pub const READ_HIGH_FUSE: u8 = 0x58;
/// Read extended fuse shares its first byte with the low fuse read
pub const READ_EXT_FUSE: u8 = 0x50;
/// Read lock bits shares its first byte with the high fuse read
pub const READ_LOCK: u8 = 0x58;

/// Second-byte selector for the high and extended fuse reads
pub const FUSE_SELECT_UPPER: u8 = 0x08;

// ============================================================================
// Program memory
// ============================================================================

/// Read program memory, low byte of the addressed word
pub const READ_PROGRAM_MEMORY: u8 = 0x20;
/// OR into `READ_PROGRAM_MEMORY` to read the high byte of the word
pub const PROGRAM_MEMORY_HIGH: u8 = 0x08;
/// Load extended address byte (bits 16..23 of the word address)
pub const LOAD_EXTENDED_ADDRESS: u8 = 0x4D;

/// Value of an erased flash byte
pub const ERASED_BYTE: u8 = 0xFF;
