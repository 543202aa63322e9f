//! ISP command structure

use super::opcodes;

/// A single 4-byte ISP instruction
///
/// Plain value type; the session controller clocks `bytes()` out one at a
/// time and keeps the last response byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IspCommand {
    /// Instruction byte
    pub opcode: u8,
    /// Second byte (selector or address high byte)
    pub arg2: u8,
    /// Third byte (index or address low byte)
    pub arg3: u8,
    /// Fourth byte (data in, ignored for reads)
    pub arg4: u8,
}

impl IspCommand {
    /// Create a command from all four bytes
    pub const fn new(opcode: u8, arg2: u8, arg3: u8, arg4: u8) -> Self {
        Self {
            opcode,
            arg2,
            arg3,
            arg4,
        }
    }

    /// Programming enable: `AC 53 00 00`
    pub const fn program_enable() -> Self {
        Self::new(opcodes::PROGRAM_ENABLE, opcodes::PROGRAM_ACKNOWLEDGE, 0, 0)
    }

    /// Read one of the three signature bytes
    pub const fn read_signature(index: u8) -> Self {
        Self::new(opcodes::READ_SIGNATURE, 0, index, 0)
    }

    /// Read the low fuse
    pub const fn read_low_fuse() -> Self {
        Self::new(opcodes::READ_LOW_FUSE, 0, 0, 0)
    }

    /// Read the high fuse
    pub const fn read_high_fuse() -> Self {
        Self::new(opcodes::READ_HIGH_FUSE, opcodes::FUSE_SELECT_UPPER, 0, 0)
    }

    /// Read the extended fuse
    pub const fn read_ext_fuse() -> Self {
        Self::new(opcodes::READ_EXT_FUSE, opcodes::FUSE_SELECT_UPPER, 0, 0)
    }

    /// Read the lock bits
    pub const fn read_lock() -> Self {
        Self::new(opcodes::READ_LOCK, 0, 0, 0)
    }

    /// Read the oscillator calibration byte
    pub const fn read_calibration() -> Self {
        Self::new(opcodes::READ_CALIBRATION, 0, 0, 0)
    }

    /// Load the extended (bits 16..23) word address byte
    pub const fn load_extended_address(ext: u8) -> Self {
        Self::new(opcodes::LOAD_EXTENDED_ADDRESS, 0, ext, 0)
    }

    /// Read one byte of program memory at a 16-bit word address
    ///
    /// `high` selects the high byte of the word (odd byte address).
    pub const fn read_program_memory(word: u16, high: bool) -> Self {
        let opcode = if high {
            opcodes::READ_PROGRAM_MEMORY | opcodes::PROGRAM_MEMORY_HIGH
        } else {
            opcodes::READ_PROGRAM_MEMORY
        };
        Self::new(opcode, (word >> 8) as u8, word as u8, 0)
    }

    /// The four bytes in transmission order
    pub const fn bytes(&self) -> [u8; 4] {
        [self.opcode, self.arg2, self.arg3, self.arg4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_enable_frame() {
        assert_eq!(IspCommand::program_enable().bytes(), [0xAC, 0x53, 0x00, 0x00]);
    }

    #[test]
    fn test_fuse_frames() {
        assert_eq!(IspCommand::read_low_fuse().bytes(), [0x50, 0x00, 0x00, 0x00]);
        assert_eq!(IspCommand::read_high_fuse().bytes(), [0x58, 0x08, 0x00, 0x00]);
        assert_eq!(IspCommand::read_ext_fuse().bytes(), [0x50, 0x08, 0x00, 0x00]);
        assert_eq!(IspCommand::read_lock().bytes(), [0x58, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_program_memory_frame() {
        assert_eq!(
            IspCommand::read_program_memory(0x3F00, false).bytes(),
            [0x20, 0x3F, 0x00, 0x00]
        );
        assert_eq!(
            IspCommand::read_program_memory(0x3F01, true).bytes(),
            [0x28, 0x3F, 0x01, 0x00]
        );
    }
}
