//! Flash addressing
//!
//! Program memory is word addressed over ISP: a byte address is split into
//! a 16-bit word address, a high/low byte selector and, for parts above
//! 128 KiB, an extended address byte that the target latches until the next
//! `Load Extended Address` instruction.
//!
//! The session caches which 64 KiB segment (bits 16+ of the byte address)
//! was last loaded and only reloads when a read leaves it. The value sent
//! on the wire is bits 16+ of the word address, so the reload at an odd
//! segment boundary repeats the previous byte but is never wrong.

use crate::error::{Error, Result};
use crate::isp::IspCommand;
use crate::programmer::IspTransport;
use crate::session::IspSession;

/// 64 KiB segment of a byte address, used as the extended address cache key
pub const fn segment_of(addr: u32) -> u8 {
    (addr >> 16) as u8
}

/// Extended address byte the target expects for a byte address
pub const fn extended_byte_of(addr: u32) -> u8 {
    (addr >> 17) as u8
}

/// Word address (low 16 bits) and high-byte selector for a byte address
pub const fn word_address_of(addr: u32) -> (u16, bool) {
    ((addr >> 1) as u16, addr & 1 != 0)
}

/// Read one byte of program memory
///
/// Issues a `Load Extended Address` first only when `addr` is in a different
/// 64 KiB segment than the previous read. Sequential scans should run in
/// ascending order; random access works but may reload on every read that
/// crosses a segment.
pub fn read_flash_byte<T: IspTransport>(session: &mut IspSession<T>, addr: u32) -> Result<u8> {
    let segment = segment_of(addr);
    if session.state().last_extended_address != Some(segment) {
        let ext = extended_byte_of(addr);
        session.command(IspCommand::load_extended_address(ext))?;
        log::trace!("isp: Loaded extended address {:02X} for 0x{:05X}", ext, addr);
        session.state_mut().last_extended_address = Some(segment);
    }

    let (word, high) = word_address_of(addr);
    session.command(IspCommand::read_program_memory(word, high))
}

/// Read a contiguous range of program memory into `buf`
///
/// Fails with [`Error::AddressOutOfBounds`] before any read if the range
/// does not fit in the 32-bit address space.
pub fn read_flash<T: IspTransport>(
    session: &mut IspSession<T>,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    u32::try_from(buf.len())
        .ok()
        .and_then(|len| addr.checked_add(len))
        .ok_or(Error::AddressOutOfBounds)?;
    for (offset, byte) in buf.iter_mut().enumerate() {
        *byte = read_flash_byte(session, addr + offset as u32)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::session::SessionConfig;
    use crate::testing::MockTarget;
    use std::vec::Vec;

    fn session_with_flash(flash: Vec<u8>) -> IspSession<MockTarget> {
        let mut session = IspSession::new(
            MockTarget::new().with_flash(flash),
            SessionConfig::default(),
        );
        session.enter_programming_mode().unwrap();
        session
    }

    #[test]
    fn test_address_split() {
        assert_eq!(word_address_of(0x7E00), (0x3F00, false));
        assert_eq!(word_address_of(0x7E01), (0x3F00, true));
        assert_eq!(word_address_of(0x3FFFF), (0xFFFF, true));
        assert_eq!(segment_of(0x1FFFF), 1);
        assert_eq!(extended_byte_of(0x1FFFF), 0);
        assert_eq!(extended_byte_of(0x20000), 1);
        assert_eq!(extended_byte_of(0x3E000), 1);
    }

    #[test]
    fn test_read_flash_byte_selects_word_half() {
        let flash: Vec<u8> = (0..=255u8).collect();
        let mut session = session_with_flash(flash);
        assert_eq!(read_flash_byte(&mut session, 0x10), Ok(0x10));
        assert_eq!(read_flash_byte(&mut session, 0x11), Ok(0x11));

        let frames = &session.transport_mut().frames;
        assert_eq!(frames[frames.len() - 2], [0x20, 0x00, 0x08, 0x00]);
        assert_eq!(frames[frames.len() - 1], [0x28, 0x00, 0x08, 0x00]);
    }

    #[test]
    fn test_sequential_reads_load_extended_address_once() {
        let mut session = session_with_flash(Vec::new());
        for addr in 0x0000..=0xFFFFu32 {
            read_flash_byte(&mut session, addr).unwrap();
        }
        assert_eq!(session.transport_mut().extended_loads, [0x00]);

        read_flash_byte(&mut session, 0x10000).unwrap();
        assert_eq!(session.transport_mut().extended_loads.len(), 2);
        assert_eq!(session.state().last_extended_address, Some(1));
    }

    #[test]
    fn test_random_reads_reload_across_segments() {
        let mut session = session_with_flash(Vec::new());
        read_flash_byte(&mut session, 0x3E000).unwrap();
        read_flash_byte(&mut session, 0x00100).unwrap();
        read_flash_byte(&mut session, 0x00101).unwrap();
        read_flash_byte(&mut session, 0x3E001).unwrap();
        assert_eq!(session.transport_mut().extended_loads, [0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_high_flash_reads_through_extended_address() {
        let mut flash = std::vec![0xFF; 256 * 1024];
        flash[0x3E000] = 0x0C;
        flash[0x3E001] = 0x94;
        let mut session = session_with_flash(flash);
        let mut buf = [0u8; 2];
        read_flash(&mut session, 0x3E000, &mut buf).unwrap();
        assert_eq!(buf, [0x0C, 0x94]);
    }

    #[test]
    fn test_read_flash_requires_programming_mode() {
        let mut session = IspSession::new(MockTarget::new(), SessionConfig::default());
        assert_eq!(
            read_flash_byte(&mut session, 0),
            Err(Error::Protocol(ProtocolError::NotInProgrammingMode))
        );
        assert_eq!(session.state().last_extended_address, None);
    }

    #[test]
    fn test_read_flash_rejects_wrapping_range() {
        let mut session = session_with_flash(Vec::new());
        let frames_before = session.transport_mut().frames.len();
        let mut buf = [0u8; 4];
        assert_eq!(
            read_flash(&mut session, u32::MAX - 1, &mut buf),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(session.transport_mut().frames.len(), frames_before);
    }
}
