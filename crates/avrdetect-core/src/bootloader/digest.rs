//! Streaming MD5 over flash ranges

use core::fmt;

use md5::{Digest as _, Md5};

use super::BootloaderRegion;
use crate::error::Result;
use crate::flash::read_flash_byte;
use crate::isp::opcodes::ERASED_BYTE;
use crate::programmer::IspTransport;
use crate::session::IspSession;

/// 128-bit image fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub [u8; 16]);

impl Digest {
    /// Get the raw bytes
    pub const fn bytes(&self) -> [u8; 16] {
        self.0
    }

    /// Parse a 32 digit hex string (either case)
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.as_bytes();
        if s.len() != 32 {
            return None;
        }
        let mut out = [0u8; 16];
        for (byte, pair) in out.iter_mut().zip(s.chunks_exact(2)) {
            *byte = (hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?;
        }
        Some(Self(out))
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Fingerprint of a flash range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestResult {
    /// MD5 of every byte in the range
    pub digest: Digest,
    /// Every byte read back as 0xFF
    pub all_erased: bool,
}

/// Incremental digest that also tracks whether the input is blank
#[derive(Clone)]
pub struct DigestEngine {
    hasher: Md5,
    all_erased: bool,
    len: u32,
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestEngine {
    /// Start a new digest
    pub fn new() -> Self {
        Self {
            hasher: Md5::new(),
            all_erased: true,
            len: 0,
        }
    }

    /// Feed bytes in address order
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.all_erased &= data.iter().all(|&b| b == ERASED_BYTE);
        self.len += data.len() as u32;
    }

    /// Number of bytes fed so far
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Check if nothing has been fed yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finish and return the result
    pub fn finish(self) -> DigestResult {
        DigestResult {
            digest: Digest(self.hasher.finalize().into()),
            all_erased: self.all_erased,
        }
    }
}

/// Digest a byte slice
pub fn digest_bytes(data: &[u8]) -> DigestResult {
    let mut engine = DigestEngine::new();
    engine.update(data);
    engine.finish()
}

/// Stream the boot section through the digest engine
pub fn digest_region<T: IspTransport>(
    session: &mut IspSession<T>,
    region: &BootloaderRegion,
) -> Result<DigestResult> {
    digest_range_with(session, region.start, region.length, |_, _| {})
}

/// Stream `[start, start + length)` through the digest engine
///
/// Every byte is read in ascending order, even after a non-blank byte has
/// been seen. `observe` is called with each address and byte as it is read.
pub fn digest_range_with<T, F>(
    session: &mut IspSession<T>,
    start: u32,
    length: u32,
    mut observe: F,
) -> Result<DigestResult>
where
    T: IspTransport,
    F: FnMut(u32, u8),
{
    let mut engine = DigestEngine::new();
    for addr in start..start + length {
        let byte = read_flash_byte(session, addr)?;
        engine.update(&[byte]);
        observe(addr, byte);
    }
    let result = engine.finish();
    log::debug!(
        "bootloader: MD5 of 0x{:05X}+{} = {}{}",
        start,
        length,
        result.digest,
        if result.all_erased { " (erased)" } else { "" }
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::testing::MockTarget;
    use std::vec;
    use std::vec::Vec;

    fn md5_of(data: &[u8]) -> Digest {
        Digest(Md5::digest(data).into())
    }

    #[test]
    fn test_empty_input() {
        let result = DigestEngine::new().finish();
        assert_eq!(
            result.digest,
            Digest::from_hex("d41d8cd98f00b204e9800998ecf8427e").unwrap()
        );
        assert!(result.all_erased);
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = md5_of(b"optiboot");
        let hex = std::format!("{}", digest);
        assert_eq!(hex.len(), 32);
        assert_eq!(Digest::from_hex(&hex), Some(digest));
        assert_eq!(Digest::from_hex(&hex.to_uppercase()), Some(digest));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(Digest::from_hex(""), None);
        assert_eq!(Digest::from_hex("d41d8cd98f00b204e9800998ecf8427"), None);
        assert_eq!(Digest::from_hex("d41d8cd98f00b204e9800998ecf8427eff"), None);
        assert_eq!(Digest::from_hex("g41d8cd98f00b204e9800998ecf8427e"), None);
    }

    #[test]
    fn test_erased_tracking_does_not_stop_early() {
        let mut data = vec![0xFF; 64];
        data[3] = 0x00;
        let mut engine = DigestEngine::new();
        for chunk in data.chunks(7) {
            engine.update(chunk);
        }
        assert_eq!(engine.len(), 64);
        let result = engine.finish();
        assert!(!result.all_erased);
        assert_eq!(result.digest, md5_of(&data));
    }

    #[test]
    fn test_digest_erased_region() {
        let target = MockTarget::new().with_flash(vec![0xFF; 32 * 1024]);
        let mut session = IspSession::new(target, SessionConfig::default());
        session.enter_programming_mode().unwrap();

        let region = BootloaderRegion { start: 0x7E00, length: 512 };
        let result = digest_region(&mut session, &region).unwrap();
        assert!(result.all_erased);
        assert_eq!(result.digest, md5_of(&[0xFF; 512]));
    }

    #[test]
    fn test_digest_range_reads_every_byte_in_order() {
        let flash: Vec<u8> = (0..1024u32).map(|i| i as u8).collect();
        let target = MockTarget::new().with_flash(flash.clone());
        let mut session = IspSession::new(target, SessionConfig::default());
        session.enter_programming_mode().unwrap();

        let mut seen = Vec::new();
        let result =
            digest_range_with(&mut session, 0x300, 0x100, |addr, byte| seen.push((addr, byte)))
                .unwrap();
        assert_eq!(seen.len(), 0x100);
        assert!(seen.windows(2).all(|w| w[1].0 == w[0].0 + 1));
        assert_eq!(seen[0], (0x300, 0x00));
        assert_eq!(result.digest, md5_of(&flash[0x300..0x400]));
        assert!(!result.all_erased);
    }
}
