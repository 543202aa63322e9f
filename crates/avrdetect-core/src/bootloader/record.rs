//! Known bootloader images

use alloc::string::String;

use super::Digest;

/// One known bootloader image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootloaderRecord {
    /// MD5 of the whole boot section
    pub digest: Digest,
    /// Human-readable name
    pub name: String,
}

impl BootloaderRecord {
    /// Create a new record
    pub fn new(digest: Digest, name: impl Into<String>) -> Self {
        Self {
            digest,
            name: name.into(),
        }
    }
}

/// Find a bootloader by digest; the first exact match wins
pub fn find_in(records: &[BootloaderRecord], digest: Digest) -> Option<&BootloaderRecord> {
    records.iter().find(|r| r.digest == digest)
}
