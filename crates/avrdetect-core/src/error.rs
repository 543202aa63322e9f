//! Error types for avrdetect-core
//!
//! This module provides no_std compatible error types that are used
//! throughout the crate. Protocol errors are fatal for the rest of a
//! detection run; identification errors are not.

use core::fmt;

use crate::bootloader::Digest;
use crate::device::Signature;

/// Failures of the ISP session itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The target never acknowledged the programming enable command
    EntryTimeout {
        /// Number of attempts made before giving up
        attempts: u32,
    },
    /// A read was issued while the session is not in programming mode
    NotInProgrammingMode,
    /// The byte transport reported a failure
    TransferFailed,
}

/// Failures to match what was read against the lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationError {
    /// The signature is not in the signature table
    UnknownSignature(Signature),
    /// The bootloader digest is not in the bootloader database
    UnknownBootloader(Digest),
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// ISP protocol error
    Protocol(ProtocolError),
    /// Identification error
    Identification(IdentificationError),
    /// Address is beyond the flash size of the target
    AddressOutOfBounds,
    /// General programmer error (pin control, setup)
    ProgrammerError,
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<IdentificationError> for Error {
    fn from(e: IdentificationError) -> Self {
        Error::Identification(e)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryTimeout { attempts } => write!(
                f,
                "failed to enter programming mode after {} attempts",
                attempts
            ),
            Self::NotInProgrammingMode => write!(f, "target is not in programming mode"),
            Self::TransferFailed => write!(f, "ISP transfer failed"),
        }
    }
}

impl fmt::Display for IdentificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSignature(sig) => write!(f, "unrecognized signature {}", sig),
            Self::UnknownBootloader(digest) => write!(f, "unknown bootloader (MD5 {})", digest),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "{}", e),
            Self::Identification(e) => write!(f, "{}", e),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::ProgrammerError => write!(f, "programmer error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for IdentificationError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
