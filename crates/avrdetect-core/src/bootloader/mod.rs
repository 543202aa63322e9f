//! Bootloader location and fingerprinting
//!
//! The boot section sits at the top of flash. Its size comes from the
//! device's base size and the BOOTSZ1:0 fuse bits; its contents are
//! streamed through MD5 and matched against a table of known images.

mod digest;
mod locate;

#[cfg(feature = "alloc")]
mod record;

#[cfg(feature = "std")]
mod database;

pub use digest::*;
pub use locate::*;

#[cfg(feature = "alloc")]
pub use record::*;

#[cfg(feature = "std")]
pub use database::*;
