//! avrdetect-core - Core library for AVR chip detection over ISP
//!
//! This crate implements the 4-byte In-System Programming protocol used by
//! AVR microcontrollers and the identification pipeline built on top of it:
//! entering programming mode, reading the signature and fuses, locating the
//! bootloader region and fingerprinting it with an MD5 digest.
//!
//! It is `no_std` compatible. The detection pipeline needs `alloc`, and the
//! RON-backed bootloader database needs `std`.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for the detection pipeline
//!
//! # Example
//!
//! ```ignore
//! use avrdetect_core::detect::{run_detection, DetectConfig, DetectionEvent};
//!
//! fn probe<T: avrdetect_core::programmer::IspTransport>(transport: T) {
//!     let mut events: Vec<DetectionEvent> = Vec::new();
//!     match run_detection(transport, &DetectConfig::default(), &[], &mut events) {
//!         Ok(summary) => println!("{:?}", summary.device.map(|d| d.name)),
//!         Err(e) => println!("Detection failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bootloader;
#[cfg(feature = "alloc")]
pub mod detect;
pub mod device;
pub mod error;
pub mod flash;
pub mod fuse;
pub mod isp;
pub mod programmer;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{Error, IdentificationError, ProtocolError, Result};
pub use session::{IspSession, SessionConfig, SessionState};
