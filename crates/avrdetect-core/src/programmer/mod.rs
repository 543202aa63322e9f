//! Programmer traits and abstractions
//!
//! This module defines the transport trait that all programmers must
//! implement to talk to an AVR target over ISP.

pub mod bitbang;
mod traits;

pub use bitbang::BitbangIspPins;
pub use traits::*;
