//! AVR device types and signature table
//!
//! This module provides the static description of each known part and the
//! lookup from the 3 signature bytes read over ISP.

mod database;
mod types;

pub use database::DEVICES;
pub use types::*;

use crate::error::Result;
use crate::isp::IspCommand;
use crate::programmer::IspTransport;
use crate::session::IspSession;

/// Read the three signature bytes
pub fn read_signature<T: IspTransport>(session: &mut IspSession<T>) -> Result<Signature> {
    let mut sig = [0u8; 3];
    for (index, byte) in sig.iter_mut().enumerate() {
        *byte = session.command(IspCommand::read_signature(index as u8))?;
    }
    log::debug!("isp: Signature {:02X} {:02X} {:02X}", sig[0], sig[1], sig[2]);
    Ok(Signature(sig))
}

/// Find a device in the compiled-in table by signature
pub fn identify(sig: Signature) -> Option<&'static DeviceDescriptor> {
    find_in(DEVICES, sig)
}

/// Find a device in an arbitrary table; the first exact match wins
pub fn find_in(table: &[DeviceDescriptor], sig: Signature) -> Option<&DeviceDescriptor> {
    table.iter().find(|d| d.matches_signature(sig))
}

/// Find a device by name (case-insensitive exact match)
pub fn find_by_name(name: &str) -> Option<&'static DeviceDescriptor> {
    DEVICES.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}
