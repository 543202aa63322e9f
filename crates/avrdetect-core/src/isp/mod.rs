//! ISP command framing
//!
//! Every ISP instruction is a 4-byte frame. The target clocks a response
//! byte out for each byte clocked in; the meaningful data is in the fourth
//! response byte, except for programming enable where the third response
//! byte echoes the second command byte.

mod command;
pub mod opcodes;

pub use command::IspCommand;
