//! CLI command implementations
//!
//! `detect` drives the identification pipeline against an open programmer and
//! prints each finding as it arrives. The list commands only read the
//! compiled-in tables.

mod detect;
mod list;

pub use detect::run_detect;
pub use list::{list_devices, list_programmers};
