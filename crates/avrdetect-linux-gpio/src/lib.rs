//! avrdetect-linux-gpio - Linux GPIO bitbang ISP support
//!
//! This crate drives the AVR ISP lines (RESET, SCK, MOSI, MISO) through the
//! Linux character device GPIO interface using the gpiocdev crate.
//!
//! # Example
//!
//! ```no_run
//! use avrdetect_linux_gpio::{LinuxGpioIsp, LinuxGpioIspConfig};
//! use avrdetect_core::{device, IspSession, SessionConfig};
//!
//! let config = LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 10, 9);
//! //                                    device          RST SCK MOSI MISO
//! let isp = LinuxGpioIsp::open(&config)?;
//!
//! let mut session = IspSession::new(isp, SessionConfig::default());
//! session.enter_programming_mode()?;
//! println!("Signature: {}", device::read_signature(&mut session)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the avrdetect CLI
//!
//! ```bash
//! avrdetect detect -p linux_gpio:gpiochip=0,reset=25,sck=11,mosi=10,miso=9
//!
//! # Slower clock for targets running below 1 MHz
//! avrdetect detect -p linux_gpio:dev=/dev/gpiochip0,reset=25,sck=11,mosi=10,miso=9,ispspeed=20
//! ```
//!
//! # Wiring
//!
//! | AVR Pin | GPIO Function  |
//! |---------|----------------|
//! | RESET   | RESET (output) |
//! | SCK     | SCK (output)   |
//! | MOSI    | MOSI (output)  |
//! | MISO    | MISO (input)   |
//! | GND     | GND            |
//!
//! The target must run at the same logic level as the GPIO header.

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxGpioIsp, LinuxGpioIspConfig};
pub use error::{LinuxGpioError, Result};

/// Open a Linux GPIO ISP programmer and return a boxed transport
///
/// This is a convenience function for use in the CLI programmer dispatch.
pub fn open_linux_gpio(
    options: &[(&str, &str)],
) -> std::result::Result<
    Box<dyn avrdetect_core::programmer::IspTransport + Send>,
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let isp = LinuxGpioIsp::open(&config)?;
    Ok(Box::new(isp))
}
