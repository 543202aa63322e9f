//! Linux GPIO ISP bitbanging device implementation
//!
//! This module provides the `LinuxGpioIsp` struct that implements the
//! `IspTransport` trait using Linux's GPIO character device interface
//! (gpiocdev). RESET, SCK and MOSI are outputs, MISO is an input.

use std::cell::Cell;

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use avrdetect_core::error::{Error as CoreError, Result as CoreResult};
use avrdetect_core::programmer::bitbang::{self, BitbangIspPins};
use avrdetect_core::programmer::IspTransport;

/// GPIO line indices
#[derive(Debug, Clone, Copy)]
enum Line {
    Reset = 0,
    Sck = 1,
    Mosi = 2,
    Miso = 3,
}

const LINE_COUNT: usize = 4;

/// Default half-period delay in nanoseconds (~100 kHz ISP clock, safe for a
/// target running from its 1 MHz factory clock)
const DEFAULT_HALF_PERIOD_NS: u64 = 5000;

/// Configuration for opening a Linux GPIO ISP programmer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxGpioIspConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// RESET GPIO line offset
    pub reset: Offset,
    /// SCK GPIO line offset
    pub sck: Offset,
    /// MOSI GPIO line offset
    pub mosi: Offset,
    /// MISO GPIO line offset
    pub miso: Offset,
    /// Half-period delay in nanoseconds
    pub half_period_ns: u64,
}

impl Default for LinuxGpioIspConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            reset: 0,
            sck: 0,
            mosi: 0,
            miso: 0,
            half_period_ns: DEFAULT_HALF_PERIOD_NS,
        }
    }
}

impl LinuxGpioIspConfig {
    /// Create a new configuration with the given device path and pins
    pub fn new(
        device: impl Into<String>,
        reset: Offset,
        sck: Offset,
        mosi: Offset,
        miso: Offset,
    ) -> Self {
        Self {
            device: device.into(),
            reset,
            sck,
            mosi,
            miso,
            ..Default::default()
        }
    }

    /// Set the ISP clock in Hz (approximate, via half-period calculation)
    pub fn with_speed_hz(mut self, hz: u32) -> Self {
        if hz > 0 {
            self.half_period_ns = 500_000_000 / hz as u64;
        }
        self
    }

    fn offsets(&self) -> [Offset; LINE_COUNT] {
        let mut offsets = [0; LINE_COUNT];
        offsets[Line::Reset as usize] = self.reset;
        offsets[Line::Sck as usize] = self.sck;
        offsets[Line::Mosi as usize] = self.mosi;
        offsets[Line::Miso as usize] = self.miso;
        offsets
    }
}

fn level(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// Linux GPIO ISP programmer using bitbanging
pub struct LinuxGpioIsp {
    request: Request,
    offsets: [Offset; LINE_COUNT],
    half_period_ns: u64,
    /// Set when a line operation fails inside a byte transfer
    fault: Cell<bool>,
}

impl LinuxGpioIsp {
    /// Open the GPIO lines with the given configuration
    ///
    /// RESET starts high so the target keeps running until a session
    /// begins; SCK and MOSI start low.
    pub fn open(config: &LinuxGpioIspConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        let offsets = config.offsets();
        for (i, a) in offsets.iter().enumerate() {
            if offsets[i + 1..].contains(a) {
                return Err(LinuxGpioError::DuplicateLine(*a));
            }
        }

        log::debug!("linux_gpio: Opening device {}", config.device);

        let mut req_config = Config::default();
        req_config.with_line(config.reset).as_output(Value::Active);
        req_config.with_line(config.sck).as_output(Value::Inactive);
        req_config.with_line(config.mosi).as_output(Value::Inactive);
        req_config.with_line(config.miso).as_input();

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("avrdetect")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                source,
            })?;

        log::info!(
            "linux_gpio: Opened {} (reset={}, sck={}, mosi={}, miso={})",
            config.device,
            config.reset,
            config.sck,
            config.mosi,
            config.miso
        );

        Ok(Self {
            request,
            offsets,
            half_period_ns: config.half_period_ns,
            fault: Cell::new(false),
        })
    }

    fn latch_fault(&self, e: &LinuxGpioError) {
        if !self.fault.replace(true) {
            log::error!("{}", e);
        }
    }

    fn drive(&self, line: Line, name: &'static str, high: bool) -> Result<()> {
        self.request
            .set_value(self.offsets[line as usize], level(high))
            .map(|_| ())
            .map_err(|source| LinuxGpioError::SetValueFailed { line: name, source })
    }

    /// Release RESET and stop driving SCK and MOSI
    pub fn release_lines(&mut self) -> Result<()> {
        let mut cfg = Config::default();
        cfg.with_line(self.offsets[Line::Reset as usize])
            .as_output(Value::Active);
        cfg.with_line(self.offsets[Line::Sck as usize]).as_input();
        cfg.with_line(self.offsets[Line::Mosi as usize]).as_input();
        cfg.with_line(self.offsets[Line::Miso as usize]).as_input();
        self.request
            .reconfigure(&cfg)
            .map(|_| ())
            .map_err(LinuxGpioError::ReconfigureFailed)
    }
}

impl BitbangIspPins for LinuxGpioIsp {
    fn set_reset(&mut self, high: bool) {
        if let Err(e) = self.drive(Line::Reset, "RESET", high) {
            self.latch_fault(&e);
        }
    }

    fn set_sck(&mut self, high: bool) {
        if let Err(e) = self.drive(Line::Sck, "SCK", high) {
            self.latch_fault(&e);
        }
    }

    fn set_mosi(&mut self, high: bool) {
        if let Err(e) = self.drive(Line::Mosi, "MOSI", high) {
            self.latch_fault(&e);
        }
    }

    fn get_miso(&self) -> bool {
        match self.request.value(self.offsets[Line::Miso as usize]) {
            Ok(Value::Active) => true,
            Ok(Value::Inactive) => false,
            Err(source) => {
                self.latch_fault(&LinuxGpioError::GetValueFailed {
                    line: "MISO",
                    source,
                });
                false
            }
        }
    }

    fn half_period_delay(&self) {
        if self.half_period_ns > 0 {
            std::thread::sleep(std::time::Duration::from_nanos(self.half_period_ns));
        }
    }

    fn take_fault(&mut self) -> bool {
        self.fault.replace(false)
    }
}

impl IspTransport for LinuxGpioIsp {
    fn transfer(&mut self, byte: u8) -> CoreResult<u8> {
        bitbang::transfer_checked(self, byte)
    }

    fn set_reset(&mut self, high: bool) -> CoreResult<()> {
        self.drive(Line::Reset, "RESET", high).map_err(|e| {
            log::error!("{}", e);
            CoreError::ProgrammerError
        })
    }

    fn set_sck(&mut self, high: bool) -> CoreResult<()> {
        self.drive(Line::Sck, "SCK", high).map_err(|e| {
            log::error!("{}", e);
            CoreError::ProgrammerError
        })
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    fn release(&mut self) -> CoreResult<()> {
        self.release_lines().map_err(|e| {
            log::error!("{}", e);
            CoreError::ProgrammerError
        })
    }
}

fn parse_line(name: &'static str, value: &str) -> Result<Offset> {
    value.parse().map_err(|_| LinuxGpioError::InvalidParameter {
        name,
        value: value.to_string(),
    })
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `reset=N` - RESET GPIO line offset (required)
/// - `sck=N` - SCK (clock) GPIO line offset (required)
/// - `mosi=N` - MOSI GPIO line offset (required)
/// - `miso=N` - MISO GPIO line offset (required)
/// - `ispspeed=N` - ISP clock in kHz (optional, default ~100 kHz)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioIspConfig> {
    let mut config = LinuxGpioIspConfig::default();
    let mut reset = None;
    let mut sck = None;
    let mut mosi = None;
    let mut miso = None;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => config.device = value.to_string(),
            "gpiochip" => gpiochip = Some(parse_line("gpiochip", value)?),
            "reset" => reset = Some(parse_line("reset", value)?),
            "sck" => sck = Some(parse_line("sck", value)?),
            "mosi" => mosi = Some(parse_line("mosi", value)?),
            "miso" => miso = Some(parse_line("miso", value)?),
            "ispspeed" => {
                let speed_khz: u32 =
                    value
                        .parse()
                        .map_err(|_| LinuxGpioError::InvalidParameter {
                            name: "ispspeed",
                            value: value.to_string(),
                        })?;
                config = config.with_speed_hz(speed_khz.saturating_mul(1000));
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    match (config.device.is_empty(), gpiochip) {
        (true, Some(n)) => config.device = format!("/dev/gpiochip{}", n),
        (true, None) => return Err(LinuxGpioError::NoDevice),
        (false, Some(_)) => return Err(LinuxGpioError::ConflictingDevice),
        (false, None) => {}
    }

    config.reset = reset.ok_or(LinuxGpioError::MissingParameter("reset"))?;
    config.sck = sck.ok_or(LinuxGpioError::MissingParameter("sck"))?;
    config.mosi = mosi.ok_or(LinuxGpioError::MissingParameter("mosi"))?;
    config.miso = miso.ok_or(LinuxGpioError::MissingParameter("miso"))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("gpiochip", "0"),
            ("reset", "25"),
            ("sck", "11"),
            ("mosi", "10"),
            ("miso", "9"),
            ("ispspeed", "50"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.offsets(), [25, 11, 10, 9]);
        assert_eq!(config.half_period_ns, 10_000);
    }

    #[test]
    fn test_parse_options_dev_path() {
        let config = parse_options(&[
            ("dev", "/dev/gpiochip4"),
            ("reset", "1"),
            ("sck", "2"),
            ("mosi", "3"),
            ("miso", "4"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/gpiochip4");
        assert_eq!(config.half_period_ns, DEFAULT_HALF_PERIOD_NS);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(
            parse_options(&[("reset", "1"), ("sck", "2"), ("mosi", "3"), ("miso", "4")]),
            Err(LinuxGpioError::NoDevice)
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")]),
            Err(LinuxGpioError::ConflictingDevice)
        ));
        assert!(matches!(
            parse_options(&[("gpiochip", "0"), ("sck", "2"), ("mosi", "3"), ("miso", "4")]),
            Err(LinuxGpioError::MissingParameter("reset"))
        ));
        assert!(matches!(
            parse_options(&[("gpiochip", "0"), ("reset", "x")]),
            Err(LinuxGpioError::InvalidParameter { name: "reset", .. })
        ));
    }

    #[test]
    fn test_open_rejects_duplicate_lines() {
        let config = LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 11, 9);
        assert!(matches!(
            LinuxGpioIsp::open(&config),
            Err(LinuxGpioError::DuplicateLine(11))
        ));
    }
}
