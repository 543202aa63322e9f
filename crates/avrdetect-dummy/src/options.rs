//! Programmer string options for the emulated target

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{DummyConfig, DummyTarget, DEFAULT_DEVICE};

/// Errors setting up the emulated target
#[derive(Debug, Error)]
pub enum DummyError {
    /// The requested part is not in the signature table
    #[error("Unknown chip '{0}' (see list-devices)")]
    UnknownChip(String),

    /// An option value could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Option name
        name: &'static str,
        /// Value as given
        value: String,
    },

    /// A flash image could not be read
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        /// Image path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Parsed dummy programmer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyOptions {
    /// Target configuration
    pub config: DummyConfig,
    /// Raw image loaded at address 0
    pub image: Option<PathBuf>,
    /// Raw image loaded so it ends at the top of flash
    pub bootloader: Option<PathBuf>,
}

fn parse_byte(name: &'static str, value: &str) -> Result<u8, DummyError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| DummyError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `chip=NAME` - Part to emulate (default ATmega328P)
/// - `lfuse=N`, `hfuse=N`, `efuse=N` - Fuse bytes (decimal or 0x hex)
/// - `lock=N` - Lock byte
/// - `cal=N` - Calibration byte
/// - `sync=N` - Programming enable attempts to ignore
/// - `image=PATH` - Raw binary loaded at address 0
/// - `bootloader=PATH` - Raw binary loaded at the top of flash
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyOptions, DummyError> {
    let chip = options
        .iter()
        .find(|(k, _)| *k == "chip")
        .map_or(DEFAULT_DEVICE, |(_, v)| *v);
    let mut parsed = DummyOptions {
        config: DummyConfig::for_device_name(chip)
            .ok_or_else(|| DummyError::UnknownChip(chip.to_string()))?,
        ..Default::default()
    };

    for (key, value) in options {
        let config = &mut parsed.config;
        match *key {
            "chip" => {}
            "lfuse" => config.low_fuse = parse_byte("lfuse", value)?,
            "hfuse" => config.high_fuse = parse_byte("hfuse", value)?,
            "efuse" => config.ext_fuse = parse_byte("efuse", value)?,
            "lock" => config.lock = parse_byte("lock", value)?,
            "cal" => config.calibration = parse_byte("cal", value)?,
            "sync" => {
                config.sync_failures = value.parse().map_err(|_| DummyError::InvalidValue {
                    name: "sync",
                    value: value.to_string(),
                })?;
            }
            "image" => parsed.image = Some(PathBuf::from(value)),
            "bootloader" => parsed.bootloader = Some(PathBuf::from(value)),
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(parsed)
}

fn read_image(path: &Path) -> Result<Vec<u8>, DummyError> {
    std::fs::read(path).map_err(|source| DummyError::ImageReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Build an emulated target from programmer options
pub fn open_dummy(options: &[(&str, &str)]) -> Result<DummyTarget, DummyError> {
    let parsed = parse_options(options)?;
    log::info!(
        "dummy: Emulating {} (L={:02X} H={:02X} E={:02X})",
        parsed.config.signature,
        parsed.config.low_fuse,
        parsed.config.high_fuse,
        parsed.config.ext_fuse
    );

    let mut target = DummyTarget::new(parsed.config);
    if let Some(path) = &parsed.image {
        target.load(0, &read_image(path)?);
    }
    if let Some(path) = &parsed.bootloader {
        target.load_top(&read_image(path)?);
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avrdetect_core::device::Signature;

    #[test]
    fn test_defaults() {
        let parsed = parse_options(&[]).unwrap();
        assert_eq!(parsed.config, DummyConfig::default());
        assert!(parsed.image.is_none());
    }

    #[test]
    fn test_chip_and_fuses() {
        let parsed = parse_options(&[
            ("hfuse", "0xD8"),
            ("chip", "atmega1284p"),
            ("lfuse", "255"),
            ("sync", "3"),
        ])
        .unwrap();
        assert_eq!(parsed.config.signature, Signature::new(0x1E, 0x97, 0x05));
        assert_eq!(parsed.config.flash_size, 128 * 1024);
        assert_eq!(parsed.config.high_fuse, 0xD8);
        assert_eq!(parsed.config.low_fuse, 0xFF);
        assert_eq!(parsed.config.sync_failures, 3);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_options(&[("chip", "ATmega999")]),
            Err(DummyError::UnknownChip(_))
        ));
        assert!(matches!(
            parse_options(&[("hfuse", "0x1FF")]),
            Err(DummyError::InvalidValue { name: "hfuse", .. })
        ));
        assert!(matches!(
            open_dummy(&[("image", "/nonexistent/avrdetect.bin")]),
            Err(DummyError::ImageReadFailed { .. })
        ));
    }

    #[test]
    fn test_open_dummy_loads_bootloader() {
        let path = std::env::temp_dir().join(format!("avrdetect-boot-{}.bin", std::process::id()));
        std::fs::write(&path, [0x11, 0x24, 0x84, 0xB7]).unwrap();
        let target = open_dummy(&[("bootloader", path.to_str().unwrap())]);
        std::fs::remove_file(&path).unwrap();

        let target = target.unwrap();
        assert_eq!(&target.flash()[0x7FFC..], &[0x11, 0x24, 0x84, 0xB7]);
    }
}
