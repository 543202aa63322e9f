//! Error types for Linux GPIO ISP operations

use thiserror::Error;

/// Linux GPIO ISP specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to set GPIO line value
    #[error("Failed to set {line} line: {source}")]
    SetValueFailed {
        line: &'static str,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to read GPIO line value
    #[error("Failed to read {line} line: {source}")]
    GetValueFailed {
        line: &'static str,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to reconfigure GPIO lines
    #[error("Failed to reconfigure GPIO lines: {0}")]
    ReconfigureFailed(#[source] gpiocdev::Error),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,

    /// Both dev and gpiochip given
    #[error("Only one of 'dev' or 'gpiochip' can be specified")]
    ConflictingDevice,

    /// Invalid GPIO line number or other numeric parameter
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// The same GPIO line was assigned to two signals
    #[error("GPIO line {0} is assigned more than once")]
    DuplicateLine(u32),
}

/// Result type for Linux GPIO ISP operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
