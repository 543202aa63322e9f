//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use, as name[:key=value,...] [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "avrdetect")]
#[command(author, version, about = "AVR chip and bootloader detector", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bootloader database file or directory (contains .ron files)
    /// Defaults to looking in ./bootloaders/ and /usr/share/avrdetect/bootloaders/
    #[arg(long, global = true)]
    pub bootloader_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the attached chip, its fuses and its bootloader
    Detect {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Programming enable attempts before giving up
        #[arg(long, default_value_t = 50)]
        attempts: u32,

        /// Bytes of program memory to dump and digest (hex or decimal, 0 to skip)
        #[arg(long, value_parser = parse_hex_u32, default_value = "256")]
        dump_len: u32,

        /// Don't print the bootloader hex dump
        #[arg(long)]
        no_bootloader_dump: bool,
    },

    /// List supported AVR devices
    ListDevices,

    /// List available programmers
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x100"), Ok(256));
        assert_eq!(parse_hex_u32("512"), Ok(512));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_defaults() {
        let cli = Cli::parse_from(["avrdetect", "detect", "-p", "dummy"]);
        match cli.command {
            Commands::Detect {
                programmer,
                attempts,
                dump_len,
                no_bootloader_dump,
            } => {
                assert_eq!(programmer, "dummy");
                assert_eq!(attempts, 50);
                assert_eq!(dump_len, 256);
                assert!(!no_bootloader_dump);
            }
            _ => panic!("expected detect"),
        }
    }
}
