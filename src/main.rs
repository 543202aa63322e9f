//! avrdetect - Identify AVR microcontrollers and their bootloaders
//!
//! Connects to a target over the 4-byte ISP protocol, reads its signature,
//! fuses and lock byte, then fingerprints the boot section with an MD5
//! digest and looks it up in a RON bootloader database.
//!
//! Programmers are selected with a programmer string, e.g.
//! `linux_gpio:gpiochip=0,reset=25,sck=11,mosi=10,miso=9` or
//! `dummy:chip=ATmega2560` for an emulated target.

mod cli;
mod commands;
mod programmers;

use avrdetect_core::bootloader::{BootloaderDatabase, BootloaderDbError};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Detect {
            programmer,
            attempts,
            dump_len,
            no_bootloader_dump,
        } => {
            let db = match load_bootloader_database(cli.bootloader_db.as_deref()) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Failed to load bootloader database: {}", e);
                    std::process::exit(1);
                }
            };
            log::info!("Loaded {} bootloader definitions", db.len());

            commands::run_detect(&programmer, attempts, dump_len, !no_bootloader_dump, &db)
        }
        Commands::ListDevices => {
            commands::list_devices();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Load the bootloader database from the given path or the default locations
///
/// An explicit path must load. Without one, the first default directory that
/// exists is used, and an empty database is returned if none does.
fn load_bootloader_database(path: Option<&Path>) -> Result<BootloaderDatabase, BootloaderDbError> {
    let mut db = BootloaderDatabase::new();

    if let Some(path) = path {
        if path.is_dir() {
            db.load_dir(path)?;
        } else {
            db.load_file(path)?;
        }
        return Ok(db);
    }

    let default_paths = [
        PathBuf::from("bootloaders"),
        PathBuf::from("/usr/share/avrdetect/bootloaders"),
        PathBuf::from("/usr/local/share/avrdetect/bootloaders"),
    ];

    for dir in &default_paths {
        if dir.is_dir() {
            log::debug!("Loading bootloader database from {}", dir.display());
            match db.load_dir(dir) {
                Ok(_) => return Ok(db),
                Err(e) => {
                    log::warn!("Failed to load bootloaders from {}: {}", dir.display(), e);
                    db = BootloaderDatabase::new();
                }
            }
        }
    }

    log::warn!("No bootloader database found, bootloaders will be reported by digest only");
    Ok(db)
}
