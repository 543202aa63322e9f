//! Detect command implementation

use std::fmt::Write as _;

use avrdetect_core::bootloader::{ron_entry, BootloaderDatabase};
use avrdetect_core::device::Signature;
use avrdetect_core::detect::{run_detection, DetectConfig, DetectionEvent, Report};
use avrdetect_core::fuse::LockMode;
use avrdetect_core::SessionConfig;
use indicatif::{ProgressBar, ProgressStyle};

use crate::programmers;

const HEX_ROW: usize = 16;

/// Prints detection events to stdout with a progress bar for flash reads
#[derive(Default)]
pub struct ConsoleReport {
    progress: Option<ProgressBar>,
}

impl ConsoleReport {
    pub fn new() -> Self {
        Self { progress: None }
    }
}

impl Report for ConsoleReport {
    fn event(&mut self, event: DetectionEvent) {
        match event {
            DetectionEvent::ProgrammingModeEntered { attempts } => {
                println!("Entered programming mode after {} attempt(s)", attempts);
            }
            DetectionEvent::ProgrammingModeFailed { attempts } => {
                println!("Target did not respond after {} attempts", attempts);
            }
            DetectionEvent::Signature(sig) => println!("Signature: {}", sig),
            DetectionEvent::Device(dev) => {
                println!("Device: {} ({} bytes flash)", dev.name, dev.flash_size);
            }
            DetectionEvent::UnknownDevice(sig) => println!("{}", unknown_device_line(sig)),
            DetectionEvent::Fuses(f) => {
                println!(
                    "Fuses: low={:02X} high={:02X} ext={:02X} lock={:02X}",
                    f.low, f.high, f.ext, f.lock
                );
                println!("Calibration: {:02X}", f.calibration);
            }
            DetectionEvent::FuseFlags {
                eeprom_preserved,
                watchdog_always_on,
                lock_bits,
            } => {
                println!(
                    "EEPROM preserved through chip erase: {}",
                    yes_no(eeprom_preserved)
                );
                println!("Watchdog always on: {}", yes_no(watchdog_always_on));
                match lock_bits.mode() {
                    LockMode::Unlocked if lock_bits.is_empty() => println!("Lock: none"),
                    mode => println!("Lock: {} ({:?})", mode, lock_bits),
                }
            }
            DetectionEvent::BootloaderEnabled { fuse, enabled } => {
                println!(
                    "Bootloader reset vector ({} fuse): {}",
                    fuse,
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            DetectionEvent::NoBootSupport => println!("Device has no boot section"),
            DetectionEvent::BootloaderRegion(region) => {
                println!(
                    "Bootloader region: 0x{:05X}-0x{:05X} ({} bytes)",
                    region.start,
                    region.end() - 1,
                    region.length
                );
            }
            DetectionEvent::HexDump { start, data } => {
                print!("{}", format_hex_dump(start, &data));
            }
            DetectionEvent::BootloaderDigest(result) => {
                println!("Bootloader MD5: {}", result.digest);
            }
            DetectionEvent::BootloaderMatch(record) => println!("Bootloader: {}", record.name),
            DetectionEvent::UnknownBootloader(digest) => {
                println!("Bootloader: unknown");
                println!("To name it, add this entry to a bootloader database file:");
                println!("    {}", ron_entry("unknown", digest));
            }
            DetectionEvent::NoBootloader => println!("Bootloader: none (region erased)"),
            DetectionEvent::ProgramDigest { length, result } => {
                println!("Program MD5 (first {} bytes): {}", length, result.digest);
                if result.all_erased {
                    println!("Program: none (flash erased)");
                }
            }
        }
    }

    fn reading(&mut self, label: &str, total_bytes: u32) {
        let pb = ProgressBar::new(total_bytes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(label.to_string());
        self.progress = Some(pb);
    }

    fn read_progress(&mut self, bytes_read: u32) {
        if let Some(pb) = &self.progress {
            pb.set_position(bytes_read as u64);
        }
    }

    fn read_done(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn unknown_device_line(sig: Signature) -> &'static str {
    if sig.is_blank() {
        "Device: none answering (check wiring, power and RESET)"
    } else {
        "Device: unknown"
    }
}

/// Format bytes as rows of 16, each prefixed with its flash address
pub(crate) fn format_hex_dump(start: u32, data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(HEX_ROW).enumerate() {
        let addr = start as usize + row * HEX_ROW;
        let _ = write!(out, "{:05X}:", addr);
        for byte in chunk {
            let _ = write!(out, " {:02X}", byte);
        }
        out.push('\n');
    }
    out
}

/// Run the detect command
pub fn run_detect(
    programmer: &str,
    attempts: u32,
    dump_len: u32,
    dump_bootloader: bool,
    bootloaders: &BootloaderDatabase,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = programmers::open_programmer(programmer)?;

    let config = DetectConfig::default()
        .with_session(SessionConfig::default().with_max_attempts(attempts))
        .with_program_dump_len(dump_len)
        .with_dump_bootloader(dump_bootloader);

    let mut report = ConsoleReport::new();
    let summary = run_detection(transport, &config, bootloaders.records(), &mut report)?;

    for problem in summary.identification_errors() {
        log::warn!("{}", problem);
    }
    Ok(())
}
