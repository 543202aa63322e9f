//! Detection pipeline
//!
//! One run enters programming mode, reads the signature and fuses, locates
//! and fingerprints the boot section and finally digests the start of
//! program memory. Every finding is pushed to a [`Report`] sink as it is
//! made, so a run that stops early still reports what it learned.

use alloc::vec::Vec;

use crate::bootloader::{
    digest_range_with, find_in, locate, BootloaderRecord, BootloaderRegion, Digest, DigestResult,
};
use crate::device::{self, BootFuse, DeviceDescriptor, Signature};
use crate::error::{Error, IdentificationError, ProtocolError, Result};
use crate::fuse::{read_fuses, FuseSnapshot, LockBits};
use crate::programmer::IspTransport;
use crate::session::{IspSession, SessionConfig};

/// Default number of program memory bytes to dump
pub const DEFAULT_PROGRAM_DUMP_LEN: u32 = 256;

/// Configuration for one detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectConfig {
    /// Session timing
    pub session: SessionConfig,
    /// Bytes of program memory to dump and digest, 0 to skip
    pub program_dump_len: u32,
    /// Include the boot section contents in the report
    pub dump_bootloader: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            program_dump_len: DEFAULT_PROGRAM_DUMP_LEN,
            dump_bootloader: true,
        }
    }
}

impl DetectConfig {
    /// Set the session configuration
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the program memory dump length
    pub fn with_program_dump_len(mut self, len: u32) -> Self {
        self.program_dump_len = len;
        self
    }

    /// Enable or disable the boot section dump
    pub fn with_dump_bootloader(mut self, dump: bool) -> Self {
        self.dump_bootloader = dump;
        self
    }
}

/// Something the pipeline found out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    /// The target acknowledged programming enable
    ProgrammingModeEntered {
        /// Attempts used
        attempts: u32,
    },
    /// The target never acknowledged programming enable
    ProgrammingModeFailed {
        /// Attempts made
        attempts: u32,
    },
    /// Raw signature bytes
    Signature(Signature),
    /// Signature matched a known part
    Device(&'static DeviceDescriptor),
    /// Signature is not in the table
    UnknownDevice(Signature),
    /// Raw fuse, lock and calibration bytes
    Fuses(FuseSnapshot),
    /// Flags decoded from the high fuse and lock byte
    FuseFlags {
        /// EESAVE programmed
        eeprom_preserved: bool,
        /// WDTON programmed
        watchdog_always_on: bool,
        /// Programmed lock bits
        lock_bits: LockBits,
    },
    /// State of BOOTRST
    BootloaderEnabled {
        /// Fuse byte that holds BOOTRST
        fuse: BootFuse,
        /// BOOTRST programmed
        enabled: bool,
    },
    /// The part has no boot section
    NoBootSupport,
    /// Boot section address range
    BootloaderRegion(BootloaderRegion),
    /// Contents of a flash range
    HexDump {
        /// Address of the first byte
        start: u32,
        /// Bytes read
        data: Vec<u8>,
    },
    /// Digest of the boot section
    BootloaderDigest(DigestResult),
    /// Boot section matched a known image
    BootloaderMatch(BootloaderRecord),
    /// Boot section has content but no known digest
    UnknownBootloader(Digest),
    /// Boot section is erased
    NoBootloader,
    /// Digest of the start of program memory; erased means no program
    ProgramDigest {
        /// Number of bytes digested from address 0
        length: u32,
        /// Digest result
        result: DigestResult,
    },
}

/// Sink for detection events
pub trait Report {
    /// Called for every finding, in pipeline order
    fn event(&mut self, event: DetectionEvent);

    /// Called when a flash read of `total_bytes` starts
    fn reading(&mut self, _label: &str, _total_bytes: u32) {}

    /// Called after each byte of a flash read
    fn read_progress(&mut self, _bytes_read: u32) {}

    /// Called when a flash read completes
    fn read_done(&mut self) {}
}

impl Report for Vec<DetectionEvent> {
    fn event(&mut self, event: DetectionEvent) {
        self.push(event);
    }
}

/// Everything learned in one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Programming enable attempts used
    pub attempts: u32,
    /// Signature read from the target
    pub signature: Option<Signature>,
    /// Matched part
    pub device: Option<&'static DeviceDescriptor>,
    /// Fuse bytes
    pub fuses: Option<FuseSnapshot>,
    /// Boot section, if the part has one
    pub region: Option<BootloaderRegion>,
    /// Boot section digest
    pub bootloader: Option<DigestResult>,
    /// Matched bootloader image
    pub bootloader_match: Option<BootloaderRecord>,
    /// Digest of the start of program memory
    pub program: Option<DigestResult>,
}

impl DetectionSummary {
    /// Identification problems found during the run
    pub fn identification_errors(&self) -> Vec<IdentificationError> {
        let mut errors = Vec::new();
        if let (Some(sig), None) = (self.signature, self.device) {
            errors.push(IdentificationError::UnknownSignature(sig));
        }
        if let (Some(result), None) = (self.bootloader, &self.bootloader_match) {
            if !result.all_erased {
                errors.push(IdentificationError::UnknownBootloader(result.digest));
            }
        }
        errors
    }
}

/// Open a session on `transport`, run the pipeline and release the target
pub fn run_detection<T, R>(
    transport: T,
    config: &DetectConfig,
    bootloaders: &[BootloaderRecord],
    report: &mut R,
) -> Result<DetectionSummary>
where
    T: IspTransport,
    R: Report + ?Sized,
{
    let mut session = IspSession::new(transport, config.session);
    let result = detect(&mut session, config, bootloaders, report);
    session.finish();
    result
}

/// Run the pipeline on an open session
///
/// Only protocol failures are returned as errors. An unknown signature or
/// bootloader is reported to the sink and the run carries on with whatever
/// stages do not depend on it.
pub fn detect<T, R>(
    session: &mut IspSession<T>,
    config: &DetectConfig,
    bootloaders: &[BootloaderRecord],
    report: &mut R,
) -> Result<DetectionSummary>
where
    T: IspTransport,
    R: Report + ?Sized,
{
    let mut summary = DetectionSummary::default();

    summary.attempts = match session.enter_programming_mode() {
        Ok(attempts) => attempts,
        Err(Error::Protocol(ProtocolError::EntryTimeout { attempts })) => {
            report.event(DetectionEvent::ProgrammingModeFailed { attempts });
            return Err(ProtocolError::EntryTimeout { attempts }.into());
        }
        Err(e) => return Err(e),
    };
    report.event(DetectionEvent::ProgrammingModeEntered {
        attempts: summary.attempts,
    });

    let signature = device::read_signature(session)?;
    summary.signature = Some(signature);
    report.event(DetectionEvent::Signature(signature));

    summary.device = device::identify(signature);
    match summary.device {
        Some(dev) => {
            log::info!("detect: Found {} ({} bytes flash)", dev.name, dev.flash_size);
            report.event(DetectionEvent::Device(dev));
        }
        None if signature.is_blank() => {
            log::warn!(
                "detect: Signature {} looks like no target is answering, check wiring and power",
                signature
            );
            report.event(DetectionEvent::UnknownDevice(signature));
        }
        None => {
            log::warn!("detect: {}", IdentificationError::UnknownSignature(signature));
            report.event(DetectionEvent::UnknownDevice(signature));
        }
    }

    let fuses = read_fuses(session)?;
    summary.fuses = Some(fuses);
    report.event(DetectionEvent::Fuses(fuses));
    report.event(DetectionEvent::FuseFlags {
        eeprom_preserved: fuses.eeprom_preserved(),
        watchdog_always_on: fuses.watchdog_always_on(),
        lock_bits: fuses.lock_bits(),
    });

    let Some(dev) = summary.device else {
        return Ok(summary);
    };

    if let Some(enabled) = fuses.bootloader_enabled(dev.boot_fuse) {
        report.event(DetectionEvent::BootloaderEnabled {
            fuse: dev.boot_fuse,
            enabled,
        });
    }

    match locate(dev, &fuses) {
        Some(region) => {
            summary.region = Some(region);
            report.event(DetectionEvent::BootloaderRegion(region));
            let result = read_and_digest(
                session,
                "bootloader",
                region.start,
                region.length,
                config.dump_bootloader,
                report,
            )?;
            summary.bootloader = Some(result);
            report.event(DetectionEvent::BootloaderDigest(result));

            if result.all_erased {
                report.event(DetectionEvent::NoBootloader);
            } else if let Some(record) = find_in(bootloaders, result.digest) {
                log::info!("detect: Bootloader is {}", record.name);
                summary.bootloader_match = Some(record.clone());
                report.event(DetectionEvent::BootloaderMatch(record.clone()));
            } else {
                log::warn!(
                    "detect: {}",
                    IdentificationError::UnknownBootloader(result.digest)
                );
                report.event(DetectionEvent::UnknownBootloader(result.digest));
            }
        }
        None => report.event(DetectionEvent::NoBootSupport),
    }

    let length = config.program_dump_len.min(dev.flash_size);
    if length > 0 {
        let result = read_and_digest(session, "program", 0, length, true, report)?;
        summary.program = Some(result);
        report.event(DetectionEvent::ProgramDigest { length, result });
    }

    Ok(summary)
}

fn read_and_digest<T, R>(
    session: &mut IspSession<T>,
    label: &str,
    start: u32,
    length: u32,
    dump: bool,
    report: &mut R,
) -> Result<DigestResult>
where
    T: IspTransport,
    R: Report + ?Sized,
{
    let mut data = Vec::with_capacity(if dump { length as usize } else { 0 });
    let mut read = 0u32;

    report.reading(label, length);
    let result = digest_range_with(session, start, length, |_, byte| {
        if dump {
            data.push(byte);
        }
        read += 1;
        report.read_progress(read);
    });
    report.read_done();
    let result = result?;

    if dump {
        report.event(DetectionEvent::HexDump { start, data });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootloader::digest_bytes;
    use crate::testing::MockTarget;
    use std::vec;

    fn fast() -> DetectConfig {
        DetectConfig::default().with_session(
            SessionConfig::default()
                .with_retry_delay_ms(0)
                .with_reset_settle_ms(0),
        )
    }

    #[test]
    fn test_atmega328p_blank_chip() {
        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary =
            run_detection(MockTarget::new(), &fast(), &[], &mut events).unwrap();

        let dev = device::identify(Signature::new(0x1E, 0x95, 0x0F)).unwrap();
        assert_eq!(summary.device, Some(dev));
        assert_eq!(
            summary.region,
            Some(BootloaderRegion { start: 32256, length: 512 })
        );
        assert!(summary.bootloader.unwrap().all_erased);
        assert!(summary.identification_errors().is_empty());

        assert_eq!(events[0], DetectionEvent::ProgrammingModeEntered { attempts: 1 });
        assert_eq!(events[1], DetectionEvent::Signature(dev.signature));
        assert_eq!(events[2], DetectionEvent::Device(dev));
        assert!(events.contains(&DetectionEvent::BootloaderEnabled {
            fuse: BootFuse::High,
            enabled: true,
        }));
        assert!(events.contains(&DetectionEvent::NoBootloader));
        assert!(events.contains(&DetectionEvent::ProgramDigest {
            length: 256,
            result: digest_bytes(&[0xFF; 256]),
        }));
    }

    #[test]
    fn test_known_bootloader() {
        let mut flash = vec![0xFF; 32 * 1024];
        flash[0x7E00..0x7E04].copy_from_slice(&[0x11, 0x24, 0x84, 0xB7]);
        let digest = digest_bytes(&flash[0x7E00..]).digest;
        let records = [BootloaderRecord::new(digest, "Optiboot")];

        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary = run_detection(
            MockTarget::new().with_flash(flash),
            &fast(),
            &records,
            &mut events,
        )
        .unwrap();

        assert_eq!(summary.bootloader_match.as_ref().unwrap().name, "Optiboot");
        assert!(events.contains(&DetectionEvent::BootloaderMatch(records[0].clone())));
    }

    #[test]
    fn test_unknown_bootloader() {
        let mut flash = vec![0xFF; 32 * 1024];
        flash[0x7FFE] = 0x00;
        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary = run_detection(
            MockTarget::new().with_flash(flash),
            &fast(),
            &[],
            &mut events,
        )
        .unwrap();

        let digest = summary.bootloader.unwrap().digest;
        assert!(events.contains(&DetectionEvent::UnknownBootloader(digest)));
        assert_eq!(
            summary.identification_errors(),
            vec![IdentificationError::UnknownBootloader(digest)]
        );
    }

    #[test]
    fn test_unknown_signature_still_reports_fuses() {
        let target = MockTarget::new().with_signature([0x1E, 0xAA, 0x55]);
        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary = run_detection(target, &fast(), &[], &mut events).unwrap();

        assert_eq!(summary.device, None);
        assert!(summary.fuses.is_some());
        assert_eq!(summary.region, None);
        assert!(events.contains(&DetectionEvent::UnknownDevice(Signature::new(
            0x1E, 0xAA, 0x55
        ))));
        assert!(matches!(events.last(), Some(DetectionEvent::FuseFlags { .. })));
    }

    #[test]
    fn test_bootrst_unprogrammed_still_digests_region() {
        let target = MockTarget::new().with_fuses(0xFF, 0xDF, 0xFD);
        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary = run_detection(target, &fast(), &[], &mut events).unwrap();

        assert!(events.contains(&DetectionEvent::BootloaderEnabled {
            fuse: BootFuse::High,
            enabled: false,
        }));
        assert!(summary.bootloader.is_some());
    }

    #[test]
    fn test_entry_timeout_emits_no_identification_events() {
        let target = MockTarget::new().with_sync_failures(u32::MAX);
        let mut events: Vec<DetectionEvent> = Vec::new();
        let result = run_detection(target, &fast(), &[], &mut events);

        assert_eq!(
            result,
            Err(Error::Protocol(ProtocolError::EntryTimeout { attempts: 50 }))
        );
        assert_eq!(
            events,
            vec![DetectionEvent::ProgrammingModeFailed { attempts: 50 }]
        );
    }

    #[test]
    fn test_dump_lengths() {
        let config = fast().with_dump_bootloader(false).with_program_dump_len(0);
        let mut events: Vec<DetectionEvent> = Vec::new();
        let summary = run_detection(MockTarget::new(), &config, &[], &mut events).unwrap();

        assert!(summary.program.is_none());
        assert!(!events
            .iter()
            .any(|e| matches!(e, DetectionEvent::HexDump { .. })));

        let config = fast().with_program_dump_len(1 << 20);
        let mut events: Vec<DetectionEvent> = Vec::new();
        run_detection(MockTarget::new(), &config, &[], &mut events).unwrap();
        assert!(events.contains(&DetectionEvent::ProgramDigest {
            length: 32 * 1024,
            result: digest_bytes(&[0xFF; 32 * 1024]),
        }));
    }
}
