//! Bootloader database for runtime loading and lookup
//!
//! Known images are described in RON files:
//!
//! ```ron
//! (
//!     bootloaders: [
//!         (name: "Optiboot 8.0 (ATmega328P, 16 MHz)", md5: "0123456789abcdef0123456789abcdef"),
//!     ],
//! )
//! ```

use alloc::{format, string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::{find_in, BootloaderRecord, Digest};

/// Error type for bootloader database operations
#[derive(Debug)]
pub enum BootloaderDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for BootloaderDbError {
    fn from(e: io::Error) -> Self {
        BootloaderDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for BootloaderDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        BootloaderDbError::Parse(e)
    }
}

impl std::fmt::Display for BootloaderDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootloaderDbError::Io(e) => write!(f, "I/O error: {}", e),
            BootloaderDbError::Parse(e) => write!(f, "Parse error: {}", e),
            BootloaderDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for BootloaderDbError {}

#[derive(Debug, Clone, serde::Deserialize)]
struct BootloaderDef {
    name: String,
    md5: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct BootloaderFileDef {
    bootloaders: Vec<BootloaderDef>,
}

/// Runtime bootloader database
#[derive(Debug, Clone, Default)]
pub struct BootloaderDatabase {
    records: Vec<BootloaderRecord>,
}

impl BootloaderDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Load bootloader definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, BootloaderDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load bootloader definitions from a RON string
    ///
    /// Nothing is added if any entry has a malformed digest.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, BootloaderDbError> {
        let file_def: BootloaderFileDef = ron::from_str(content)?;

        let mut parsed = Vec::with_capacity(file_def.bootloaders.len());
        for def in file_def.bootloaders {
            let digest = Digest::from_hex(def.md5.trim()).ok_or_else(|| {
                BootloaderDbError::Validation(format!(
                    "bootloader \"{}\": md5 must be 32 hex digits, got \"{}\"",
                    def.name, def.md5
                ))
            })?;
            parsed.push(BootloaderRecord::new(digest, def.name));
        }

        let count = parsed.len();
        self.records.extend(parsed);
        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, BootloaderDbError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        // Stable order so the first-match rule does not depend on the filesystem
        paths.sort();

        let mut total = 0;
        for path in paths {
            total += self.load_file(&path)?;
        }
        Ok(total)
    }

    /// Add a single record
    pub fn push(&mut self, record: BootloaderRecord) {
        self.records.push(record);
    }

    /// Get all records in load order
    pub fn records(&self) -> &[BootloaderRecord] {
        &self.records
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a bootloader by digest
    pub fn identify(&self, digest: Digest) -> Option<&BootloaderRecord> {
        find_in(&self.records, digest)
    }
}

/// Format a digest as an entry for a bootloader RON file
pub fn ron_entry(name: &str, digest: Digest) -> String {
    format!("(name: {:?}, md5: \"{}\"),", name, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIBOOT: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_load_ron() {
        let ron = r#"
        (
            bootloaders: [
                (name: "Optiboot", md5: "0123456789abcdef0123456789abcdef"),
                (name: "ATmegaBOOT", md5: "FEDCBA9876543210FEDCBA9876543210"),
            ],
        )
        "#;

        let mut db = BootloaderDatabase::new();
        let count = db.load_ron(ron).unwrap();

        assert_eq!(count, 2);
        assert_eq!(db.len(), 2);

        let record = db.identify(Digest::from_hex(OPTIBOOT).unwrap()).unwrap();
        assert_eq!(record.name, "Optiboot");
        let record = db
            .identify(Digest::from_hex("fedcba9876543210fedcba9876543210").unwrap())
            .unwrap();
        assert_eq!(record.name, "ATmegaBOOT");
        assert!(db.identify(Digest([0; 16])).is_none());
    }

    #[test]
    fn test_bad_digest_is_rejected() {
        let ron = r#"(bootloaders: [
            (name: "good", md5: "0123456789abcdef0123456789abcdef"),
            (name: "short", md5: "0123"),
        ])"#;
        let mut db = BootloaderDatabase::new();
        assert!(matches!(
            db.load_ron(ron),
            Err(BootloaderDbError::Validation(_))
        ));
        assert!(db.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let mut db = BootloaderDatabase::new();
        assert!(matches!(
            db.load_ron("(bootloaders: [(name: 1)])"),
            Err(BootloaderDbError::Parse(_))
        ));
    }

    #[test]
    fn test_ron_entry_loads_back() {
        let digest = Digest::from_hex(OPTIBOOT).unwrap();
        let entry = ron_entry("Custom \"v2\"", digest);
        assert_eq!(
            entry,
            "(name: \"Custom \\\"v2\\\"\", md5: \"0123456789abcdef0123456789abcdef\"),"
        );

        let mut db = BootloaderDatabase::new();
        db.load_ron(&format!("(bootloaders: [{}])", entry)).unwrap();
        assert_eq!(db.identify(digest).unwrap().name, "Custom \"v2\"");
    }

    #[test]
    fn test_load_dir() {
        let dir = std::env::temp_dir().join(format!("avrdetect-db-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("a.ron"),
            "(bootloaders: [(name: \"from a\", md5: \"0123456789abcdef0123456789abcdef\")])",
        )
        .unwrap();
        fs::write(
            dir.join("b.ron"),
            "(bootloaders: [(name: \"from b\", md5: \"0123456789abcdef0123456789abcdef\")])",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not a database").unwrap();

        let mut db = BootloaderDatabase::new();
        let count = db.load_dir(&dir);
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(count.unwrap(), 2);
        let digest = Digest::from_hex(OPTIBOOT).unwrap();
        assert_eq!(db.identify(digest).unwrap().name, "from a");
    }
}
