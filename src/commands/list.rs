//! List commands implementation

use avrdetect_core::device::{BootFuse, DEVICES};

use crate::programmers;

/// List all available programmers
pub fn list_programmers() {
    println!("Available programmers:");
    println!();
    for p in programmers::available_programmers() {
        let aliases = if p.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", p.aliases.join(", "))
        };
        println!("  {:12} - {}{}", p.name, p.description, aliases);
        if p.requires_root {
            println!("  {:12}   requires root", "");
        }
    }
}

/// List all supported devices
pub fn list_devices() {
    println!("Supported devices:");
    println!();
    println!(
        "{:<14} {:<10} {:>8} {:>6} {:>10} {:>5}",
        "Name", "Signature", "Flash", "Page", "Boot min", "Fuse"
    );
    println!("{}", "-".repeat(58));

    for dev in DEVICES {
        let boot = if dev.has_boot_section() {
            format_size(dev.boot_base_size)
        } else {
            "-".to_string()
        };
        let fuse = match dev.boot_fuse {
            BootFuse::None => "-".to_string(),
            fuse => fuse.to_string(),
        };
        println!(
            "{:<14} {:<10} {:>8} {:>6} {:>10} {:>5}",
            dev.name,
            dev.signature.to_string(),
            format_size(dev.flash_size),
            dev.page_size,
            boot,
            fuse
        );
    }
}

pub(crate) fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(32 * 1024), "32 KiB");
        assert_eq!(format_size(1536), "1536 B");
    }
}
