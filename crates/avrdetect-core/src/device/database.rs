//! Compiled-in signature table
//!
//! Ordered, duplicate-free. Variants that share a signature (A/non-A
//! revisions) appear once under the name of the current part.

use super::types::{dev, BootFuse::*, DeviceDescriptor};

/// Known AVR parts, searched in order
#[rustfmt::skip]
pub static DEVICES: &[DeviceDescriptor] = &[
    // ATtiny (no hardware boot section)
    dev([0x1E, 0x90, 0x07], "ATtiny13A",   1,    0,  32, None, false),
    dev([0x1E, 0x91, 0x0A], "ATtiny2313A", 2,    0,  32, None, false),
    dev([0x1E, 0x92, 0x0D], "ATtiny4313",  4,    0,  64, None, false),
    dev([0x1E, 0x91, 0x0B], "ATtiny24A",   2,    0,  32, None, false),
    dev([0x1E, 0x92, 0x07], "ATtiny44A",   4,    0,  64, None, false),
    dev([0x1E, 0x93, 0x0C], "ATtiny84A",   8,    0,  64, None, false),
    dev([0x1E, 0x91, 0x08], "ATtiny25",    2,    0,  32, None, false),
    dev([0x1E, 0x92, 0x06], "ATtiny45",    4,    0,  64, None, false),
    dev([0x1E, 0x93, 0x0B], "ATtiny85",    8,    0,  64, None, false),
    dev([0x1E, 0x91, 0x0C], "ATtiny261A",  2,    0,  32, None, false),
    dev([0x1E, 0x92, 0x08], "ATtiny461A",  4,    0,  64, None, false),
    dev([0x1E, 0x93, 0x0D], "ATtiny861A",  8,    0,  64, None, false),
    dev([0x1E, 0x94, 0x87], "ATtiny167",   16,   0, 128, None, false),
    dev([0x1E, 0x94, 0x12], "ATtiny1634",  16,   0,  32, None, false),

    // ATmega48/88/168/328 family
    dev([0x1E, 0x92, 0x05], "ATmega48A",   4,    0,  64, None, false),
    dev([0x1E, 0x92, 0x0A], "ATmega48PA",  4,    0,  64, None, false),
    dev([0x1E, 0x93, 0x0A], "ATmega88A",   8,  256,  64, Ext,  false),
    dev([0x1E, 0x93, 0x0F], "ATmega88PA",  8,  256,  64, Ext,  false),
    dev([0x1E, 0x94, 0x06], "ATmega168A",  16, 256, 128, Ext,  false),
    dev([0x1E, 0x94, 0x0B], "ATmega168PA", 16, 256, 128, Ext,  false),
    dev([0x1E, 0x95, 0x14], "ATmega328",   32, 512, 128, High, false),
    dev([0x1E, 0x95, 0x0F], "ATmega328P",  32, 512, 128, High, false),
    dev([0x1E, 0x95, 0x16], "ATmega328PB", 32, 512, 128, High, false),

    // Classic ATmega (fixed write delays)
    dev([0x1E, 0x93, 0x07], "ATmega8A",    8,   256,  64, High, true),
    dev([0x1E, 0x94, 0x03], "ATmega16A",   16,  256, 128, High, true),
    dev([0x1E, 0x95, 0x02], "ATmega32A",   32,  512, 128, High, true),
    dev([0x1E, 0x96, 0x02], "ATmega64A",   64, 1024, 256, High, true),
    dev([0x1E, 0x97, 0x02], "ATmega128A", 128, 1024, 256, High, true),
    dev([0x1E, 0x93, 0x06], "ATmega8515",  8,   256,  64, High, true),
    dev([0x1E, 0x93, 0x08], "ATmega8535",  8,   256,  64, High, true),

    // ATmega164/324/644/1284 family
    dev([0x1E, 0x94, 0x0A], "ATmega164PA",  16,  256, 128, High, false),
    dev([0x1E, 0x95, 0x08], "ATmega324P",   32,  512, 128, High, false),
    dev([0x1E, 0x95, 0x11], "ATmega324PA",  32,  512, 128, High, false),
    dev([0x1E, 0x96, 0x09], "ATmega644A",   64, 1024, 256, High, false),
    dev([0x1E, 0x96, 0x0A], "ATmega644PA",  64, 1024, 256, High, false),
    dev([0x1E, 0x97, 0x06], "ATmega1284",  128, 1024, 256, High, false),
    dev([0x1E, 0x97, 0x05], "ATmega1284P", 128, 1024, 256, High, false),

    // ATmega640/1280/2560 family
    dev([0x1E, 0x96, 0x08], "ATmega640",   64, 1024, 256, High, false),
    dev([0x1E, 0x97, 0x03], "ATmega1280", 128, 1024, 256, High, false),
    dev([0x1E, 0x97, 0x04], "ATmega1281", 128, 1024, 256, High, false),
    dev([0x1E, 0x98, 0x01], "ATmega2560", 256, 1024, 256, High, false),
    dev([0x1E, 0x98, 0x02], "ATmega2561", 256, 1024, 256, High, false),

    // USB parts
    dev([0x1E, 0x93, 0x89], "ATmega8U2",     8,  512,  64, High, false),
    dev([0x1E, 0x94, 0x89], "ATmega16U2",   16,  512, 128, High, false),
    dev([0x1E, 0x95, 0x8A], "ATmega32U2",   32,  512, 128, High, false),
    dev([0x1E, 0x94, 0x88], "ATmega16U4",   16,  512, 128, High, false),
    dev([0x1E, 0x95, 0x87], "ATmega32U4",   32,  512, 128, High, false),
    dev([0x1E, 0x93, 0x82], "AT90USB82",     8,  512, 128, High, false),
    dev([0x1E, 0x94, 0x82], "AT90USB162",   16,  512, 128, High, false),
    dev([0x1E, 0x96, 0x82], "AT90USB646",   64, 1024, 256, High, false),
    dev([0x1E, 0x97, 0x82], "AT90USB1286", 128, 1024, 256, High, false),
];
