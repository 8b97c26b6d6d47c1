// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::RomError;
use std::fmt;
use std::fs::File;
use std::io::Error;
use std::io::Read;
use std::path::Path;
use std::result::Result;

// Used to identify a rom as being in the iNES format. This byte sequence should
// be at the start of every rom.
const INES_IDENTIFIER: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

/// Size of the iNES header. Everything after it is program and character data.
pub const INES_HEADER_SIZE: usize = 0x10;

// Flag 6 bit that signals a 512 byte trainer between the header and PRG-ROM.
const TRAINER_FLAG: u8 = 0x04;

/// Structure that represents the 16 byte header of an iNES rom. Only missing
/// the zero fill as it's unused space.
#[derive(Debug, Clone, PartialEq)]
pub struct INESHeader {
    identifier: [u8; 4], // File format identifier.
    pub prg_rom_size: u8, // Size of PRG ROM in 16 KB units.
    pub chr_rom_size: u8, // Size of CHR ROM in 8 KB units.
    pub flags_6: u8,
    pub flags_7: u8,
    pub prg_ram_size: u8, // Size of PRG RAM in 8 KB units (0 infers 8 KB for
                          // compatibility).
    pub flags_9: u8,
    pub flags_10: u8,     // Unofficial, unused by most emulators.
}

impl INESHeader {
    /// True when the header starts with "NES<0x1A>".
    pub fn is_ines(&self) -> bool {
        self.identifier == INES_IDENTIFIER
    }

    pub fn has_trainer(&self) -> bool {
        self.flags_6 & TRAINER_FLAG == TRAINER_FLAG
    }

    /// The mapper number is split between the high nibbles of flags 6 and 7.
    pub fn mapper(&self) -> u8 {
        (self.flags_7 & 0xF0) | (self.flags_6 >> 4)
    }
}

impl fmt::Display for INESHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PRG-ROM: {} x 16KB, CHR-ROM: {} x 8KB, mapper: {}, trainer: {}",
               self.prg_rom_size, self.chr_rom_size, self.mapper(),
               if self.has_trainer() { "yes" } else { "no" })
    }
}

/// Reads a binary file at a given path and stores it in a vector of bytes.
pub fn read_bin<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut file = File::open(path)?;
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Parses the header of a rom (assumed to be in the iNES format).
///
/// The first 16 bytes of the rom contain the header. The iNES format is
/// identified by the literal byte string "NES<0x1A>". A rom without the
/// identifier still parses so it can be loaded and inspected; callers decide
/// what to do with it through `is_ines`.
pub fn parse_rom_header(rom: &[u8]) -> Result<INESHeader, RomError> {
    // The header takes at least 0x10 bytes of space at the start of the rom.
    if rom.len() < INES_HEADER_SIZE {
        return Err(RomError::TooShort(rom.len()));
    }

    // Copy the identifier from the rom for placement in the header.
    let mut identifier: [u8; 4] = [0; 4];
    identifier.copy_from_slice(&rom[0x0..0x4]);

    // Return an iNES header containing fields filled in from the rom.
    Ok(INESHeader {
        identifier: identifier,
        prg_rom_size: rom[0x4],
        chr_rom_size: rom[0x5],
        flags_6: rom[0x6],
        flags_7: rom[0x7],
        prg_ram_size: rom[0x8],
        flags_9: rom[0x9],
        flags_10: rom[0xA],
    })
}
