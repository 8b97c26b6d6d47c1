// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// Memory partition sizes (physical).
pub const PATTERN_TABLE_SIZE: usize = 0x1000;
pub const NAME_TABLES_SIZE  : usize = 0x1000;
pub const PALETTES_SIZE     : usize = 0x0100;
pub const PALETTE_SIZE      : usize = 0x0010;

// Partitioned virtual memory map bounds. Each partition runs up to the start
// of the next one.
pub const PATTERN_TABLE_0: u16 = 0x0000;
pub const PATTERN_TABLE_1: u16 = 0x1000;
pub const NAME_TABLE_0   : u16 = 0x2000;
pub const NAME_TABLE_1   : u16 = 0x2400;
pub const NAME_TABLE_2   : u16 = 0x2800;
pub const NAME_TABLE_3   : u16 = 0x2C00;
pub const IMAGE_PALETTE  : u16 = 0x3F00;
pub const SPRITE_PALETTE : u16 = 0x3F10;

// The PPU only decodes 14 address lines; anything above $3FFF mirrors below it.
const ADDRESS_MASK: u16 = 0x3FFF;

/// Picture memory as seen by the PPU. Pattern tables hold CHR-ROM and are
/// read-only once a rom is loaded, name tables and palettes are writable
/// through the PPU data port.
pub struct PPUMemory {
    // The PPU has 2 pattern tables which store 8x8 pixel tiles which can be
    // drawn to the screen.
    pattern_table_0: [u8; PATTERN_TABLE_SIZE],
    pattern_table_1: [u8; PATTERN_TABLE_SIZE],

    // The name tables are matrices of numbers that point to tiles stored in the
    // pattern tables. Each name table has an associated attribute table, which
    // contains the upper 2 bits of colors for each of the associated tiles.
    // $3000-$3EFF mirrors this region.
    name_tables: [u8; NAME_TABLES_SIZE],

    // The image palette followed by the sprite palette, each 16 entries
    // selected from the PPU total selection of 52 colors. The rest of the
    // region is kept so every address below $4000 has a backing byte.
    palettes: [u8; PALETTES_SIZE],
}

impl PPUMemory {
    pub fn new() -> PPUMemory {
        PPUMemory {
            pattern_table_0: [0; PATTERN_TABLE_SIZE],
            pattern_table_1: [0; PATTERN_TABLE_SIZE],
            name_tables: [0; NAME_TABLES_SIZE],
            palettes: [0; PALETTES_SIZE],
        }
    }

    /// Reads a byte from the PPU address space.
    pub fn read(&self, addr: u16) -> u8 {
        let addr = addr & ADDRESS_MASK;
        if addr >= IMAGE_PALETTE {
            self.palettes[(addr - IMAGE_PALETTE) as usize]
        } else if addr >= NAME_TABLE_0 {
            self.name_tables[(addr - NAME_TABLE_0) as usize % NAME_TABLES_SIZE]
        } else if addr >= PATTERN_TABLE_1 {
            self.pattern_table_1[(addr - PATTERN_TABLE_1) as usize]
        } else {
            self.pattern_table_0[addr as usize]
        }
    }

    /// Writes a byte to the PPU address space. Returns false if the address
    /// falls inside of the pattern tables, which are ROM and keep their value.
    pub fn write(&mut self, addr: u16, val: u8) -> bool {
        let addr = addr & ADDRESS_MASK;
        if addr >= IMAGE_PALETTE {
            self.palettes[(addr - IMAGE_PALETTE) as usize] = val;
        } else if addr >= NAME_TABLE_0 {
            self.name_tables[(addr - NAME_TABLE_0) as usize % NAME_TABLES_SIZE] = val;
        } else {
            return false;
        }
        true
    }

    /// Copies CHR data into the pattern tables. The first 4 KiB lands in
    /// pattern table 0 and the next 4 KiB in pattern table 1; a short slice
    /// leaves the remaining bytes untouched.
    pub fn load_pattern_tables(&mut self, chr: &[u8]) {
        let (first, second) = chr.split_at(chr.len().min(PATTERN_TABLE_SIZE));
        self.pattern_table_0[..first.len()].copy_from_slice(first);

        let second = &second[..second.len().min(PATTERN_TABLE_SIZE)];
        self.pattern_table_1[..second.len()].copy_from_slice(second);
    }

    /// Returns one of the two pattern tables.
    pub fn pattern_table(&self, index: usize) -> &[u8] {
        if index == 0 { &self.pattern_table_0 } else { &self.pattern_table_1 }
    }

    pub fn image_palette(&self) -> &[u8] {
        &self.palettes[..PALETTE_SIZE]
    }

    pub fn sprite_palette(&self) -> &[u8] {
        let start = (SPRITE_PALETTE - IMAGE_PALETTE) as usize;
        &self.palettes[start..start + PALETTE_SIZE]
    }
}

impl Default for PPUMemory {
    fn default() -> PPUMemory {
        PPUMemory::new()
    }
}
