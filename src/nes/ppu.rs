// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::log;
use crate::nes::nes::NESRuntimeOptions;
use crate::nes::ppu_memory::PPUMemory;
use std::fmt;

// CPU-visible register ports.
pub const PPU_CONTROL_REGISTER        : u16 = 0x2000;
pub const PPU_MASK_REGISTER           : u16 = 0x2001;
pub const PPU_STATUS_REGISTER         : u16 = 0x2002;
pub const PPU_SPR_RAM_ADDRESS_REGISTER: u16 = 0x2003;
pub const PPU_SPR_RAM_IO_REGISTER     : u16 = 0x2004;
pub const PPU_ADDRESS                 : u16 = 0x2006;
pub const PPU_DATA                    : u16 = 0x2007;

pub const NB_SPRITES  : usize = 64;
pub const SPR_RAM_SIZE: usize = NB_SPRITES * 4;

/// Control register bit that lets vertical blank raise an NMI.
pub const CONTROL_NMI_ENABLE: u8 = 0x80;

/// Status register bit set while the PPU is in vertical blank.
pub const STATUS_VBLANK: u8 = 0x80;

/// This is the register side of the 2C02 PPU used in the NES. It owns picture
/// memory and exposes the control, mask and status registers, the VRAM
/// pointer that the CPU drives through the address and data ports, and the
/// sprite attribute buffer filled by DMA.
///
/// Nothing here draws pixels or counts scanlines; the status register only
/// changes when the CPU reads it or a caller sets vblank explicitly.
pub struct PPU {
    // The runtime options decide whether ignored register writes are logged.
    runtime_options: NESRuntimeOptions,

    pub memory: PPUMemory,

    // Where sprites are stored (different bus). 64 entries of Y, tile index,
    // attributes and X.
    spr_ram: [u8; SPR_RAM_SIZE],

    pub control_register: u8,
    pub mask_register: u8,
    pub status_register: u8,

    // The VRAM pointer is built from two writes to the address port, high
    // byte first. The flag is set once the high byte has been written and the
    // next write supplies the low byte.
    address: u16,
    address_write_low: bool,
}

/// Copy of the CPU-visible PPU state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PPURegisters {
    pub control: u8,
    pub mask: u8,
    pub status: u8,
    pub address: u16,
    pub address_write_low: bool,
}

/// One decoded entry of sprite attribute memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub y: u8,
    pub tile: u8,
    pub attributes: u8,
    pub x: u8,
}

impl PPU {
    pub fn new(runtime_options: NESRuntimeOptions) -> Self {
        PPU {
            runtime_options: runtime_options,
            memory: PPUMemory::new(),
            spr_ram: [0; SPR_RAM_SIZE],
            control_register: 0,
            mask_register: 0,
            status_register: 0,
            address: 0,
            address_write_low: false,
        }
    }

    /// Reads the status register. Reading clears the vblank bit, but the
    /// value returned still has vblank set if it was set before the read.
    /// The address latch is left alone.
    pub fn read_status(&mut self) -> u8 {
        let status = self.status_register;
        self.status_register &= !STATUS_VBLANK;
        status
    }

    /// Reads the data port. Buffered reads from picture memory are not
    /// emulated so this is always 0.
    pub fn read_data(&self) -> u8 {
        0
    }

    /// Feeds one byte of the two-write VRAM pointer protocol.
    pub fn write_address(&mut self, value: u8) {
        if self.address_write_low {
            self.address = (self.address & 0xFF00) | value as u16;
            self.address_write_low = false;
        } else {
            self.address = ((value as u16) << 8) | (self.address & 0x00FF);
            self.address_write_low = true;
        }
    }

    /// Writes to picture memory at the VRAM pointer and moves the pointer
    /// forward by one. The +32 increment selectable in the control register
    /// is not honored.
    pub fn write_data(&mut self, value: u8) {
        if !self.memory.write(self.address, value) {
            log::log("ppu", format!("Ignored write to pattern table ${:04X} = ${:02X}", self.address, value),
                     &self.runtime_options);
        }
        self.address = self.address.wrapping_add(1);
    }

    /// OAM address/data ports are decoded but do not reach sprite memory;
    /// sprite memory is only filled through DMA.
    pub fn write_oam_port(&mut self, port: u16, value: u8) {
        log::log("ppu", format!("I/O Registers, memory write at ${:04X} = ${:02X}", port, value),
                 &self.runtime_options);
    }

    /// Replaces sprite attribute memory with a 256 byte page copied by DMA.
    pub fn sprite_dma(&mut self, page: &[u8; SPR_RAM_SIZE]) {
        self.spr_ram.copy_from_slice(page);
    }

    /// True when the control register lets vblank raise an NMI.
    #[inline(always)]
    pub fn nmi_enabled(&self) -> bool {
        self.control_register & CONTROL_NMI_ENABLE == CONTROL_NMI_ENABLE
    }

    /// Sets or clears the vblank bit. Used by whatever stands in for the
    /// frame timing, as the PPU itself never advances.
    pub fn set_vblank(&mut self, vblank: bool) {
        if vblank {
            self.status_register |= STATUS_VBLANK;
        } else {
            self.status_register &= !STATUS_VBLANK;
        }
    }

    /// Current value of the VRAM pointer.
    pub fn vram_address(&self) -> u16 {
        self.address
    }

    pub fn spr_ram(&self) -> &[u8] {
        &self.spr_ram
    }

    /// Decodes sprite `index` (0-63) from sprite attribute memory.
    pub fn sprite(&self, index: usize) -> Sprite {
        let offset = (index % NB_SPRITES) * 4;
        Sprite {
            y: self.spr_ram[offset],
            tile: self.spr_ram[offset + 1],
            attributes: self.spr_ram[offset + 2],
            x: self.spr_ram[offset + 3],
        }
    }

    pub fn registers(&self) -> PPURegisters {
        PPURegisters {
            control: self.control_register,
            mask: self.mask_register,
            status: self.status_register,
            address: self.address,
            address_write_low: self.address_write_low,
        }
    }
}

impl fmt::Display for PPURegisters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Control: {:02X}", self.control)?;
        writeln!(f, "Mask:    {:02X}", self.mask)?;
        writeln!(f, "Status:  {:02X}", self.status)?;
        write!(f, "Address: {:04X} (next write: {})", self.address,
               if self.address_write_low { "low" } else { "high" })
    }
}

impl fmt::Display for Sprite {
    // Sprite data is delayed by one scanline, so the drawn Y is one more
    // than the stored value.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tile {:3} X: {:3} Y: {:3} Attr: {:02X}",
               self.tile, self.x, self.y as u16 + 1, self.attributes)
    }
}
