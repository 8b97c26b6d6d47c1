// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, LittleEndian};
use crate::io::log;
use crate::nes::cpu::CPU;
use crate::nes::nes::NESRuntimeOptions;
use crate::nes::ppu::{self, PPU, SPR_RAM_SIZE};
use crate::utils::paging;

// Memory partition sizes (physical).
pub const RAM_SIZE    : usize = 0x800;
pub const PRG_ROM_SIZE: usize = 0x4000;

// Partitioned virtual memory map bounds.
pub const RAM_START_ADDR      : u16 = 0x0;
pub const RAM_END_ADDR        : u16 = 0x7FF;
pub const RAM_MIRROR_END      : u16 = 0x1FFF;
pub const IO_REGISTERS_START  : u16 = 0x2000;
pub const IO_REGISTERS_END    : u16 = 0x401F;
pub const SPRITE_DMA_REGISTER : u16 = 0x4014;
pub const EXPANSION_ROM_START : u16 = 0x4020;
pub const SRAM_END            : u16 = 0x7FFF;
pub const PRG_ROM_1_START     : u16 = 0x8000;
pub const PRG_ROM_1_END       : u16 = 0xBFFF;
pub const PRG_ROM_2_START     : u16 = 0xC000;
pub const PRG_ROM_2_END       : u16 = 0xFFFF;

// Interrupt vectors at the top of PRG-ROM bank 2.
pub const NMI_VECTOR  : u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;

// Location of the first byte on the bottom of the stack. The stack starts on
// memory page 2 (0x100).
const STACK_OFFSET: u16 = 0x100;

/// Partitioned physical memory layout for CPU memory. These fields are not
/// meant to be accessed directly by the CPU implementation and are instead
/// accessed through read and write functions that handle memory mapping.
///
/// Every read and write records its address so breakpoint logic outside of
/// the emulator can watch memory. The `peek` functions decode the same way
/// without recording anything or touching register side effects.
pub struct Memory {
    runtime_options: NESRuntimeOptions,

    // 2kB of internal RAM for which it's use is entirely up to the programmer.
    // $0800-$1FFF mirrors it.
    ram: [u8; RAM_SIZE],

    // The PPU sits behind the I/O registers and owns picture memory.
    pub ppu: PPU,

    // PRG-ROM bank 1.
    prg_rom_1: [u8; PRG_ROM_SIZE],

    // PRG-ROM bank 2. Holds the interrupt vectors.
    prg_rom_2: [u8; PRG_ROM_SIZE],

    last_read_address: Option<u16>,
    last_write_address: Option<u16>,
}

impl Memory {
    pub fn new(runtime_options: NESRuntimeOptions) -> Memory {
        Memory {
            ppu: PPU::new(runtime_options.clone()),
            runtime_options: runtime_options,
            ram: [0; RAM_SIZE],
            prg_rom_1: [0; PRG_ROM_SIZE],
            prg_rom_2: [0; PRG_ROM_SIZE],
            last_read_address: None,
            last_write_address: None,
        }
    }

    /// Reads an unsigned 8-bit byte value located at the given virtual address.
    pub fn read_u8(&mut self, addr: u16) -> u8 {
        self.last_read_address = Some(addr);
        match addr {
            IO_REGISTERS_START..=IO_REGISTERS_END => self.read_io(addr),
            EXPANSION_ROM_START..=SRAM_END => {
                log::log("memory", format!("Expansion ROM / SRAM, memory read at ${:04X}", addr),
                         &self.runtime_options);
                0
            },
            _ => self.peek_u8(addr),
        }
    }

    /// Reads the byte at the given virtual address without side effects.
    pub fn peek_u8(&self, addr: u16) -> u8 {
        match addr {
            RAM_START_ADDR..=RAM_MIRROR_END =>
                self.ram[addr as usize % RAM_SIZE],
            IO_REGISTERS_START..=IO_REGISTERS_END =>
                if addr == ppu::PPU_STATUS_REGISTER { self.ppu.status_register } else { 0 },
            EXPANSION_ROM_START..=SRAM_END =>
                0,
            PRG_ROM_1_START..=PRG_ROM_1_END =>
                self.prg_rom_1[(addr - PRG_ROM_1_START) as usize],
            PRG_ROM_2_START..=PRG_ROM_2_END =>
                self.prg_rom_2[(addr - PRG_ROM_2_START) as usize],
        }
    }

    /// Writes an unsigned 8-bit byte value to the given virtual address.
    /// Writes to expansion ROM, SRAM and PRG-ROM are dropped.
    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.last_write_address = Some(addr);
        match addr {
            RAM_START_ADDR..=RAM_MIRROR_END =>
                self.ram[addr as usize % RAM_SIZE] = val,
            IO_REGISTERS_START..=IO_REGISTERS_END =>
                self.write_io(addr, val),
            _ =>
                log::log("memory", format!("Invalid write at ${:04X} = ${:02X}", addr, val),
                         &self.runtime_options),
        }
    }

    /// Reads an unsigned 16-bit value at the given virtual address
    /// (little-endian).
    pub fn read_u16(&mut self, addr: u16) -> u16 {
        let lsb = self.read_u8(addr);
        let msb = self.read_u8(addr.wrapping_add(1));
        LittleEndian::read_u16(&[lsb, msb])
    }

    /// Reads an unsigned 16-bit value from the zero page where the MSB is read
    /// from $00 when the LSB is at $FF. Indexed indirect and indirect indexed
    /// addressing fetch their pointers this way.
    pub fn read_u16_zero_page(&mut self, addr: u16) -> u16 {
        let lsb = self.read_u8(addr);
        let msb = self.read_u8(paging::next_in_zero_page(addr));
        LittleEndian::read_u16(&[lsb, msb])
    }

    /// Reads an unsigned 16-bit value at the given virtual address
    /// (little-endian) where the MSB is read at page start if the LSB is at
    /// the end of a page. This exists to properly emulate a hardware bug in the
    /// 2A03 where indirect jumps cannot fetch addresses outside it's own page.
    pub fn read_u16_wrapped_msb(&mut self, addr: u16) -> u16 {
        let lsb = self.read_u8(addr);
        let msb = self.read_u8(paging::next_in_page(addr));
        LittleEndian::read_u16(&[lsb, msb])
    }

    /// Reads an unsigned 16-bit value without side effects (little-endian).
    pub fn peek_u16(&self, addr: u16) -> u16 {
        LittleEndian::read_u16(&[self.peek_u8(addr), self.peek_u8(addr.wrapping_add(1))])
    }

    /// Dumps the contents of a slice starting at a given address.
    pub fn memdump(&mut self, addr: u16, buf: &[u8]) {
        for (i, &byte) in buf.iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u16), byte);
        }
    }

    /// Copies `len` bytes starting at `addr` without side effects. The window
    /// wraps around at the top of the address space.
    pub fn window(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.peek_u8(addr.wrapping_add(i as u16))).collect()
    }

    /// Replaces both PRG-ROM banks. Short slices leave the rest of a bank as
    /// it was.
    pub fn load_prg_rom(&mut self, lower: &[u8], upper: &[u8]) {
        let lower = &lower[..lower.len().min(PRG_ROM_SIZE)];
        let upper = &upper[..upper.len().min(PRG_ROM_SIZE)];
        self.prg_rom_1[..lower.len()].copy_from_slice(lower);
        self.prg_rom_2[..upper.len()].copy_from_slice(upper);
    }

    /// Address touched by the most recent read since the log was cleared.
    pub fn last_read_address(&self) -> Option<u16> {
        self.last_read_address
    }

    /// Address touched by the most recent write since the log was cleared.
    pub fn last_write_address(&self) -> Option<u16> {
        self.last_write_address
    }

    /// Forgets the recorded read and write addresses. Called before each
    /// instruction so watches only see the accesses of that instruction.
    pub fn clear_access_log(&mut self) {
        self.last_read_address = None;
        self.last_write_address = None;
    }

    // Utility functions for managing the stack.

    /// Pushes an 8-bit number onto the stack.
    pub fn stack_push_u8(&mut self, cpu: &mut CPU, value: u8) {
        self.write_u8(STACK_OFFSET + cpu.sp as u16, value);
        cpu.sp = cpu.sp.wrapping_sub(1);
    }

    /// Pops an 8-bit number off the stack.
    pub fn stack_pop_u8(&mut self, cpu: &mut CPU) -> u8 {
        cpu.sp = cpu.sp.wrapping_add(1);
        self.read_u8(STACK_OFFSET + cpu.sp as u16)
    }

    /// Pushes a 16-bit number (usually an address) onto the stack, high byte
    /// first so it reads back little-endian.
    pub fn stack_push_u16(&mut self, cpu: &mut CPU, value: u16) {
        self.stack_push_u8(cpu, (value >> 8) as u8);
        self.stack_push_u8(cpu, value as u8);
    }

    /// Pops a 16-bit number (usually an address) off the stack.
    pub fn stack_pop_u16(&mut self, cpu: &mut CPU) -> u16 {
        let lsb = self.stack_pop_u8(cpu);
        let msb = self.stack_pop_u8(cpu);
        LittleEndian::read_u16(&[lsb, msb])
    }

    /// Handles reads from the I/O register range. Only the PPU status and data
    /// ports are readable; everything else reads as 0.
    fn read_io(&mut self, addr: u16) -> u8 {
        match addr {
            ppu::PPU_STATUS_REGISTER => self.ppu.read_status(),
            ppu::PPU_DATA => self.ppu.read_data(),
            _ => 0,
        }
    }

    /// Handles writes to the I/O register range. Ports that aren't emulated
    /// (scroll, APU, controllers) swallow the value.
    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            ppu::PPU_CONTROL_REGISTER => self.ppu.control_register = val,
            ppu::PPU_MASK_REGISTER => self.ppu.mask_register = val,
            ppu::PPU_SPR_RAM_ADDRESS_REGISTER | ppu::PPU_SPR_RAM_IO_REGISTER =>
                self.ppu.write_oam_port(addr, val),
            ppu::PPU_ADDRESS => self.ppu.write_address(val),
            ppu::PPU_DATA => self.ppu.write_data(val),
            SPRITE_DMA_REGISTER => self.sprite_dma(val),
            _ => {},
        }
    }

    /// Copies page `page` ($XX00-$XXFF) into sprite attribute memory.
    fn sprite_dma(&mut self, page: u8) {
        log::log("memory", format!("Sprite DMA from ${:02X}00", page), &self.runtime_options);

        let start = (page as u16) << 8;
        let mut buffer = [0u8; SPR_RAM_SIZE];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.peek_u8(start.wrapping_add(i as u16));
        }
        self.ppu.sprite_dma(&buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nes::ppu::{PPU_ADDRESS, PPU_CONTROL_REGISTER, PPU_DATA, PPU_STATUS_REGISTER};

    fn memory() -> Memory {
        Memory::new(NESRuntimeOptions::default())
    }

    #[test]
    fn ram_round_trips_and_mirrors() {
        let mut memory = memory();
        memory.write_u8(0x0012, 0x34);
        assert_eq!(memory.read_u8(0x0012), 0x34);
        assert_eq!(memory.read_u8(0x0812), 0x34);
        assert_eq!(memory.read_u8(0x1812), 0x34);
        memory.write_u8(RAM_END_ADDR, 0x56);
        assert_eq!(memory.peek_u8(0x0FFF), 0x56);
    }

    #[test]
    fn prg_banks_map_to_upper_half() {
        let mut memory = memory();
        let mut lower = vec![0u8; PRG_ROM_SIZE];
        let mut upper = vec![0u8; PRG_ROM_SIZE];
        lower[0] = 0xAA;
        upper[PRG_ROM_SIZE - 1] = 0xBB;
        memory.load_prg_rom(&lower, &upper);
        assert_eq!(memory.read_u8(PRG_ROM_1_START), 0xAA);
        assert_eq!(memory.read_u8(PRG_ROM_2_END), 0xBB);

        // Rom is read-only.
        memory.write_u8(PRG_ROM_1_START, 0x00);
        assert_eq!(memory.read_u8(PRG_ROM_1_START), 0xAA);
    }

    #[test]
    fn expansion_and_sram_read_zero_and_drop_writes() {
        let mut memory = memory();
        memory.write_u8(0x6000, 0x12);
        assert_eq!(memory.read_u8(0x6000), 0);
        assert_eq!(memory.read_u8(EXPANSION_ROM_START), 0);
        assert_eq!(memory.last_write_address(), Some(0x6000));
    }

    #[test]
    fn every_access_is_recorded() {
        let mut memory = memory();
        assert_eq!(memory.last_read_address(), None);
        memory.read_u16(0x0010);
        // The second byte of the word read is the last one.
        assert_eq!(memory.last_read_address(), Some(0x0011));
        memory.read_u8(0x4017);
        assert_eq!(memory.last_read_address(), Some(0x4017));
        memory.write_u8(0xFFFF, 0);
        assert_eq!(memory.last_write_address(), Some(0xFFFF));

        memory.clear_access_log();
        assert_eq!(memory.last_read_address(), None);
        assert_eq!(memory.last_write_address(), None);
    }

    #[test]
    fn peeking_has_no_side_effects() {
        let mut memory = memory();
        memory.ppu.set_vblank(true);
        assert_eq!(memory.peek_u8(PPU_STATUS_REGISTER), 0x80);
        assert_eq!(memory.peek_u8(PPU_STATUS_REGISTER), 0x80);
        assert_eq!(memory.last_read_address(), None);
    }

    #[test]
    fn zero_page_word_wraps_within_zero_page() {
        let mut memory = memory();
        memory.write_u8(0x00FF, 0x34);
        memory.write_u8(0x0000, 0x12);
        memory.write_u8(0x0100, 0x99);
        assert_eq!(memory.read_u16_zero_page(0x00FF), 0x1234);
        assert_eq!(memory.read_u16(0x00FF), 0x9934);
    }

    #[test]
    fn wrapped_msb_stays_in_page() {
        let mut memory = memory();
        memory.write_u8(0x02FF, 0x00);
        memory.write_u8(0x0200, 0x80);
        memory.write_u8(0x0300, 0x90);
        assert_eq!(memory.read_u16_wrapped_msb(0x02FF), 0x8000);
        assert_eq!(memory.last_read_address(), Some(0x0200));
    }

    #[test]
    fn status_read_clears_vblank() {
        let mut memory = memory();
        memory.ppu.status_register = 0x80;
        assert_eq!(memory.read_u8(PPU_STATUS_REGISTER) & 0x80, 0x80);
        assert_eq!(memory.ppu.status_register & 0x80, 0);
        assert_eq!(memory.read_u8(PPU_STATUS_REGISTER) & 0x80, 0);
    }

    #[test]
    fn status_read_keeps_address_latch() {
        let mut memory = memory();
        memory.write_u8(PPU_ADDRESS, 0x21);
        memory.read_u8(PPU_STATUS_REGISTER);
        memory.write_u8(PPU_ADDRESS, 0x08);
        assert_eq!(memory.ppu.vram_address(), 0x2108);
    }

    #[test]
    fn data_port_reads_zero() {
        let mut memory = memory();
        memory.write_u8(PPU_ADDRESS, 0x20);
        memory.write_u8(PPU_ADDRESS, 0x00);
        memory.write_u8(PPU_DATA, 0x42);
        memory.write_u8(PPU_ADDRESS, 0x20);
        memory.write_u8(PPU_ADDRESS, 0x00);
        assert_eq!(memory.read_u8(PPU_DATA), 0);
        assert_eq!(memory.ppu.memory.read(0x2000), 0x42);
    }

    #[test]
    fn vram_pointer_protocol_through_ports() {
        let mut memory = memory();
        memory.write_u8(PPU_ADDRESS, 0xAB);
        memory.write_u8(PPU_ADDRESS, 0xCD);
        assert_eq!(memory.ppu.vram_address(), 0xABCD);
        memory.write_u8(PPU_DATA, 0x01);
        assert_eq!(memory.ppu.vram_address(), 0xABCE);
        memory.write_u8(PPU_DATA, 0x02);
        assert_eq!(memory.ppu.memory.read(0xABCD), 0x01);
        assert_eq!(memory.ppu.memory.read(0xABCE), 0x02);
    }

    #[test]
    fn control_and_mask_ports_store_directly() {
        let mut memory = memory();
        memory.write_u8(PPU_CONTROL_REGISTER, 0x80);
        memory.write_u8(ppu::PPU_MASK_REGISTER, 0x1E);
        assert_eq!(memory.ppu.control_register, 0x80);
        assert_eq!(memory.ppu.mask_register, 0x1E);
    }

    #[test]
    fn sprite_dma_copies_a_ram_page() {
        let mut memory = memory();
        for i in 0..256u16 {
            memory.write_u8(0x0200 + i, (i as u8).wrapping_mul(3));
        }
        memory.write_u8(SPRITE_DMA_REGISTER, 0x02);
        let expected: Vec<u8> = (0..256u16).map(|i| (i as u8).wrapping_mul(3)).collect();
        assert_eq!(memory.ppu.spr_ram(), &expected[..]);
    }

    #[test]
    fn stack_wraps_and_round_trips() {
        let mut memory = memory();
        let mut cpu = CPU::new();
        cpu.sp = 0x00;
        memory.stack_push_u8(&mut cpu, 0x42);
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(memory.peek_u8(0x0100), 0x42);
        assert_eq!(memory.stack_pop_u8(&mut cpu), 0x42);
        assert_eq!(cpu.sp, 0x00);

        cpu.sp = 0xFD;
        memory.stack_push_u16(&mut cpu, 0xC5F5);
        assert_eq!(memory.peek_u8(0x01FD), 0xC5);
        assert_eq!(memory.peek_u8(0x01FC), 0xF5);
        assert_eq!(memory.stack_pop_u16(&mut cpu), 0xC5F5);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn window_is_side_effect_free_copy() {
        let mut memory = memory();
        memory.memdump(0x0300, &[1, 2, 3]);
        memory.clear_access_log();
        assert_eq!(memory.window(0x02FF, 5), vec![0, 1, 2, 3, 0]);
        assert_eq!(memory.last_read_address(), None);
    }
}
