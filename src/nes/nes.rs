// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::binutils::{self, INESHeader, INES_HEADER_SIZE};
use crate::io::errors::{NESError, RomError};
use crate::io::log;
use crate::nes::cpu::{CPU, Registers};
use crate::nes::frame::CPUFrame;
use crate::nes::instruction::{self, Instruction};
use crate::nes::memory::{Memory, NMI_VECTOR, PRG_ROM_SIZE, RESET_VECTOR};
use crate::nes::ppu::{PPURegisters, Sprite, NB_SPRITES};
use crate::nes::ppu_memory::PATTERN_TABLE_SIZE;
use std::io::BufRead;
use std::path::Path;

// Trainers sit between the header and PRG-ROM when flag 6 says so.
const TRAINER_SIZE: usize = 512;

/// Options passed from the command-line that influence how the emulator
/// behaves and how much of it is reported.
#[derive(Clone, Debug, Default)]
pub struct NESRuntimeOptions {
    // Print log lines from every component.
    pub verbose: bool,

    // Print a Nintendulator style line before each instruction.
    pub trace: bool,

    // Run under the interactive debugger.
    pub debug: bool,
}

/// The whole machine. The NES owns the CPU and the memory bus, the bus owns
/// the PPU and the PPU owns picture memory. External drivers (the debugger,
/// the command-line runner, tests) only go through this type.
pub struct NES {
    pub runtime_options: NESRuntimeOptions,
    pub cpu: CPU,
    pub memory: Memory,
    header: Option<INESHeader>,

    // This will contain a Nintendulator log if the emulator is in testing
    // mode. Each step compares against the next line of it.
    execution_log: Option<Box<dyn BufRead>>,
}

impl NES {
    pub fn new(runtime_options: NESRuntimeOptions) -> NES {
        NES {
            memory: Memory::new(runtime_options.clone()),
            runtime_options: runtime_options,
            cpu: CPU::new(),
            header: None,
            execution_log: None,
        }
    }

    /// Reads a rom from disk and loads it.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RomError> {
        let rom = binutils::read_bin(path)?;
        self.load_rom_bytes(&rom)
    }

    /// Loads an iNES image. PRG-ROM is copied into both banks from the same
    /// 16KB region right after the header (and trainer), CHR-ROM goes to the
    /// pattern tables, then the program counter is pointed at the reset
    /// vector.
    pub fn load_rom_bytes(&mut self, rom: &[u8]) -> Result<(), RomError> {
        let header = binutils::parse_rom_header(rom)?;
        if !header.is_ines() {
            log::log("nes", "Rom has no iNES identifier, loading anyway", &self.runtime_options);
        }
        log::log("nes", format!("{}", header), &self.runtime_options);

        // An offset is used when copying from the rom as the presence of a
        // trainer will shift the locations of other structures.
        let mut offset = INES_HEADER_SIZE;
        if header.has_trainer() {
            log::log("nes", "Trainer data found, skipping it", &self.runtime_options);
            offset += TRAINER_SIZE;
        }

        let prg = NES::section(rom, offset, PRG_ROM_SIZE);
        self.memory.load_prg_rom(prg, prg);

        let chr = NES::section(rom, offset + PRG_ROM_SIZE, PATTERN_TABLE_SIZE * 2);
        self.memory.ppu.memory.load_pattern_tables(chr);

        self.cpu.pc = self.reset_vector();
        log::log("nes", format!("Loaded {} bytes of PRG-ROM and {} bytes of CHR-ROM, reset at ${:04X}",
                                prg.len(), chr.len(), self.cpu.pc), &self.runtime_options);

        self.header = Some(header);
        Ok(())
    }

    /// Returns up to `len` bytes of the rom starting at `start`.
    fn section(rom: &[u8], start: usize, len: usize) -> &[u8] {
        let start = start.min(rom.len());
        let end = (start + len).min(rom.len());
        &rom[start..end]
    }

    /// Save the passed execution log which will be used to compare the CPU's
    /// execution to the passed Nintendulator log.
    pub fn begin_testing<R: BufRead + 'static>(&mut self, log: R) {
        self.execution_log = Some(Box::new(log));
    }

    /// Executes a single instruction. Pending interrupts are serviced first,
    /// then the instruction is traced and compared against the execution log
    /// (when there is one) before it runs.
    pub fn step(&mut self) -> Result<(), NESError> {
        self.memory.clear_access_log();
        self.cpu.poll_nmi(&mut self.memory);

        if self.runtime_options.trace || self.execution_log.is_some() {
            let pc = self.cpu.pc;
            let line = self.instruction_at(pc).trace(pc, &self.cpu.registers());
            if self.runtime_options.trace {
                println!("{}", line);
            }
            self.compare_with_log(&line)?;
        }

        self.cpu.execute_instruction(&mut self.memory)?;
        Ok(())
    }

    /// Runs until an error occurs or `limit` instructions have executed.
    /// Returns the number of instructions executed.
    pub fn run(&mut self, limit: Option<u64>) -> Result<u64, NESError> {
        let mut executed = 0;
        while limit.map_or(true, |limit| executed < limit) {
            self.step()?;
            executed += 1;
        }
        Ok(executed)
    }

    fn compare_with_log(&mut self, line: &str) -> Result<(), NESError> {
        let execution_log = match self.execution_log {
            Some(ref mut execution_log) => execution_log,
            None => return Ok(()),
        };

        let mut log_line = String::new();
        if execution_log.read_line(&mut log_line)? == 0 {
            return Err(NESError::LogExhausted);
        }

        let matches = match (CPUFrame::parse(line), CPUFrame::parse(&log_line)) {
            (Ok(emulator), Ok(expected)) => emulator == expected,
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(NESError::LogMismatch {
                emulator: String::from(line),
                log: String::from(log_line.trim_end()),
            })
        }
    }

    /// Asks for a non-maskable interrupt. It is taken at the next instruction
    /// boundary where the PPU has NMI generation enabled.
    pub fn trigger_nmi(&mut self) {
        self.cpu.nmi_pending = true;
    }

    pub fn nmi_pending(&self) -> bool {
        self.cpu.nmi_pending
    }

    /// Reads a byte the way the CPU would, side effects included.
    pub fn read_u8(&mut self, addr: u16) -> u8 {
        self.memory.read_u8(addr)
    }

    /// Writes a byte the way the CPU would, side effects included.
    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.memory.write_u8(addr, val);
    }

    pub fn peek_u8(&self, addr: u16) -> u8 {
        self.memory.peek_u8(addr)
    }

    pub fn memory_window(&self, start: u16, len: usize) -> Vec<u8> {
        self.memory.window(start, len)
    }

    /// Copies `len` bytes of picture memory starting at `start`.
    pub fn vram_window(&self, start: u16, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.memory.ppu.memory.read(start.wrapping_add(i as u16))).collect()
    }

    pub fn registers(&self) -> Registers {
        self.cpu.registers()
    }

    pub fn ppu_registers(&self) -> PPURegisters {
        self.memory.ppu.registers()
    }

    pub fn sprites(&self) -> Vec<Sprite> {
        (0..NB_SPRITES).map(|i| self.memory.ppu.sprite(i)).collect()
    }

    pub fn reset_vector(&self) -> u16 {
        self.memory.peek_u16(RESET_VECTOR)
    }

    pub fn nmi_vector(&self) -> u16 {
        self.memory.peek_u16(NMI_VECTOR)
    }

    /// Decodes the instruction at `addr` without side effects.
    pub fn instruction_at(&self, addr: u16) -> Instruction {
        Instruction::decode(self.memory.peek_u8(addr),
                            self.memory.peek_u8(addr.wrapping_add(1)),
                            self.memory.peek_u8(addr.wrapping_add(2)))
    }

    /// Lists `count` instructions starting at `start`. Each line is the
    /// address followed by the disassembled instruction.
    pub fn disassemble(&self, start: u16, count: usize) -> Vec<(u16, String)> {
        instruction::listing(start, count, |addr| self.memory.peek_u8(addr))
            .into_iter()
            .map(|(addr, instr)| (addr, instr.disassemble(addr)))
            .collect()
    }

    /// Header of the loaded rom, if any.
    pub fn header(&self) -> Option<&INESHeader> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::errors::CPUError;
    use std::io::Cursor;

    /// Builds an iNES image with one PRG bank holding `program` at $8000 (and
    /// its mirror at $C000) and the reset vector pointing at it.
    fn rom_with_program(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0x4E, 0x45, 0x53, 0x1A, 1, 1, 0, 0];
        rom.extend_from_slice(&[0; 8]);
        let mut prg = vec![0u8; PRG_ROM_SIZE];
        prg[..program.len()].copy_from_slice(program);
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        rom.extend_from_slice(&prg);
        rom.extend_from_slice(&[0; PATTERN_TABLE_SIZE * 2]);
        rom
    }

    fn nes_with_program(program: &[u8]) -> NES {
        let mut nes = NES::new(NESRuntimeOptions::default());
        nes.load_rom_bytes(&rom_with_program(program)).unwrap();
        nes
    }

    #[test]
    fn load_sets_pc_from_reset_vector() {
        let nes = nes_with_program(&[0xEA]);
        assert_eq!(nes.registers().pc, 0xC000);
        assert_eq!(nes.reset_vector(), 0xC000);
        assert_eq!(nes.peek_u8(0x8000), 0xEA);
        assert_eq!(nes.peek_u8(0xC000), 0xEA);
        assert_eq!(nes.header().map(|h| h.prg_rom_size), Some(1));
    }

    #[test]
    fn short_rom_is_rejected() {
        let mut nes = NES::new(NESRuntimeOptions::default());
        match nes.load_rom_bytes(&[0x4E, 0x45]) {
            Err(RomError::TooShort(2)) => {},
            other => panic!("unexpected result {:?}", other),
        }
        assert!(nes.header().is_none());
    }

    #[test]
    fn run_stops_at_illegal_opcode() {
        let mut nes = nes_with_program(&[0xE8, 0xE8, 0x02]);
        match nes.run(None) {
            Err(NESError::CPU(CPUError::IllegalOpcode(0x02))) => {},
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(nes.registers().x, 2);
        assert_eq!(nes.registers().pc, 0xC003);
    }

    #[test]
    fn run_honours_limit() {
        let mut nes = nes_with_program(&[0xE8; 16]);
        assert_eq!(nes.run(Some(5)).unwrap(), 5);
        assert_eq!(nes.registers().x, 5);
    }

    #[test]
    fn step_clears_access_log() {
        let mut nes = nes_with_program(&[0x8D, 0x00, 0x03, 0xEA]);
        nes.step().unwrap();
        assert_eq!(nes.memory.last_write_address(), Some(0x0300));
        nes.step().unwrap();
        assert_eq!(nes.memory.last_write_address(), None);
        assert_eq!(nes.memory.last_read_address(), Some(0xC003));
    }

    #[test]
    fn matching_log_passes_and_exhausts() {
        let mut nes = nes_with_program(&[0xA2, 0x05, 0xEA]);
        let log = "C000  A2 05     LDX #$05                        A:00 X:00 Y:00 P:24 SP:FD\n\
                   C002  EA        NOP                             A:00 X:05 Y:00 P:24 SP:FD\n";
        nes.begin_testing(Cursor::new(log.as_bytes().to_vec()));
        nes.step().unwrap();
        nes.step().unwrap();
        match nes.step() {
            Err(NESError::LogExhausted) => {},
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn mismatched_log_is_reported() {
        let mut nes = nes_with_program(&[0xEA]);
        let log = "C000  EA        NOP                             A:01 X:00 Y:00 P:24 SP:FD\n";
        nes.begin_testing(Cursor::new(log.as_bytes().to_vec()));
        match nes.step() {
            Err(NESError::LogMismatch { ref emulator, ref log }) => {
                assert!(emulator.ends_with("A:00 X:00 Y:00 P:24 SP:FD"));
                assert!(log.ends_with("A:01 X:00 Y:00 P:24 SP:FD"));
            },
            other => panic!("unexpected result {:?}", other),
        }
        // The mismatching instruction was not executed.
        assert_eq!(nes.registers().pc, 0xC000);
    }

    #[test]
    fn disassemble_lists_from_memory() {
        let nes = nes_with_program(&[0xA9, 0x01, 0x4C, 0x00, 0xC0]);
        let lines = nes.disassemble(0xC000, 2);
        assert_eq!(lines, vec![(0xC000, String::from("LDA #$01")),
                               (0xC002, String::from("JMP $C000"))]);
    }

    #[test]
    fn vram_window_reads_picture_memory() {
        let mut nes = nes_with_program(&[]);
        nes.memory.ppu.memory.write(0x3F00, 0x0F);
        nes.memory.ppu.memory.write(0x3F01, 0x30);
        assert_eq!(nes.vram_window(0x3EFF, 3), vec![0, 0x0F, 0x30]);
    }

    #[test]
    fn sprites_cover_all_of_oam() {
        let nes = nes_with_program(&[]);
        assert_eq!(nes.sprites().len(), NB_SPRITES);
    }
}
