// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, LittleEndian};
use crate::nes::cpu::Registers;
use crate::nes::opcode::{decode_opcode, AddressingMode, Mnemonic, Opcode};
use crate::utils::arithmetic;

/// Operand decoded from the bytes following the opcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    Value(u8),
    Address(u16),
    Displacement(i8),
}

/// All 6502 instructions are a maximum size of 3 bytes. The first byte is the
/// opcode which is determines the action of the instruction. The following 2
/// bytes are the arguments and are present depending on the opcode.
///
/// Decoding works on raw bytes only. Nothing here reads from or writes to the
/// emulator, so any window of memory can be listed without disturbing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    bytes: [u8; 3],
    pub opcode: Option<Opcode>,
    pub length: u16,
    pub operand: Operand,
}

impl Instruction {
    /// The decoder will store all bytes in the instruction regardless if they
    /// are needed or not. Bytes that aren't a known opcode decode to a one byte
    /// instruction without an opcode.
    pub fn decode(b1: u8, b2: u8, b3: u8) -> Instruction {
        let opcode = decode_opcode(b1);
        let mode = opcode.map(|opcode| opcode.addressing_mode());

        let operand = match mode {
            None | Some(AddressingMode::Implied) | Some(AddressingMode::Accumulator) =>
                Operand::None,
            Some(AddressingMode::Relative) =>
                Operand::Displacement(b2 as i8),
            Some(AddressingMode::Immediate) =>
                Operand::Value(b2),
            Some(AddressingMode::Absolute) | Some(AddressingMode::AbsoluteX) |
            Some(AddressingMode::AbsoluteY) | Some(AddressingMode::Indirect) =>
                Operand::Address(LittleEndian::read_u16(&[b2, b3])),
            Some(_) =>
                Operand::Address(b2 as u16),
        };

        Instruction {
            bytes: [b1, b2, b3],
            opcode: opcode,
            length: opcode.map_or(1, |opcode| opcode.len()),
            operand: operand,
        }
    }

    pub fn mnemonic(&self) -> Option<Mnemonic> {
        self.opcode.map(|opcode| opcode.mnemonic())
    }

    pub fn addressing_mode(&self) -> Option<AddressingMode> {
        self.opcode.map(|opcode| opcode.addressing_mode())
    }

    /// The bytes that make up the instruction (1 to 3 of them).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.length as usize]
    }

    /// Renders the instruction in assembler syntax. `pc` is the address the
    /// opcode was fetched from and is only used to resolve branch targets.
    pub fn disassemble(&self, pc: u16) -> String {
        let (opcode, mnemonic) = match (self.opcode, self.mnemonic()) {
            (Some(opcode), Some(mnemonic)) => (opcode, mnemonic),
            _ => return format!(".byte ${:02X}", self.bytes[0]),
        };

        let value = match self.operand {
            Operand::Value(value) => value as u16,
            Operand::Address(addr) => addr,
            Operand::Displacement(_) | Operand::None => 0,
        };

        match opcode.addressing_mode() {
            AddressingMode::Implied => format!("{}", mnemonic),
            AddressingMode::Accumulator => format!("{} A", mnemonic),
            AddressingMode::Immediate => format!("{} #${:02X}", mnemonic, value),
            AddressingMode::ZeroPage => format!("{} ${:02X}", mnemonic, value),
            AddressingMode::ZeroPageX => format!("{} ${:02X},X", mnemonic, value),
            AddressingMode::ZeroPageY => format!("{} ${:02X},Y", mnemonic, value),
            AddressingMode::Absolute => format!("{} ${:04X}", mnemonic, value),
            AddressingMode::AbsoluteX => format!("{} ${:04X},X", mnemonic, value),
            AddressingMode::AbsoluteY => format!("{} ${:04X},Y", mnemonic, value),
            AddressingMode::Indirect => format!("{} (${:04X})", mnemonic, value),
            AddressingMode::IndexedIndirect => format!("{} (${:02X},X)", mnemonic, value),
            AddressingMode::IndirectIndexed => format!("{} (${:02X}),Y", mnemonic, value),
            AddressingMode::Relative => {
                let displacement = match self.operand {
                    Operand::Displacement(displacement) => displacement,
                    _ => 0,
                };
                let next = pc.wrapping_add(self.length);
                format!("{} ${:04X}", mnemonic, arithmetic::add_relative(next, displacement))
            },
        }
    }

    /// Formats the instruction bytes the way Nintendulator does, padded so the
    /// column is always 8 characters wide.
    pub fn hex_bytes(&self) -> String {
        let hex: Vec<String> = self.bytes().iter().map(|b| format!("{:02X}", b)).collect();
        format!("{:8}", hex.join(" "))
    }

    /// Produces a Nintendulator style log line for the instruction about to be
    /// executed at `pc` with the given register state.
    pub fn trace(&self, pc: u16, registers: &Registers) -> String {
        format!("{:04X}  {}  {:32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                pc, self.hex_bytes(), self.disassemble(pc),
                registers.a, registers.x, registers.y, registers.p, registers.sp)
    }
}

/// Decodes `count` consecutive instructions starting at `start`, fetching
/// bytes through `fetch`. Each entry holds the address the instruction starts
/// at. Addresses wrap at the top of memory.
pub fn listing<F>(start: u16, count: usize, fetch: F) -> Vec<(u16, Instruction)> where F: Fn(u16) -> u8 {
    let mut pc = start;
    let mut lines = Vec::with_capacity(count);
    for _ in 0..count {
        let instr = Instruction::decode(fetch(pc), fetch(pc.wrapping_add(1)),
                                        fetch(pc.wrapping_add(2)));
        let length = instr.length;
        lines.push((pc, instr));
        pc = pc.wrapping_add(length);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disasm(b1: u8, b2: u8, b3: u8, pc: u16) -> String {
        Instruction::decode(b1, b2, b3).disassemble(pc)
    }

    #[test]
    fn operand_syntax_per_addressing_mode() {
        assert_eq!(disasm(0xEA, 0, 0, 0), "NOP");
        assert_eq!(disasm(0x0A, 0, 0, 0), "ASL A");
        assert_eq!(disasm(0xA9, 0x10, 0, 0), "LDA #$10");
        assert_eq!(disasm(0xA5, 0x10, 0, 0), "LDA $10");
        assert_eq!(disasm(0xB5, 0x10, 0, 0), "LDA $10,X");
        assert_eq!(disasm(0xB6, 0x10, 0, 0), "LDX $10,Y");
        assert_eq!(disasm(0x4C, 0xF5, 0xC5, 0), "JMP $C5F5");
        assert_eq!(disasm(0xBD, 0x00, 0x04, 0), "LDA $0400,X");
        assert_eq!(disasm(0x99, 0x00, 0x03, 0), "STA $0300,Y");
        assert_eq!(disasm(0x6C, 0xFF, 0x02, 0), "JMP ($02FF)");
        assert_eq!(disasm(0xA1, 0x80, 0, 0), "LDA ($80,X)");
        assert_eq!(disasm(0x91, 0x80, 0, 0), "STA ($80),Y");
    }

    #[test]
    fn branches_render_absolute_target() {
        assert_eq!(disasm(0xD0, 0x04, 0, 0xC000), "BNE $C006");
        assert_eq!(disasm(0xF0, 0xFC, 0, 0xC000), "BEQ $BFFE");
    }

    #[test]
    fn unknown_bytes_are_one_byte_data() {
        let instr = Instruction::decode(0x02, 0xA9, 0x00);
        assert_eq!(instr.length, 1);
        assert_eq!(instr.mnemonic(), None);
        assert_eq!(instr.disassemble(0x8000), ".byte $02");
    }

    #[test]
    fn length_and_operand_come_from_the_table() {
        let instr = Instruction::decode(0x8D, 0x00, 0x20);
        assert_eq!(instr.length, 3);
        assert_eq!(instr.bytes(), &[0x8D, 0x00, 0x20]);
        assert_eq!(instr.operand, Operand::Address(0x2000));
        assert_eq!(instr.addressing_mode(), Some(AddressingMode::Absolute));
    }

    #[test]
    fn trace_matches_nintendulator_columns() {
        let registers = Registers { pc: 0xC000, sp: 0xFD, a: 0, x: 0, y: 0, p: 0x24 };
        let line = Instruction::decode(0x4C, 0xF5, 0xC5).trace(0xC000, &registers);
        assert_eq!(line, "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD");

        let line = Instruction::decode(0xA2, 0x00, 0x00).trace(0xC5F5, &registers);
        assert_eq!(&line[..30], "C5F5  A2 00     LDX #$00      ");
        assert_eq!(&line[48..], "A:00 X:00 Y:00 P:24 SP:FD");
    }

    #[test]
    fn listing_walks_instruction_lengths() {
        let program = [0xA9, 0x01, 0x8D, 0x00, 0x02, 0xEA];
        let lines = listing(0x0000, 3, |addr| *program.get(addr as usize).unwrap_or(&0));
        let addresses: Vec<u16> = lines.iter().map(|&(addr, _)| addr).collect();
        assert_eq!(addresses, vec![0x0000, 0x0002, 0x0005]);
        assert_eq!(lines[1].1.disassemble(lines[1].0), "STA $0200");
    }
}
