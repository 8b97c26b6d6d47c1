// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::CPUError;
use crate::nes::memory::{Memory, NMI_VECTOR};
use crate::nes::opcode::{decode_opcode, AddressingMode, Mnemonic};
use crate::utils::arithmetic;
use std::fmt;

// Flag constants that allow easy bitwise getting and setting of flag values.
pub const CARRY_FLAG       : u8 = 0x1;
pub const ZERO_FLAG        : u8 = 0x2;
pub const INTERRUPT_DISABLE: u8 = 0x4;
pub const DECIMAL_MODE     : u8 = 0x8;
pub const BREAK_COMMAND    : u8 = 0x10;
pub const UNUSED_FLAG      : u8 = 0x20;
pub const OVERFLOW_FLAG    : u8 = 0x40;
pub const NEGATIVE_FLAG    : u8 = 0x80;

// Bits of the status register that only exist on the stack copy. Pulls keep
// whatever the live register already has in them.
const STACK_ONLY_FLAGS: u8 = BREAK_COMMAND | UNUSED_FLAG;

/// This is an implementation of 2A03 processor used in the NES. The 2A03 is
/// based off the 6502 processor with some minor changes such as having no
/// binary-coded decimal mode.
///
/// The CPU owns nothing but its registers. Every instruction borrows the
/// memory bus for the duration of the call, which is the only way the CPU
/// reaches RAM, ROM or the PPU.
pub struct CPU {
    // Points to the next instruction to be executed. Jumps, branches,
    // subroutine calls, returns and interrupts modify it directly; everything
    // else advances it past the bytes it consumed. Wraps at $FFFF.
    pub pc: u16,

    // Holds the next free location on the stack page ($0100-$01FF). The stack
    // grows downwards and the pointer wraps around inside the page.
    pub sp: u8,

    // The accumulator used by all arithmetic and logical operations (with the
    // exception of increments and decrements).
    pub a: u8,

    // Index register X. Besides indexing, it is the only register that can
    // copy the stack pointer in or out.
    pub x: u8,

    // Index register Y.
    pub y: u8,

    // The processor status register. Each bit is one of the *_FLAG constants
    // above. Decimal mode is stored but arithmetic is always binary on the
    // 2A03.
    pub p: u8,

    // Set from outside the interpreter when the PPU raises a non-maskable
    // interrupt. It is only consumed at an instruction boundary, and only
    // while the PPU has NMI generation enabled.
    pub nmi_pending: bool,
}

/// Copy of the register file taken between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
}

impl Registers {
    #[inline(always)]
    pub fn flag_set(&self, flag: u8) -> bool {
        self.p & flag == flag
    }

    /// Returns "SET" if the passed flag is set, otherwise "UNSET".
    fn fmt_flag(&self, flag: u8) -> &'static str {
        if self.flag_set(flag) { "SET" } else { "UNSET" }
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "    Program Counter: ${:04X}", self.pc)?;
        writeln!(f, "    Stack Pointer:   ${:02X}", self.sp)?;
        writeln!(f, "    Accumulator:     ${:02X}", self.a)?;
        writeln!(f, "    X Register:      ${:02X}", self.x)?;
        writeln!(f, "    Y Register:      ${:02X}", self.y)?;
        writeln!(f, "Status Register: ${:02X}", self.p)?;
        writeln!(f, "    Carry Flag:        {}", self.fmt_flag(CARRY_FLAG))?;
        writeln!(f, "    Zero Flag:         {}", self.fmt_flag(ZERO_FLAG))?;
        writeln!(f, "    Interrupt Disable: {}", self.fmt_flag(INTERRUPT_DISABLE))?;
        writeln!(f, "    Decimal Mode:      {}", self.fmt_flag(DECIMAL_MODE))?;
        writeln!(f, "    Break Command:     {}", self.fmt_flag(BREAK_COMMAND))?;
        writeln!(f, "    Overflow Flag:     {}", self.fmt_flag(OVERFLOW_FLAG))?;
        write!(f, "    Negative Flag:     {}", self.fmt_flag(NEGATIVE_FLAG))
    }
}

/// Where an instruction's operand lives once its addressing mode has been
/// resolved. Resolving consumes the operand bytes but never touches the
/// effective address, so stores don't register a read of their target.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Implied,
    Accumulator,
    Value(u8),
    Address(u16),
    Displacement(i8),
}

impl CPU {
    pub fn new() -> CPU {
        CPU {
            pc: 0xC000,
            sp: 0xFD,
            a: 0,
            x: 0,
            y: 0,
            p: 0x24,
            nmi_pending: false,
        }
    }

    pub fn registers(&self) -> Registers {
        Registers { pc: self.pc, sp: self.sp, a: self.a, x: self.x, y: self.y, p: self.p }
    }

    #[inline(always)]
    pub fn set_flag(&mut self, flag: u8) {
        self.p |= flag;
    }

    #[inline(always)]
    pub fn unset_flag(&mut self, flag: u8) {
        self.p &= !flag;
    }

    #[inline(always)]
    pub fn flag_set(&self, flag: u8) -> bool {
        self.p & flag == flag
    }

    /// Sets the flag if `on` is true, otherwise the flag is unset.
    #[inline(always)]
    pub fn toggle_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.set_flag(flag);
        } else {
            self.unset_flag(flag);
        }
    }

    /// Sets the zero flag if the value passed (typically a register) is zero,
    /// otherwise it's unset.
    #[inline(always)]
    pub fn toggle_zero_flag(&mut self, value: u8) {
        self.toggle_flag(ZERO_FLAG, value == 0);
    }

    /// Sets the negative flag if the value passed (typically a register) is
    /// negative, otherwise it's unset.
    #[inline(always)]
    pub fn toggle_negative_flag(&mut self, value: u8) {
        self.toggle_flag(NEGATIVE_FLAG, arithmetic::is_negative(value));
    }

    #[inline(always)]
    fn toggle_zero_negative(&mut self, value: u8) {
        self.toggle_zero_flag(value);
        self.toggle_negative_flag(value);
    }

    /// Services a pending NMI at an instruction boundary. The request is only
    /// taken while bit 7 of the PPU control register is set; otherwise it
    /// stays pending. Returns true if the interrupt was taken.
    pub fn poll_nmi(&mut self, memory: &mut Memory) -> bool {
        if !self.nmi_pending || !memory.ppu.nmi_enabled() {
            return false;
        }

        self.nmi_pending = false;
        let (pc, p) = (self.pc, self.p);
        memory.stack_push_u16(self, pc);
        memory.stack_push_u8(self, p);
        self.pc = memory.read_u16(NMI_VECTOR);
        true
    }

    /// Services a pending NMI, then fetches, decodes and executes the
    /// instruction the program counter points at.
    pub fn execute(&mut self, memory: &mut Memory) -> Result<(), CPUError> {
        self.poll_nmi(memory);
        self.execute_instruction(memory)
    }

    /// Fetches, decodes and executes one instruction without looking at the
    /// interrupt line. An unknown opcode is consumed before the error is
    /// returned.
    pub fn execute_instruction(&mut self, memory: &mut Memory) -> Result<(), CPUError> {
        let byte = self.fetch_u8(memory);
        let opcode = decode_opcode(byte).ok_or(CPUError::IllegalOpcode(byte))?;
        let target = self.resolve_operand(opcode.addressing_mode(), memory);
        self.apply(opcode.mnemonic(), target, memory);
        Ok(())
    }

    fn fetch_u8(&mut self, memory: &mut Memory) -> u8 {
        let value = memory.read_u8(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_u16(&mut self, memory: &mut Memory) -> u16 {
        let value = memory.read_u16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        value
    }

    /// Consumes the operand bytes for the addressing mode and works out where
    /// the operand is.
    fn resolve_operand(&mut self, mode: AddressingMode, memory: &mut Memory) -> Target {
        match mode {
            AddressingMode::Implied => Target::Implied,
            AddressingMode::Accumulator => Target::Accumulator,
            AddressingMode::Immediate => Target::Value(self.fetch_u8(memory)),
            AddressingMode::Relative => Target::Displacement(self.fetch_u8(memory) as i8),
            AddressingMode::ZeroPage => Target::Address(self.fetch_u8(memory) as u16),
            AddressingMode::ZeroPageX => {
                let base = self.fetch_u8(memory);
                Target::Address(base.wrapping_add(self.x) as u16)
            },
            AddressingMode::ZeroPageY => {
                let base = self.fetch_u8(memory);
                Target::Address(base.wrapping_add(self.y) as u16)
            },
            AddressingMode::Absolute => Target::Address(self.fetch_u16(memory)),
            AddressingMode::AbsoluteX => {
                let base = self.fetch_u16(memory);
                Target::Address(base.wrapping_add(self.x as u16))
            },
            AddressingMode::AbsoluteY => {
                let base = self.fetch_u16(memory);
                Target::Address(base.wrapping_add(self.y as u16))
            },
            AddressingMode::Indirect => {
                let pointer = self.fetch_u16(memory);
                Target::Address(memory.read_u16_wrapped_msb(pointer))
            },
            AddressingMode::IndexedIndirect => {
                let pointer = self.fetch_u8(memory).wrapping_add(self.x);
                Target::Address(memory.read_u16_zero_page(pointer as u16))
            },
            AddressingMode::IndirectIndexed => {
                let pointer = self.fetch_u8(memory);
                let base = memory.read_u16_zero_page(pointer as u16);
                Target::Address(base.wrapping_add(self.y as u16))
            },
        }
    }

    /// Reads the operand value. Only called by instructions that consume one.
    fn load(&self, target: Target, memory: &mut Memory) -> u8 {
        match target {
            Target::Value(value) => value,
            Target::Address(addr) => memory.read_u8(addr),
            Target::Accumulator => self.a,
            _ => unreachable!("no operand value for {:?}", target),
        }
    }

    /// Writes a result back to where the operand came from.
    fn store(&mut self, target: Target, value: u8, memory: &mut Memory) {
        match target {
            Target::Address(addr) => memory.write_u8(addr, value),
            Target::Accumulator => self.a = value,
            _ => unreachable!("cannot write back to {:?}", target),
        }
    }

    fn address(target: Target) -> u16 {
        match target {
            Target::Address(addr) => addr,
            _ => unreachable!("no effective address for {:?}", target),
        }
    }

    fn branch(&mut self, target: Target, condition: bool) {
        if let Target::Displacement(displacement) = target {
            if condition {
                self.pc = arithmetic::add_relative(self.pc, displacement);
            }
        }
    }

    /// Binary add of the operand and carry into the accumulator. SBC feeds the
    /// one's complement of its operand through here.
    fn add_with_carry(&mut self, value: u8) {
        let carry = if self.flag_set(CARRY_FLAG) { 1 } else { 0 };
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.toggle_flag(CARRY_FLAG, sum > 0xFF);
        self.toggle_flag(OVERFLOW_FLAG, arithmetic::signed_overflow(self.a, value, result));
        self.a = result;
        self.toggle_zero_negative(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.toggle_flag(CARRY_FLAG, register >= value);
        self.toggle_zero_negative(register.wrapping_sub(value));
    }

    /// Shared by ASL and ROL. `carry_in` lands in bit 0.
    fn shift_left(&mut self, value: u8, carry_in: bool) -> u8 {
        self.toggle_flag(CARRY_FLAG, arithmetic::is_negative(value));
        let result = (value << 1) | carry_in as u8;
        self.toggle_zero_negative(result);
        result
    }

    /// Shared by LSR and ROR. `carry_in` lands in bit 7.
    fn shift_right(&mut self, value: u8, carry_in: bool) -> u8 {
        self.toggle_flag(CARRY_FLAG, value & 0x1 == 0x1);
        let result = (value >> 1) | ((carry_in as u8) << 7);
        self.toggle_zero_negative(result);
        result
    }

    /// Merges a status byte pulled off the stack into the live register.
    fn pull_status(&mut self, memory: &mut Memory) {
        let pulled = memory.stack_pop_u8(self);
        self.p = (self.p & STACK_ONLY_FLAGS) | (pulled & !STACK_ONLY_FLAGS);
    }

    fn apply(&mut self, mnemonic: Mnemonic, target: Target, memory: &mut Memory) {
        match mnemonic {
            // Loads, stores and transfers.
            Mnemonic::LDA => {
                self.a = self.load(target, memory);
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::LDX => {
                self.x = self.load(target, memory);
                self.toggle_zero_negative(self.x);
            },
            Mnemonic::LDY => {
                self.y = self.load(target, memory);
                self.toggle_zero_negative(self.y);
            },
            Mnemonic::STA => self.store(target, self.a, memory),
            Mnemonic::STX => self.store(target, self.x, memory),
            Mnemonic::STY => self.store(target, self.y, memory),
            Mnemonic::TAX => {
                self.x = self.a;
                self.toggle_zero_negative(self.x);
            },
            Mnemonic::TAY => {
                self.y = self.a;
                self.toggle_zero_negative(self.y);
            },
            Mnemonic::TSX => {
                self.x = self.sp;
                self.toggle_zero_negative(self.x);
            },
            Mnemonic::TXA => {
                self.a = self.x;
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::TXS => self.sp = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.toggle_zero_negative(self.a);
            },

            // Arithmetic and logic.
            Mnemonic::ADC => {
                let value = self.load(target, memory);
                self.add_with_carry(value);
            },
            Mnemonic::SBC => {
                let value = self.load(target, memory);
                self.add_with_carry(!value);
            },
            Mnemonic::AND => {
                self.a &= self.load(target, memory);
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::ORA => {
                self.a |= self.load(target, memory);
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::EOR => {
                self.a ^= self.load(target, memory);
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::BIT => {
                let value = self.load(target, memory);
                self.toggle_flag(ZERO_FLAG, self.a & value == 0);
                self.toggle_flag(OVERFLOW_FLAG, value & OVERFLOW_FLAG == OVERFLOW_FLAG);
                self.toggle_negative_flag(value);
            },
            Mnemonic::CMP => {
                let value = self.load(target, memory);
                self.compare(self.a, value);
            },
            Mnemonic::CPX => {
                let value = self.load(target, memory);
                self.compare(self.x, value);
            },
            Mnemonic::CPY => {
                let value = self.load(target, memory);
                self.compare(self.y, value);
            },

            // Increments and decrements.
            Mnemonic::INC => {
                let result = self.load(target, memory).wrapping_add(1);
                self.store(target, result, memory);
                self.toggle_zero_negative(result);
            },
            Mnemonic::DEC => {
                let result = self.load(target, memory).wrapping_sub(1);
                self.store(target, result, memory);
                self.toggle_zero_negative(result);
            },
            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.toggle_zero_negative(self.x);
            },
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.toggle_zero_negative(self.y);
            },
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.toggle_zero_negative(self.x);
            },
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.toggle_zero_negative(self.y);
            },

            // Shifts and rotates.
            Mnemonic::ASL => {
                let value = self.load(target, memory);
                let result = self.shift_left(value, false);
                self.store(target, result, memory);
            },
            Mnemonic::ROL => {
                let value = self.load(target, memory);
                let result = self.shift_left(value, self.flag_set(CARRY_FLAG));
                self.store(target, result, memory);
            },
            Mnemonic::LSR => {
                let value = self.load(target, memory);
                let result = self.shift_right(value, false);
                self.store(target, result, memory);
            },
            Mnemonic::ROR => {
                let value = self.load(target, memory);
                let result = self.shift_right(value, self.flag_set(CARRY_FLAG));
                self.store(target, result, memory);
            },
            Mnemonic::RLA => {
                // Shifts without carry in and leaves every flag alone.
                let result = self.load(target, memory) << 1;
                self.store(target, result, memory);
                self.a &= result;
            },

            // Branches.
            Mnemonic::BCC => self.branch(target, !self.flag_set(CARRY_FLAG)),
            Mnemonic::BCS => self.branch(target, self.flag_set(CARRY_FLAG)),
            Mnemonic::BNE => self.branch(target, !self.flag_set(ZERO_FLAG)),
            Mnemonic::BEQ => self.branch(target, self.flag_set(ZERO_FLAG)),
            Mnemonic::BPL => self.branch(target, !self.flag_set(NEGATIVE_FLAG)),
            Mnemonic::BMI => self.branch(target, self.flag_set(NEGATIVE_FLAG)),
            Mnemonic::BVC => self.branch(target, !self.flag_set(OVERFLOW_FLAG)),
            Mnemonic::BVS => self.branch(target, self.flag_set(OVERFLOW_FLAG)),

            // Jumps, subroutines and interrupts.
            Mnemonic::JMP => self.pc = CPU::address(target),
            Mnemonic::JSR => {
                // The return address pushed is the last byte of the JSR.
                let return_address = self.pc.wrapping_sub(1);
                memory.stack_push_u16(self, return_address);
                self.pc = CPU::address(target);
            },
            Mnemonic::RTS => {
                self.pc = memory.stack_pop_u16(self).wrapping_add(1);
            },
            Mnemonic::RTI => {
                self.pull_status(memory);
                self.pc = memory.stack_pop_u16(self);
            },
            // Stack.
            Mnemonic::PHA => {
                let a = self.a;
                memory.stack_push_u8(self, a);
            },
            Mnemonic::PHP => {
                let status = self.p | STACK_ONLY_FLAGS;
                memory.stack_push_u8(self, status);
            },
            Mnemonic::PLA => {
                self.a = memory.stack_pop_u8(self);
                self.toggle_zero_negative(self.a);
            },
            Mnemonic::PLP => self.pull_status(memory),

            // Status flags.
            Mnemonic::CLC => self.unset_flag(CARRY_FLAG),
            Mnemonic::CLD => self.unset_flag(DECIMAL_MODE),
            Mnemonic::CLV => self.unset_flag(OVERFLOW_FLAG),
            Mnemonic::SEC => self.set_flag(CARRY_FLAG),
            Mnemonic::SED => self.set_flag(DECIMAL_MODE),
            Mnemonic::SEI => self.set_flag(INTERRUPT_DISABLE),

            Mnemonic::NOP => {},
        }
    }
}

impl Default for CPU {
    fn default() -> Self {
        CPU::new()
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "CPU Crash State:")?;
        write!(f, "{}", self.registers())
    }
}
