// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use enum_primitive::FromPrimitive;
use std::fmt;

/// Instruction mnemonics understood by the interpreter. RLA is the only
/// undocumented one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL,
    BVC, BVS, CLC, CLD, CLV, CMP, CPX, CPY,
    DEC, DEX, DEY, EOR, INC, INX, INY, JMP, JSR, LDA,
    LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL,
    ROR, RTI, RTS, SBC, SEC, SED, SEI, STA, STX, STY,
    TAX, TAY, TSX, TXA, TXS, TYA, RLA,
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The ways an instruction can locate its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect, // ($nn,X)
    IndirectIndexed, // ($nn),Y
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(&self) -> u16 {
        match *self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute | AddressingMode::AbsoluteX |
            AddressingMode::AbsoluteY | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        ADCImm   = 0x69,
        ADCZero  = 0x65,
        ADCZeroX = 0x75,
        ADCAbs   = 0x6D,
        ADCAbsX  = 0x7D,
        ADCAbsY  = 0x79,
        ADCIndX  = 0x61,
        ADCIndY  = 0x71,

        ANDImm   = 0x29,
        ANDZero  = 0x25,
        ANDZeroX = 0x35,
        ANDAbs   = 0x2D,
        ANDAbsX  = 0x3D,
        ANDAbsY  = 0x39,
        ANDIndX  = 0x21,
        ANDIndY  = 0x31,

        ASLAcc   = 0x0A,
        ASLZero  = 0x06,
        ASLZeroX = 0x16,
        ASLAbs   = 0x0E,
        ASLAbsX  = 0x1E,

        BCCRel   = 0x90,

        BCSRel   = 0xB0,

        BEQRel   = 0xF0,

        BITZero  = 0x24,
        BITAbs   = 0x2C,

        BMIRel   = 0x30,

        BNERel   = 0xD0,

        BPLRel   = 0x10,

        BVCRel   = 0x50,

        BVSRel   = 0x70,

        CLCImpl  = 0x18,

        CLDImpl  = 0xD8,

        CLVImpl  = 0xB8,

        CMPImm   = 0xC9,
        CMPZero  = 0xC5,
        CMPZeroX = 0xD5,
        CMPAbs   = 0xCD,
        CMPAbsX  = 0xDD,
        CMPAbsY  = 0xD9,
        CMPIndX  = 0xC1,
        CMPIndY  = 0xD1,

        CPXImm   = 0xE0,
        CPXZero  = 0xE4,
        CPXAbs   = 0xEC,

        CPYImm   = 0xC0,
        CPYZero  = 0xC4,
        CPYAbs   = 0xCC,

        DECZero  = 0xC6,
        DECZeroX = 0xD6,
        DECAbs   = 0xCE,
        DECAbsX  = 0xDE,

        DEXImpl  = 0xCA,

        DEYImpl  = 0x88,

        EORImm   = 0x49,
        EORZero  = 0x45,
        EORZeroX = 0x55,
        EORAbs   = 0x4D,
        EORAbsX  = 0x5D,
        EORAbsY  = 0x59,
        EORIndX  = 0x41,
        EORIndY  = 0x51,

        INCZero  = 0xE6,
        INCZeroX = 0xF6,
        INCAbs   = 0xEE,
        INCAbsX  = 0xFE,

        INXImpl  = 0xE8,

        INYImpl  = 0xC8,

        JMPAbs   = 0x4C,
        JMPInd   = 0x6C,

        JSRAbs   = 0x20,

        LDAImm   = 0xA9,
        LDAZero  = 0xA5,
        LDAZeroX = 0xB5,
        LDAAbs   = 0xAD,
        LDAAbsX  = 0xBD,
        LDAAbsY  = 0xB9,
        LDAIndX  = 0xA1,
        LDAIndY  = 0xB1,

        LDXImm   = 0xA2,
        LDXZero  = 0xA6,
        LDXZeroY = 0xB6,
        LDXAbs   = 0xAE,
        LDXAbsY  = 0xBE,

        LDYImm   = 0xA0,
        LDYZero  = 0xA4,
        LDYZeroX = 0xB4,
        LDYAbs   = 0xAC,
        LDYAbsX  = 0xBC,

        LSRAcc   = 0x4A,
        LSRZero  = 0x46,
        LSRZeroX = 0x56,
        LSRAbs   = 0x4E,
        LSRAbsX  = 0x5E,

        NOPImpl  = 0xEA,

        ORAImm   = 0x09,
        ORAZero  = 0x05,
        ORAZeroX = 0x15,
        ORAAbs   = 0x0D,
        ORAAbsX  = 0x1D,
        ORAAbsY  = 0x19,
        ORAIndX  = 0x01,
        ORAIndY  = 0x11,

        PHAImpl  = 0x48,

        PHPImpl  = 0x08,

        PLAImpl  = 0x68,

        PLPImpl  = 0x28,

        ROLAcc   = 0x2A,
        ROLZero  = 0x26,
        ROLZeroX = 0x36,
        ROLAbs   = 0x2E,
        ROLAbsX  = 0x3E,

        RORAcc   = 0x6A,
        RORZero  = 0x66,
        RORZeroX = 0x76,
        RORAbs   = 0x6E,
        RORAbsX  = 0x7E,

        RTIImpl  = 0x40,

        RTSImpl  = 0x60,

        SBCImm   = 0xE9,
        SBCZero  = 0xE5,
        SBCZeroX = 0xF5,
        SBCAbs   = 0xED,
        SBCAbsX  = 0xFD,
        SBCAbsY  = 0xF9,
        SBCIndX  = 0xE1,
        SBCIndY  = 0xF1,

        SECImpl  = 0x38,

        SEDImpl  = 0xF8,

        SEIImpl  = 0x78,

        STAZero  = 0x85,
        STAZeroX = 0x95,
        STAAbs   = 0x8D,
        STAAbsX  = 0x9D,
        STAAbsY  = 0x99,
        STAIndX  = 0x81,
        STAIndY  = 0x91,

        STXZero  = 0x86,
        STXZeroY = 0x96,
        STXAbs   = 0x8E,

        STYZero  = 0x84,
        STYZeroX = 0x94,
        STYAbs   = 0x8C,

        TAXImpl  = 0xAA,

        TAYImpl  = 0xA8,

        TSXImpl  = 0xBA,

        TXAImpl  = 0x8A,

        TXSImpl  = 0x9A,

        TYAImpl  = 0x98,

        // Undocumented.
        RLAZero  = 0x27,
    }
}

impl Opcode {
    pub fn mnemonic(&self) -> Mnemonic {
        use self::Opcode::*;
        match *self {
            ADCImm | ADCZero | ADCZeroX | ADCAbs | ADCAbsX | ADCAbsY | ADCIndX | ADCIndY => Mnemonic::ADC,
            ANDImm | ANDZero | ANDZeroX | ANDAbs | ANDAbsX | ANDAbsY | ANDIndX | ANDIndY => Mnemonic::AND,
            ASLAcc | ASLZero | ASLZeroX | ASLAbs | ASLAbsX => Mnemonic::ASL,
            BCCRel => Mnemonic::BCC,
            BCSRel => Mnemonic::BCS,
            BEQRel => Mnemonic::BEQ,
            BITZero | BITAbs => Mnemonic::BIT,
            BMIRel => Mnemonic::BMI,
            BNERel => Mnemonic::BNE,
            BPLRel => Mnemonic::BPL,
            BVCRel => Mnemonic::BVC,
            BVSRel => Mnemonic::BVS,
            CLCImpl => Mnemonic::CLC,
            CLDImpl => Mnemonic::CLD,
            CLVImpl => Mnemonic::CLV,
            CMPImm | CMPZero | CMPZeroX | CMPAbs | CMPAbsX | CMPAbsY | CMPIndX | CMPIndY => Mnemonic::CMP,
            CPXImm | CPXZero | CPXAbs => Mnemonic::CPX,
            CPYImm | CPYZero | CPYAbs => Mnemonic::CPY,
            DECZero | DECZeroX | DECAbs | DECAbsX => Mnemonic::DEC,
            DEXImpl => Mnemonic::DEX,
            DEYImpl => Mnemonic::DEY,
            EORImm | EORZero | EORZeroX | EORAbs | EORAbsX | EORAbsY | EORIndX | EORIndY => Mnemonic::EOR,
            INCZero | INCZeroX | INCAbs | INCAbsX => Mnemonic::INC,
            INXImpl => Mnemonic::INX,
            INYImpl => Mnemonic::INY,
            JMPAbs | JMPInd => Mnemonic::JMP,
            JSRAbs => Mnemonic::JSR,
            LDAImm | LDAZero | LDAZeroX | LDAAbs | LDAAbsX | LDAAbsY | LDAIndX | LDAIndY => Mnemonic::LDA,
            LDXImm | LDXZero | LDXZeroY | LDXAbs | LDXAbsY => Mnemonic::LDX,
            LDYImm | LDYZero | LDYZeroX | LDYAbs | LDYAbsX => Mnemonic::LDY,
            LSRAcc | LSRZero | LSRZeroX | LSRAbs | LSRAbsX => Mnemonic::LSR,
            NOPImpl => Mnemonic::NOP,
            ORAImm | ORAZero | ORAZeroX | ORAAbs | ORAAbsX | ORAAbsY | ORAIndX | ORAIndY => Mnemonic::ORA,
            PHAImpl => Mnemonic::PHA,
            PHPImpl => Mnemonic::PHP,
            PLAImpl => Mnemonic::PLA,
            PLPImpl => Mnemonic::PLP,
            ROLAcc | ROLZero | ROLZeroX | ROLAbs | ROLAbsX => Mnemonic::ROL,
            RORAcc | RORZero | RORZeroX | RORAbs | RORAbsX => Mnemonic::ROR,
            RTIImpl => Mnemonic::RTI,
            RTSImpl => Mnemonic::RTS,
            SBCImm | SBCZero | SBCZeroX | SBCAbs | SBCAbsX | SBCAbsY | SBCIndX | SBCIndY => Mnemonic::SBC,
            SECImpl => Mnemonic::SEC,
            SEDImpl => Mnemonic::SED,
            SEIImpl => Mnemonic::SEI,
            STAZero | STAZeroX | STAAbs | STAAbsX | STAAbsY | STAIndX | STAIndY => Mnemonic::STA,
            STXZero | STXZeroY | STXAbs => Mnemonic::STX,
            STYZero | STYZeroX | STYAbs => Mnemonic::STY,
            TAXImpl => Mnemonic::TAX,
            TAYImpl => Mnemonic::TAY,
            TSXImpl => Mnemonic::TSX,
            TXAImpl => Mnemonic::TXA,
            TXSImpl => Mnemonic::TXS,
            TYAImpl => Mnemonic::TYA,
            RLAZero => Mnemonic::RLA,
        }
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        use self::Opcode::*;
        match *self {
            ADCImm | ANDImm | CMPImm | CPXImm | CPYImm | EORImm | LDAImm | LDXImm |
            LDYImm | ORAImm | SBCImm => AddressingMode::Immediate,
            ADCZero | ANDZero | ASLZero | BITZero | CMPZero | CPXZero | CPYZero | DECZero |
            EORZero | INCZero | LDAZero | LDXZero | LDYZero | LSRZero | ORAZero | ROLZero |
            RORZero | SBCZero | STAZero | STXZero | STYZero | RLAZero => AddressingMode::ZeroPage,
            ADCZeroX | ANDZeroX | ASLZeroX | CMPZeroX | DECZeroX | EORZeroX | INCZeroX |
            LDAZeroX | LDYZeroX | LSRZeroX | ORAZeroX | ROLZeroX | RORZeroX | SBCZeroX |
            STAZeroX | STYZeroX => AddressingMode::ZeroPageX,
            ADCAbs | ANDAbs | ASLAbs | BITAbs | CMPAbs | CPXAbs | CPYAbs | DECAbs |
            EORAbs | INCAbs | JMPAbs | JSRAbs | LDAAbs | LDXAbs | LDYAbs | LSRAbs |
            ORAAbs | ROLAbs | RORAbs | SBCAbs | STAAbs | STXAbs | STYAbs => AddressingMode::Absolute,
            ADCAbsX | ANDAbsX | ASLAbsX | CMPAbsX | DECAbsX | EORAbsX | INCAbsX | LDAAbsX |
            LDYAbsX | LSRAbsX | ORAAbsX | ROLAbsX | RORAbsX | SBCAbsX | STAAbsX => AddressingMode::AbsoluteX,
            ADCAbsY | ANDAbsY | CMPAbsY | EORAbsY | LDAAbsY | LDXAbsY | ORAAbsY | SBCAbsY |
            STAAbsY => AddressingMode::AbsoluteY,
            ADCIndX | ANDIndX | CMPIndX | EORIndX | LDAIndX | ORAIndX | SBCIndX | STAIndX => AddressingMode::IndexedIndirect,
            ADCIndY | ANDIndY | CMPIndY | EORIndY | LDAIndY | ORAIndY | SBCIndY | STAIndY => AddressingMode::IndirectIndexed,
            ASLAcc | LSRAcc | ROLAcc | RORAcc => AddressingMode::Accumulator,
            BCCRel | BCSRel | BEQRel | BMIRel | BNERel | BPLRel | BVCRel | BVSRel => AddressingMode::Relative,
            CLCImpl | CLDImpl | CLVImpl | DEXImpl | DEYImpl | INXImpl |
            INYImpl | NOPImpl | PHAImpl | PHPImpl | PLAImpl | PLPImpl | RTIImpl | RTSImpl |
            SECImpl | SEDImpl | SEIImpl | TAXImpl | TAYImpl | TSXImpl | TXAImpl | TXSImpl |
            TYAImpl => AddressingMode::Implied,
            JMPInd => AddressingMode::Indirect,
            LDXZeroY | STXZeroY => AddressingMode::ZeroPageY,
        }
    }

    /// Total instruction length in bytes, opcode included.
    pub fn len(&self) -> u16 {
        1 + self.addressing_mode().operand_len()
    }
}

/// Decodes an opcode by converting an opcode number to an enum value. Bytes
/// without an entry in the table yield `None`.
pub fn decode_opcode(opcode: u8) -> Option<Opcode> {
    Opcode::from_u8(opcode)
}
