// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Debugger core for the NES: a 2A03 instruction interpreter, the CPU memory
//! bus and the register/VRAM surface of the 2C02 picture processor, plus a
//! line-oriented debugger that drives them one instruction at a time.

#[macro_use]
extern crate enum_primitive;

pub mod debugger {
    pub mod debugger;
    pub mod parser;
}

pub mod io {
    pub mod binutils;
    pub mod errors;
    pub mod log;
}

pub mod nes {
    pub mod cpu;
    pub mod frame;
    pub mod instruction;
    pub mod memory;
    pub mod nes;
    pub mod opcode;
    pub mod ppu;
    pub mod ppu_memory;
}

pub mod utils {
    pub mod arithmetic;
    pub mod paging;
}
