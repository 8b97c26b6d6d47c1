// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::fmt;
use std::io;

// Exit codes used throughout the application. These exit codes has specific
// meanings and are used when no OS error codes are available.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Generic error ¯\_(ツ)_/¯.
pub const EXIT_INVALID_ROM: i32 = 2; // Invalid rom passed.
pub const EXIT_CPU_LOG_NOT_FOUND: i32 = 3;
pub const EXIT_INVALID_PC: i32 = 4;
pub const EXIT_RUNTIME_FAILURE: i32 = 101;

/// The only way an instruction can fail. The opcode byte has already been
/// consumed when this is returned, so the program counter points past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CPUError {
    IllegalOpcode(u8),
}

impl fmt::Display for CPUError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CPUError::IllegalOpcode(opcode) => write!(f, "illegal opcode ${:02X}", opcode),
        }
    }
}

impl Error for CPUError {}

/// Errors raised while reading a rom image into memory.
#[derive(Debug)]
pub enum RomError {
    Io(io::Error),
    // The image is too small to even hold the 16 byte header.
    TooShort(usize),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RomError::Io(ref e) => write!(f, "unable to read rom: {}", e),
            RomError::TooShort(len) => write!(f, "rom is {} bytes long and has no header", len),
        }
    }
}

impl Error for RomError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            RomError::Io(ref e) => Some(e),
            RomError::TooShort(_) => None,
        }
    }
}

impl From<io::Error> for RomError {
    fn from(e: io::Error) -> RomError {
        RomError::Io(e)
    }
}

/// Errors that stop the emulator while it is being driven instruction by
/// instruction.
#[derive(Debug)]
pub enum NESError {
    CPU(CPUError),
    // The emulator disagreed with the execution log it was compared against.
    LogMismatch { emulator: String, log: String },
    // The execution log ended before the emulator did.
    LogExhausted,
    Io(io::Error),
}

impl fmt::Display for NESError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NESError::CPU(ref e) => write!(f, "{}", e),
            NESError::LogMismatch { ref emulator, ref log } => {
                writeln!(f, "mismatched CPU frames:")?;
                writeln!(f, "    Emulator Frame: {}", emulator)?;
                write!(f, "    Log Frame:      {}", log)
            },
            NESError::LogExhausted => write!(f, "execution log ended"),
            NESError::Io(ref e) => write!(f, "{}", e),
        }
    }
}

impl Error for NESError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            NESError::CPU(ref e) => Some(e),
            NESError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<CPUError> for NESError {
    fn from(e: CPUError) -> NESError {
        NESError::CPU(e)
    }
}

impl From<io::Error> for NESError {
    fn from(e: io::Error) -> NESError {
        NESError::Io(e)
    }
}
