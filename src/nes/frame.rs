// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::fmt;
use std::num::ParseIntError;

// Column ranges of a Nintendulator log line.
const PC_COLUMN  : (usize, usize) = (0, 4);
const BYTE_COLUMNS: [(usize, usize); 3] = [(6, 8), (9, 11), (12, 14)];
const A_COLUMN   : (usize, usize) = (50, 52);
const X_COLUMN   : (usize, usize) = (55, 57);
const Y_COLUMN   : (usize, usize) = (60, 62);
const P_COLUMN   : (usize, usize) = (65, 67);
const SP_COLUMN  : (usize, usize) = (71, 73);

/// Why a log line couldn't be turned into a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    // The line ends before the stack pointer column.
    TooShort(usize),
    // A register column doesn't hold a hex number.
    BadField(&'static str, ParseIntError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FrameError::TooShort(len) => write!(f, "log line is only {} characters long", len),
            FrameError::BadField(name, ref e) => write!(f, "bad {} field: {}", name, e),
        }
    }
}

impl Error for FrameError {}

/// CPU state for use during automated CPU testing. These values are contained
/// inside of Nintendulator logs and used for comparing log frames to test CPU
/// accuracy. The disassembly column is skipped because assemblers disagree on
/// its spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct CPUFrame {
    pub bytes: [u8; 3],
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
}

impl CPUFrame {
    /// Parses a Nintendulator log frame and packs the parsed values into a
    /// structure. The structure can then be compared using the PartialEq trait.
    pub fn parse(frame: &str) -> Result<CPUFrame, FrameError> {
        let frame = frame.trim_end();
        if frame.len() < SP_COLUMN.1 {
            return Err(FrameError::TooShort(frame.len()));
        }

        // Unused instruction bytes are blank in the log and count as zero.
        let mut bytes = [0u8; 3];
        for (byte, &column) in bytes.iter_mut().zip(BYTE_COLUMNS.iter()) {
            *byte = CPUFrame::column(frame, column, "opcode").unwrap_or(0) as u8;
        }

        Ok(CPUFrame {
            bytes: bytes,
            pc: CPUFrame::column(frame, PC_COLUMN, "pc")?,
            a: CPUFrame::column(frame, A_COLUMN, "a")? as u8,
            x: CPUFrame::column(frame, X_COLUMN, "x")? as u8,
            y: CPUFrame::column(frame, Y_COLUMN, "y")? as u8,
            p: CPUFrame::column(frame, P_COLUMN, "p")? as u8,
            sp: CPUFrame::column(frame, SP_COLUMN, "sp")? as u8,
        })
    }

    /// Parses the hex number in a column of the frame.
    fn column(frame: &str, (start, end): (usize, usize), name: &'static str) -> Result<u16, FrameError> {
        let slice = frame.get(start..end).unwrap_or("");
        u16::from_str_radix(slice, 16).map_err(|e| FrameError::BadField(name, e))
    }
}
