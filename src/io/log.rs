// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Local};
use crate::nes::nes::NESRuntimeOptions;

/// Logs a message to stdout with a given prefix if the emulator was started
/// with the verbose flag set.
pub fn log<P, T>(prefix: P, text: T, runtime_options: &NESRuntimeOptions) where P: Into<String>, T: Into<String> {
    if runtime_options.verbose {
        println!("{}", format_line(Local::now(), prefix, text));
    }
}

/// Logs a message to stderr regardless of verbosity. Used for conditions the
/// user has to see, such as an illegal opcode ending a run.
pub fn error<T>(text: T) where T: Into<String> {
    eprintln!("{}", format_line(Local::now(), "error", text));
}

fn format_line<P, T>(local: DateTime<Local>, prefix: P, text: T) -> String where P: Into<String>, T: Into<String> {
    format!("[{}] -- [{}] {}", local.format("%Y-%m-%d %H:%M:%S%.3f"), prefix.into(), text.into())
}
