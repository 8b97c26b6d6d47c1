// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use getopts::Options;
use nesdbg::debugger::debugger::Debugger;
use nesdbg::debugger::parser;
use nesdbg::io::errors::*;
use nesdbg::io::log;
use nesdbg::nes::nes::{NES, NESRuntimeOptions};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::{self, Sender};
use std::thread;

const PROMPT: &'static str = "(nesdbg) ";

/// Prints usage information.
fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [options] ROM", program);
    print!("{}", opts.usage(&brief));
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing. Once the emulator starts executing, the
/// application should only stop due to user input or a CPU error.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| String::from("nesdbg"));

    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("v", "verbose", "print log lines from every component");
    opts.optflag("t", "trace", "print a Nintendulator style line per instruction");
    opts.optflag("d", "debug", "start the interactive debugger");
    opts.optopt("l", "log", "compare execution against a Nintendulator log", "FILE");
    opts.optopt("p", "pc", "set the program counter after loading (hex)", "ADDR");
    opts.optopt("n", "steps", "stop after N instructions", "N");

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(matches) => matches,
        Err(e) => {
            log::error(format!("{}: {}", program, e));
            return EXIT_FAILURE;
        },
    };

    if matches.opt_present("h") {
        print_usage(&program, opts);
        return EXIT_SUCCESS;
    }

    let rom_path = match matches.free.first() {
        Some(rom_path) => rom_path.clone(),
        None => {
            print_usage(&program, opts);
            return EXIT_FAILURE;
        },
    };

    let runtime_options = NESRuntimeOptions {
        verbose: matches.opt_present("v"),
        trace: matches.opt_present("t"),
        debug: matches.opt_present("d"),
    };

    let mut nes = NES::new(runtime_options.clone());
    if let Err(e) = nes.load_rom(&rom_path) {
        log::error(format!("{}: {}: {}", program, rom_path, e));
        return EXIT_INVALID_ROM;
    }

    // Override the reset vector, mostly useful for test roms that have an
    // automated entry point such as nestest at $C000.
    if let Some(pc) = matches.opt_str("p") {
        match parser::parse_address(&pc) {
            Some(pc) => nes.cpu.pc = pc,
            None => {
                log::error(format!("{}: invalid program counter '{}'", program, pc));
                return EXIT_INVALID_PC;
            },
        }
    }

    if let Some(log_path) = matches.opt_str("l") {
        match File::open(&log_path) {
            Ok(file) => nes.begin_testing(BufReader::new(file)),
            Err(e) => {
                log::error(format!("{}: {}: {}", program, log_path, e));
                return EXIT_CPU_LOG_NOT_FOUND;
            },
        }
    }

    let limit = match matches.opt_str("n") {
        Some(steps) => match steps.parse::<u64>() {
            Ok(steps) => Some(steps),
            Err(_) => {
                log::error(format!("{}: invalid step count '{}'", program, steps));
                return EXIT_FAILURE;
            },
        },
        None => None,
    };

    if runtime_options.debug {
        debug(nes)
    } else {
        run(nes, limit)
    }
}

/// Runs the program until it fails or the instruction limit is reached.
fn run(mut nes: NES, limit: Option<u64>) -> i32 {
    match nes.run(limit) {
        Ok(executed) => {
            log::log("nes", format!("Executed {} instructions", executed), &nes.runtime_options);
            EXIT_SUCCESS
        },
        Err(e) => {
            log::error(format!("nesdbg: {}", e));
            log::error(format!("{}", nes.cpu));
            EXIT_RUNTIME_FAILURE
        },
    }
}

/// Hands the machine to the debugger. The prompt lives on its own thread and
/// feeds lines through a channel so a running program isn't blocked by it.
fn debug(mut nes: NES) -> i32 {
    let (sender, receiver) = mpsc::channel();
    let runtime_options = nes.runtime_options.clone();
    thread::spawn(move || prompt(sender, runtime_options));

    let mut debugger = Debugger::new(receiver);
    while debugger.step(&mut nes) {}
    EXIT_SUCCESS
}

/// Reads debugger commands until the user quits or input ends. Ctrl-C stops
/// a running program instead of killing the debugger.
fn prompt(sender: Sender<String>, runtime_options: NESRuntimeOptions) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            log::error(format!("nesdbg: unable to open prompt: {}", e));
            return;
        },
    };

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => {
                if let Err(e) = editor.add_history_entry(line.as_str()) {
                    log::log("debugger", format!("Unable to record history: {}", e), &runtime_options);
                }
                line
            },
            Err(ReadlineError::Interrupted) => String::from("stop"),
            Err(ReadlineError::Eof) => String::from("quit"),
            Err(e) => {
                log::error(format!("nesdbg: {}", e));
                break;
            },
        };

        let quitting = line.trim() == "quit" || line.trim() == "q";
        if sender.send(line).is_err() || quitting {
            break;
        }
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}
