// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::debugger::parser;
use crate::io::log;
use crate::nes::nes::NES;
use crate::nes::ppu::Sprite;
use std::fmt;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

// Defaults for the listing commands.
const DEFAULT_DUMP_LEN    : usize = 0x40;
const DEFAULT_DISASM_COUNT: usize = 16;
const DUMP_ROW_LEN        : usize = 16;

// Nothing longer than the address space can be dumped.
const MAX_DUMP_LEN        : usize = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Step,
    Continue,
    Stop,
    Break,
    Watch,
    Delete,
    Breakpoints,
    Registers,
    PPU,
    OAM,
    VBlank,
    VRAM,
    Dump,
    Disasm,
    NMI,
    Load,
    Quit,
}

struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// Conditions that halt a running program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breakpoint {
    // Stop before the instruction at this address executes.
    Address(u16),
    // Stop after an instruction whose last read or write hit this address.
    Memory(u16),
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Breakpoint::Address(addr) => write!(f, "break ${:04X}", addr),
            Breakpoint::Memory(addr) => write!(f, "watch ${:04X}", addr),
        }
    }
}

pub struct Debugger {
    receiver: Receiver<String>,
    running: bool,

    // Instructions left to execute for a `step` command.
    pending_steps: u64,

    // Set by `continue` and `step` so the instruction the program is parked
    // on doesn't trip its own address breakpoint again.
    skip_breakpoint: bool,

    breakpoints: Vec<Breakpoint>,
    quit: bool,
}

impl Debugger {
    /// Creates a debugger reading commands from `receiver`. Execution starts
    /// stopped.
    pub fn new(receiver: Receiver<String>) -> Self {
        Debugger {
            receiver: receiver,
            running: false,
            pending_steps: 0,
            skip_breakpoint: false,
            breakpoints: Vec::new(),
            quit: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Handles pending input, then steps the CPU forward a single instruction
    /// if the program is running. Returns false once the user asked to quit or
    /// the input channel closed.
    pub fn step(&mut self, nes: &mut NES) -> bool {
        // Input is received from another thread so the emulator can run
        // without the debugger prompt blocking it.
        loop {
            match self.receiver.try_recv() {
                Ok(input) => self.handle_input(&input, nes),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.quit = true;
                    break;
                },
            }
        }
        if self.quit {
            return false;
        }

        // While stopped, sleep the host CPU while we wait for input.
        if self.running || self.pending_steps > 0 {
            self.execute(nes);
        } else {
            thread::sleep(Duration::from_millis(16));
        }
        true
    }

    /// Parses and runs one line of debugger input.
    pub fn handle_input(&mut self, input: &str, nes: &mut NES) {
        match self.interpret(input) {
            Ok(Some(command)) => self.execute_command(command, nes),
            Ok(None) => {},
            Err(e) => log::error(format!("nesdbg: {}", e)),
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums. Blank
    /// lines are not an error, they just don't do anything.
    fn interpret(&self, input: &str) -> Result<Option<CommandWithArguments>, String> {
        let args = parser::input_to_arguments(input)?;
        let raw_command = match args.first() {
            Some(raw_command) => raw_command.to_lowercase(),
            None => return Ok(None),
        };

        // Map command strings to the command enum type.
        let command = match raw_command.as_str() {
            "step" | "n" => Command::Step,
            "continue" | "c" => Command::Continue,
            "stop" | "s" => Command::Stop,
            "break" | "b" => Command::Break,
            "watch" | "w" => Command::Watch,
            "delete" | "del" => Command::Delete,
            "breakpoints" | "bl" => Command::Breakpoints,
            "registers" | "r" => Command::Registers,
            "ppu" => Command::PPU,
            "oam" => Command::OAM,
            "vblank" => Command::VBlank,
            "vram" | "v" => Command::VRAM,
            "dump" | "d" => Command::Dump,
            "disasm" | "u" => Command::Disasm,
            "nmi" => Command::NMI,
            "load" => Command::Load,
            "quit" | "q" => Command::Quit,
            _ => return Err(format!("unknown command '{}'", raw_command)),
        };

        Ok(Some(CommandWithArguments {
            command: command,
            args: args,
        }))
    }

    /// Executes the correct debugger command based on the enum passed.
    fn execute_command(&mut self, command: CommandWithArguments, nes: &mut NES) {
        let args = &command.args[1..];
        let result = match command.command {
            Command::Step => self.execute_step(args),
            Command::Continue => self.execute_continue(nes),
            Command::Stop => self.execute_stop(nes),
            Command::Break => self.execute_break(args, Breakpoint::Address),
            Command::Watch => self.execute_break(args, Breakpoint::Memory),
            Command::Delete => self.execute_delete(args),
            Command::Breakpoints => {
                print!("{}", format_breakpoints(&self.breakpoints));
                Ok(())
            },
            Command::Registers => {
                println!("{}", nes.registers());
                print!("{}", format_vectors(nes.reset_vector(), nes.nmi_vector()));
                Ok(())
            },
            Command::PPU => {
                let palettes = &nes.memory.ppu.memory;
                println!("{}", nes.ppu_registers());
                println!("Image palette:  {}", format_bytes(palettes.image_palette()));
                println!("Sprite palette: {}", format_bytes(palettes.sprite_palette()));
                Ok(())
            },
            Command::OAM => {
                print!("{}", format_sprites(&nes.sprites()));
                Ok(())
            },
            Command::VBlank => self.execute_vblank(args, nes),
            Command::Dump => self.execute_dump(args, nes, false),
            Command::VRAM => self.execute_dump(args, nes, true),
            Command::Disasm => self.execute_disasm(args, nes),
            Command::NMI => {
                nes.trigger_nmi();
                log::log("debugger", "NMI requested", &nes.runtime_options);
                Ok(())
            },
            Command::Load => self.execute_load(args, nes),
            Command::Quit => {
                self.quit = true;
                Ok(())
            },
        };

        if let Err(e) = result {
            log::error(format!("nesdbg: {}", e));
        }
    }

    /// Executes the next `count` instructions (1 by default).
    fn execute_step(&mut self, args: &[String]) -> Result<(), String> {
        let count = match args.first() {
            Some(arg) => arg.parse::<u64>().map_err(|_| format!("invalid step count '{}'", arg))?,
            None => 1,
        };
        self.running = false;
        self.pending_steps = count;
        self.skip_breakpoint = true;
        Ok(())
    }

    /// Starts execution if it's stopped.
    fn execute_continue(&mut self, nes: &NES) -> Result<(), String> {
        log::log("debugger", "Starting execution now...", &nes.runtime_options);
        self.running = true;
        self.skip_breakpoint = true;
        Ok(())
    }

    /// Stops execution of the CPU and PPU to allow the human some time to debug
    /// a problem or stare at hex codes all day to look like a l33t haxor.
    fn execute_stop(&mut self, nes: &NES) -> Result<(), String> {
        log::log("debugger", "Stopping execution now...", &nes.runtime_options);
        self.running = false;
        self.pending_steps = 0;
        Ok(())
    }

    fn execute_break<F>(&mut self, args: &[String], kind: F) -> Result<(), String> where F: Fn(u16) -> Breakpoint {
        let addr = address_arg(args.first())?;
        let breakpoint = kind(addr);
        if !self.breakpoints.contains(&breakpoint) {
            self.breakpoints.push(breakpoint);
        }
        Ok(())
    }

    fn execute_delete(&mut self, args: &[String]) -> Result<(), String> {
        let arg = args.first().ok_or("delete needs a breakpoint index")?;
        let index = arg.parse::<usize>().map_err(|_| format!("invalid index '{}'", arg))?;
        if index >= self.breakpoints.len() {
            return Err(format!("no breakpoint {}", index));
        }
        self.breakpoints.remove(index);
        Ok(())
    }

    /// Sets or clears the vblank bit of the PPU status register. Programs
    /// that poll $2002 wait on this, since nothing else raises it.
    fn execute_vblank(&mut self, args: &[String], nes: &mut NES) -> Result<(), String> {
        let vblank = match args.first().map(|arg| arg.to_lowercase()) {
            Some(ref arg) if arg == "on" => true,
            Some(ref arg) if arg == "off" => false,
            _ => return Err(String::from("usage: vblank on|off")),
        };
        nes.memory.ppu.set_vblank(vblank);
        log::log("debugger", format!("Status register is now ${:02X}", nes.ppu_registers().status),
                 &nes.runtime_options);
        Ok(())
    }

    /// Allows dumping CPU or picture memory at a specified memory address.
    fn execute_dump(&mut self, args: &[String], nes: &NES, vram: bool) -> Result<(), String> {
        let addr = address_arg(args.first())?;
        let len = match args.get(1) {
            Some(arg) => arg.parse::<usize>().map_err(|_| format!("invalid length '{}'", arg))?,
            None => DEFAULT_DUMP_LEN,
        }.min(MAX_DUMP_LEN);
        let bytes = if vram { nes.vram_window(addr, len) } else { nes.memory_window(addr, len) };
        print!("{}", format_dump(addr, &bytes));
        Ok(())
    }

    /// Lists instructions starting at the given address, or at the program
    /// counter when none is given.
    fn execute_disasm(&mut self, args: &[String], nes: &NES) -> Result<(), String> {
        let pc = nes.registers().pc;
        let start = match args.first() {
            Some(_) => address_arg(args.first())?,
            None => pc,
        };
        let count = match args.get(1) {
            Some(arg) => arg.parse::<usize>().map_err(|_| format!("invalid count '{}'", arg))?,
            None => DEFAULT_DISASM_COUNT,
        };
        print!("{}", format_disassembly(&nes.disassemble(start, count), pc));
        Ok(())
    }

    fn execute_load(&mut self, args: &[String], nes: &mut NES) -> Result<(), String> {
        let path = args.first().ok_or("load needs a rom path")?;
        nes.load_rom(path).map_err(|e| e.to_string())?;
        self.running = false;
        self.pending_steps = 0;
        log::log("debugger", format!("Loaded {}", path), &nes.runtime_options);
        Ok(())
    }

    /// Executes one instruction unless a breakpoint says otherwise. An illegal
    /// opcode stops execution and is reported; the machine is left as it was
    /// so it can still be inspected.
    fn execute(&mut self, nes: &mut NES) {
        let pc = nes.registers().pc;
        let skip = self.skip_breakpoint;
        self.skip_breakpoint = false;
        if !skip && self.breakpoints.contains(&Breakpoint::Address(pc)) {
            self.halt(format!("Breakpoint hit at ${:04X}", pc), nes);
            return;
        }

        if let Err(e) = nes.step() {
            self.halt(format!("Execution stopped at ${:04X}: {}", pc, e), nes);
            return;
        }

        let watched = self.breakpoints.iter().filter_map(|breakpoint| match *breakpoint {
            Breakpoint::Memory(addr) => Some(addr),
            Breakpoint::Address(_) => None,
        }).find(|&addr| {
            nes.memory.last_read_address() == Some(addr) || nes.memory.last_write_address() == Some(addr)
        });
        if let Some(addr) = watched {
            self.halt(format!("Watched address ${:04X} accessed by ${:04X}", addr, pc), nes);
            return;
        }

        if self.pending_steps > 0 {
            self.pending_steps -= 1;
            if self.pending_steps == 0 {
                print_position(nes);
            }
        }
    }

    fn halt(&mut self, reason: String, nes: &NES) {
        self.running = false;
        self.pending_steps = 0;
        println!("{}", reason);
        print_position(nes);
    }
}

fn address_arg(arg: Option<&String>) -> Result<u16, String> {
    let arg = arg.ok_or("missing address")?;
    parser::parse_address(arg).ok_or(format!("invalid address '{}'", arg))
}

/// Prints the next instruction and the registers.
fn print_position(nes: &NES) {
    let pc = nes.registers().pc;
    print!("{}", format_disassembly(&nes.disassemble(pc, 1), pc));
    println!("{}", nes.registers());
}

fn format_bytes(bytes: &[u8]) -> String {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    hex.join(" ")
}

/// Formats a hex dump, 16 bytes per row, each row prefixed with its address.
pub fn format_dump(start: u16, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(DUMP_ROW_LEN).enumerate() {
        let addr = start.wrapping_add((row * DUMP_ROW_LEN) as u16);
        out.push_str(&format!("{:04X}: {}\n", addr, format_bytes(chunk)));
    }
    out
}

pub fn format_vectors(reset: u16, nmi: u16) -> String {
    format!("Reset Vector: ${:04X}\nNMI Vector:   ${:04X}\n", reset, nmi)
}

/// Formats a listing, marking the line at the program counter.
pub fn format_disassembly(lines: &[(u16, String)], pc: u16) -> String {
    let mut out = String::new();
    for &(addr, ref text) in lines {
        let marker = if addr == pc { ">" } else { " " };
        out.push_str(&format!("{} {:04X}  {}\n", marker, addr, text));
    }
    out
}

pub fn format_sprites(sprites: &[Sprite]) -> String {
    let mut out = String::new();
    for (i, sprite) in sprites.iter().enumerate() {
        out.push_str(&format!("{:2}: {}\n", i, sprite));
    }
    out
}

pub fn format_breakpoints(breakpoints: &[Breakpoint]) -> String {
    if breakpoints.is_empty() {
        return String::from("No breakpoints\n");
    }
    let mut out = String::new();
    for (i, breakpoint) in breakpoints.iter().enumerate() {
        out.push_str(&format!("{}: {}\n", i, breakpoint));
    }
    out
}
