// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{LittleEndian, WriteBytesExt};
use nesdbg::io::errors::{CPUError, NESError, RomError};
use nesdbg::nes::nes::{NES, NESRuntimeOptions};
use std::env;
use std::fs;
use std::io::Write;

const PRG_BANK: usize = 0x4000;
const CHR_BLOCK: usize = 0x1000;

/// Builder for synthetic iNES images. Programs are placed at $C000 (and its
/// $8000 mirror); the reset and NMI vectors live at the top of the bank.
struct Rom {
    flags_6: u8,
    trainer: Vec<u8>,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Rom {
    fn new(program: &[u8]) -> Rom {
        let mut prg = vec![0xEA; PRG_BANK];
        prg[..program.len()].copy_from_slice(program);
        let mut rom = Rom {
            flags_6: 0,
            trainer: Vec::new(),
            prg: prg,
            chr: (0..CHR_BLOCK * 2).map(|i| (i / CHR_BLOCK) as u8 + 1).collect(),
        };
        rom.vector(0xFFFC, 0xC000);
        rom.vector(0xFFFA, 0xC100);
        rom
    }

    fn vector(&mut self, addr: u16, target: u16) {
        let offset = (addr - 0xC000) as usize;
        let mut bytes = Vec::new();
        bytes.write_u16::<LittleEndian>(target).unwrap();
        self.prg[offset..offset + 2].copy_from_slice(&bytes);
    }

    fn at(mut self, addr: u16, code: &[u8]) -> Rom {
        let offset = (addr - 0xC000) as usize;
        self.prg[offset..offset + code.len()].copy_from_slice(code);
        self
    }

    fn with_trainer(mut self) -> Rom {
        self.flags_6 |= 0x04;
        self.trainer = vec![0xFF; 512];
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut image = Vec::new();
        image.write_all(b"NES\x1A").unwrap();
        image.write_u8(1).unwrap();
        image.write_u8(1).unwrap();
        image.write_u8(self.flags_6).unwrap();
        image.write_all(&[0; 9]).unwrap();
        image.extend_from_slice(&self.trainer);
        image.extend_from_slice(&self.prg);
        image.extend_from_slice(&self.chr);
        image
    }

    fn boot(&self) -> NES {
        let mut nes = NES::new(NESRuntimeOptions::default());
        nes.load_rom_bytes(&self.build()).unwrap();
        nes
    }
}

fn steps(nes: &mut NES, count: usize) {
    for _ in 0..count {
        nes.step().unwrap();
    }
}

#[test]
fn rom_load_fills_banks_and_pattern_tables() {
    let nes = Rom::new(&[0x78, 0xD8]).boot();
    let pattern_tables = &nes.memory.ppu.memory;
    assert!(pattern_tables.pattern_table(0).iter().all(|&b| b == 1));
    assert!(pattern_tables.pattern_table(1).iter().all(|&b| b == 2));

    assert_eq!(nes.registers().pc, 0xC000);
    assert_eq!(nes.reset_vector(), 0xC000);
    assert_eq!(nes.nmi_vector(), 0xC100);

    // Both banks come from the same 16KB region.
    assert_eq!(nes.memory_window(0x8000, 2), vec![0x78, 0xD8]);
    assert_eq!(nes.memory_window(0xC000, 2), vec![0x78, 0xD8]);
}

#[test]
fn trainer_is_skipped() {
    let nes = Rom::new(&[0xA9, 0x42]).with_trainer().boot();
    assert_eq!(nes.peek_u8(0xC000), 0xA9);
    assert!(nes.header().map_or(false, |header| header.has_trainer()));
}

#[test]
fn rom_load_from_disk() {
    let path = env::temp_dir().join(format!("nesdbg-{}.nes", std::process::id()));
    fs::write(&path, Rom::new(&[0xE8]).build()).unwrap();

    let mut nes = NES::new(NESRuntimeOptions::default());
    let result = nes.load_rom(&path);
    fs::remove_file(&path).unwrap();
    result.unwrap();
    assert_eq!(nes.registers().pc, 0xC000);
    steps(&mut nes, 1);
    assert_eq!(nes.registers().x, 1);

    match nes.load_rom(&path) {
        Err(RomError::Io(_)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn status_read_clears_vblank_after_returning_it() {
    // LDA $2002; LDX $2002
    let mut nes = Rom::new(&[0xAD, 0x02, 0x20, 0xAE, 0x02, 0x20]).boot();
    nes.memory.ppu.set_vblank(true);
    steps(&mut nes, 1);
    assert_eq!(nes.registers().a & 0x80, 0x80);
    assert_eq!(nes.ppu_registers().status & 0x80, 0);
    steps(&mut nes, 1);
    assert_eq!(nes.registers().x & 0x80, 0);
}

#[test]
fn vram_pointer_protocol() {
    let program = [
        0xA9, 0xAB, 0x8D, 0x06, 0x20, // LDA #$AB; STA $2006
        0xA9, 0xCD, 0x8D, 0x06, 0x20, // LDA #$CD; STA $2006
        0xA9, 0x11, 0x8D, 0x07, 0x20, // LDA #$11; STA $2007
        0xA9, 0x22, 0x8D, 0x07, 0x20, // LDA #$22; STA $2007
    ];
    let mut nes = Rom::new(&program).boot();
    steps(&mut nes, 8);

    let ppu = &nes.memory.ppu;
    assert_eq!(ppu.memory.read(0xABCD), 0x11);
    assert_eq!(ppu.memory.read(0xABCE), 0x22);
    assert_eq!(nes.ppu_registers().address, 0xABCF);
    assert!(!nes.ppu_registers().address_write_low);
}

#[test]
fn sprite_dma_copies_a_page() {
    // LDA #$03; STA $4014
    let mut nes = Rom::new(&[0xA9, 0x03, 0x8D, 0x14, 0x40]).boot();
    for i in 0..256u16 {
        nes.write_u8(0x0300 + i, 255 - i as u8);
    }
    steps(&mut nes, 2);

    let sprites = nes.sprites();
    assert_eq!(nes.memory.ppu.spr_ram()[0], 0xFF);
    assert_eq!(nes.memory.ppu.spr_ram()[255], 0x00);
    assert_eq!((sprites[0].y, sprites[0].tile, sprites[0].attributes, sprites[0].x),
               (0xFF, 0xFE, 0xFD, 0xFC));
}

#[test]
fn nmi_waits_for_control_bit() {
    let rom = Rom::new(&[
        0xE8,             // INX
        0xA9, 0x80,       // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0xE8,             // INX
    ]).at(0xC100, &[0xC8, 0x40]); // INY; RTI
    let mut nes = rom.boot();

    nes.trigger_nmi();
    steps(&mut nes, 1);
    assert_eq!(nes.registers().x, 1);
    assert!(nes.nmi_pending());

    steps(&mut nes, 2);
    assert!(nes.nmi_pending());

    // The handler's first instruction runs in the same step the NMI is taken.
    steps(&mut nes, 1);
    assert!(!nes.nmi_pending());
    assert_eq!(nes.registers().y, 1);
    assert_eq!(nes.registers().pc, 0xC101);
    assert_eq!(nes.registers().sp, 0xFA);
    assert_eq!(nes.memory_window(0x01FB, 3), vec![0xA4, 0x06, 0xC0]);

    // RTI goes back to the interrupted INX.
    steps(&mut nes, 2);
    assert_eq!(nes.registers().pc, 0xC007);
    assert_eq!(nes.registers().x, 2);
}

#[test]
fn access_fields_track_the_last_instruction() {
    // LDA $0010; STA $0300
    let mut nes = Rom::new(&[0xA5, 0x10, 0x8D, 0x00, 0x03]).boot();
    steps(&mut nes, 1);
    assert_eq!(nes.memory.last_read_address(), Some(0x0010));
    assert_eq!(nes.memory.last_write_address(), None);
    steps(&mut nes, 1);
    assert_eq!(nes.memory.last_read_address(), Some(0xC004));
    assert_eq!(nes.memory.last_write_address(), Some(0x0300));
}

#[test]
fn brk_and_cli_stop_a_run() {
    for &byte in &[0x00, 0x58] {
        let mut nes = Rom::new(&[0xE8, byte]).boot();
        match nes.run(None) {
            Err(NESError::CPU(CPUError::IllegalOpcode(b))) => assert_eq!(b, byte),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(nes.registers().pc, 0xC002);
        assert_eq!(nes.registers().sp, 0xFD);
    }
}

#[test]
fn illegal_opcode_is_reported_and_recoverable() {
    let mut nes = Rom::new(&[0x02, 0xE8]).boot();
    match nes.step() {
        Err(NESError::CPU(CPUError::IllegalOpcode(0x02))) => {},
        other => panic!("unexpected result {:?}", other),
    }
    // A single-step caller can carry on past it.
    steps(&mut nes, 1);
    assert_eq!(nes.registers().x, 1);
}

#[test]
fn disassembly_does_not_disturb_state() {
    let mut nes = Rom::new(&[0xAD, 0x02, 0x20, 0xD0, 0xFB]).boot();
    nes.memory.ppu.set_vblank(true);
    let lines = nes.disassemble(0xC000, 2);
    assert_eq!(lines[0], (0xC000, String::from("LDA $2002")));
    assert_eq!(lines[1], (0xC003, String::from("BNE $C000")));
    assert_eq!(nes.ppu_registers().status, 0x80);
    assert_eq!(nes.memory.last_read_address(), None);
}

#[test]
fn bus_reads_through_the_api_have_side_effects() {
    let mut nes = Rom::new(&[]).boot();
    nes.memory.ppu.set_vblank(true);
    assert_eq!(nes.peek_u8(0x2002), 0x80);
    assert_eq!(nes.read_u8(0x2002), 0x80);
    assert_eq!(nes.read_u8(0x2002), 0x00);
    assert_eq!(nes.memory.last_read_address(), Some(0x2002));
}
