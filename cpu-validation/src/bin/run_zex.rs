//! CP/M harness for the zexdoc/zexall instruction exercisers.
//!
//! Loads a .com image at 0x0100 and emulates just enough BDOS to let the
//! exerciser print its per-group CRC results: function 2 (console output)
//! and function 9 (print string). A trap at the BDOS entry point drives the
//! emulation through the breakpoint hook.

use std::io::{self, Write};
use std::process::ExitCode;

use quartz_core::core::{Bus, Notify};
use quartz_core::cpu::Z80;

const LOAD_ADDR: usize = 0x0100;
const BDOS_ENTRY: u16 = 0x0005;

/// Flat 64KB RAM with the standard T-state charges and no I/O devices.
struct ZexBus {
    memory: Box<[u8; 0x10000]>,
    tstates: u64,
}

impl ZexBus {
    fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            tstates: 0,
        }
    }
}

impl Bus for ZexBus {
    fn fetch_opcode(&mut self, addr: u16) -> u8 {
        self.tstates += 4;
        self.memory[addr as usize]
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.tstates += 3;
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.tstates += 3;
        self.memory[addr as usize] = data;
    }

    fn port_read(&mut self, _port: u16) -> u8 {
        self.tstates += 4;
        0xff
    }

    fn port_write(&mut self, _port: u16, _data: u8) {
        self.tstates += 4;
    }

    fn address_on_bus(&mut self, _addr: u16, tstates: u32) {
        self.tstates += tstates as u64;
    }

    fn interrupt_delay(&mut self, tstates: u32) {
        self.tstates += tstates as u64;
    }

    fn tstates(&self) -> u64 {
        self.tstates
    }

    fn reset(&mut self) {
        self.tstates = 0;
    }
}

/// Latches BDOS-entry hits; the call itself is handled after `step`
/// returns, once the injected RET has bounced control back to the program.
struct BdosTrap {
    hit: bool,
}

impl Notify for BdosTrap {
    fn breakpoint(&mut self, _addr: u16, opcode: u8) -> u8 {
        self.hit = true;
        opcode
    }
}

/// Returns false when the program asked to terminate.
fn bdos_call(cpu: &Z80, bus: &ZexBus) -> bool {
    match cpu.c {
        0 => {
            // System reset: the exerciser is done
            println!();
            println!("T-states: {}", bus.tstates());
            false
        }
        2 => {
            print!("{}", cpu.e as char);
            let _ = io::stdout().flush();
            true
        }
        9 => {
            let mut addr = cpu.get_de();
            loop {
                let byte = bus.memory[addr as usize];
                if byte == b'$' {
                    break;
                }
                print!("{}", byte as char);
                addr = addr.wrapping_add(1);
            }
            let _ = io::stdout().flush();
            true
        }
        other => {
            println!();
            println!("Unhandled BDOS call {}", other);
            false
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: run_zex <path-to-com-image>");
        return ExitCode::FAILURE;
    }

    let image = match std::fs::read(&args[1]) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };
    if image.len() > 0x10000 - LOAD_ADDR {
        eprintln!("Image too large: {} bytes", image.len());
        return ExitCode::FAILURE;
    }

    let mut cpu = Z80::new();
    let mut bus = ZexBus::new();
    let mut trap = BdosTrap { hit: false };

    bus.memory[LOAD_ADDR..LOAD_ADDR + image.len()].copy_from_slice(&image);

    // Minimal CP/M zero page: JP 0x0100 at the reset vector and a RET at
    // the BDOS entry so trapped calls bounce straight back to the caller
    bus.memory[0] = 0xC3;
    bus.memory[1] = 0x00;
    bus.memory[2] = 0x01;
    bus.memory[BDOS_ENTRY as usize] = 0xC9;
    cpu.set_breakpoint(BDOS_ENTRY, true);

    loop {
        cpu.step(&mut bus, &mut trap);
        if trap.hit {
            trap.hit = false;
            if !bdos_call(&cpu, &bus) {
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
