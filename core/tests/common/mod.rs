#![allow(dead_code)]

use quartz_core::core::{Bus, NullNotify};
use quartz_core::cpu::Z80;

/// Minimal bus for testing: flat 64KB memory, one stubbed input port value,
/// a log of port writes, and the standard T-state charges per access.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub port_in: u8,
    pub port_reads: Vec<u16>,
    pub port_writes: Vec<(u16, u8)>,
    pub int_line: bool,
    pub int_vector: u8,
    tstates: u64,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            port_in: 0,
            port_reads: Vec::new(),
            port_writes: Vec::new(),
            int_line: false,
            int_vector: 0xff,
            tstates: 0,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
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

    fn port_read(&mut self, port: u16) -> u8 {
        self.tstates += 4;
        self.port_reads.push(port);
        self.port_in
    }

    fn port_write(&mut self, port: u16, data: u8) {
        self.tstates += 4;
        self.port_writes.push((port, data));
    }

    fn address_on_bus(&mut self, _addr: u16, tstates: u32) {
        self.tstates += tstates as u64;
    }

    fn interrupt_delay(&mut self, tstates: u32) {
        self.tstates += tstates as u64;
    }

    fn int_line(&self) -> bool {
        self.int_line
    }

    fn int_vector(&self) -> u8 {
        self.int_vector
    }

    fn tstates(&self) -> u64 {
        self.tstates
    }

    fn reset(&mut self) {
        self.tstates = 0;
    }
}

/// Run one `step` and return the T-states it consumed.
pub fn exec(cpu: &mut Z80, bus: &mut TestBus) -> u64 {
    let start = bus.tstates;
    cpu.step(bus, &mut NullNotify);
    bus.tstates - start
}

/// Fresh CPU with registers and flags zeroed for deterministic assertions.
pub fn test_cpu() -> Z80 {
    let mut cpu = Z80::new();
    cpu.a = 0;
    cpu.set_flags(0);
    cpu.b = 0;
    cpu.c = 0;
    cpu.d = 0;
    cpu.e = 0;
    cpu.h = 0;
    cpu.l = 0;
    cpu.ix = 0;
    cpu.iy = 0;
    cpu.sp = 0xff00;
    cpu.memptr = 0;
    cpu
}
