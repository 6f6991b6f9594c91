use quartz_core::core::Bus;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory with T-state-by-T-state recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Fetch,
    Read,
    Write,
    PortRead,
    PortWrite,
    Internal,
}

impl BusOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Fetch => "f",
            BusOp::Read => "r",
            BusOp::Write => "w",
            BusOp::PortRead => "pr",
            BusOp::PortWrite => "pw",
            BusOp::Internal => "i",
        }
    }
}

/// One T-state of bus activity. The first T-state of an access carries the
/// address, data and kind; the remaining T-states of that access are filler
/// entries so that the trace length always equals the elapsed T-states.
#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: Option<u16>,
    pub data: Option<u8>,
    pub op: Option<BusOp>,
}

pub struct TracingBus {
    pub memory: Box<[u8; 0x10000]>,
    pub cycles: Vec<BusCycle>,
    /// Values handed out by `port_read`, in order. Exhausted reads see 0xff.
    pub port_queue: Vec<u8>,
    port_cursor: usize,
    pub port_log: Vec<(u16, u8, BusOp)>,
    pub int_line: bool,
    pub int_vector: u8,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            cycles: Vec::new(),
            port_queue: Vec::new(),
            port_cursor: 0,
            port_log: Vec::new(),
            int_line: false,
            int_vector: 0xff,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    fn record(&mut self, addr: u16, data: u8, op: BusOp, tstates: u32) {
        self.cycles.push(BusCycle {
            addr: Some(addr),
            data: Some(data),
            op: Some(op),
        });
        for _ in 1..tstates {
            self.cycles.push(BusCycle {
                addr: None,
                data: None,
                op: None,
            });
        }
    }

    /// The recorded trace in the JSON vector shape.
    pub fn trace(&self) -> Vec<CycleEntry> {
        self.cycles
            .iter()
            .map(|c| (c.addr, c.data, c.op.map(|op| op.as_str().to_string())))
            .collect()
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn fetch_opcode(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.record(addr, data, BusOp::Fetch, 4);
        data
    }

    fn read(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.record(addr, data, BusOp::Read, 3);
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.record(addr, data, BusOp::Write, 3);
    }

    fn port_read(&mut self, port: u16) -> u8 {
        let data = if self.port_cursor < self.port_queue.len() {
            let v = self.port_queue[self.port_cursor];
            self.port_cursor += 1;
            v
        } else {
            0xff
        };
        self.port_log.push((port, data, BusOp::PortRead));
        self.record(port, data, BusOp::PortRead, 4);
        data
    }

    fn port_write(&mut self, port: u16, data: u8) {
        self.port_log.push((port, data, BusOp::PortWrite));
        self.record(port, data, BusOp::PortWrite, 4);
    }

    fn address_on_bus(&mut self, addr: u16, tstates: u32) {
        if tstates == 0 {
            return;
        }
        self.cycles.push(BusCycle {
            addr: Some(addr),
            data: None,
            op: Some(BusOp::Internal),
        });
        for _ in 1..tstates {
            self.cycles.push(BusCycle {
                addr: Some(addr),
                data: None,
                op: None,
            });
        }
    }

    fn interrupt_delay(&mut self, tstates: u32) {
        for _ in 0..tstates {
            self.cycles.push(BusCycle {
                addr: None,
                data: None,
                op: Some(BusOp::Internal),
            });
        }
    }

    fn int_line(&self) -> bool {
        self.int_line
    }

    fn int_vector(&self) -> u8 {
        self.int_vector
    }

    fn tstates(&self) -> u64 {
        self.cycles.len() as u64
    }

    fn reset(&mut self) {
        self.cycles.clear();
    }
}

// --- JSON test vector types (SingleStepTests z80 v1 layout) ---

pub type CycleEntry = (Option<u16>, Option<u8>, Option<String>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    pub cycles: Vec<CycleEntry>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    /// EI executed on the previous instruction (interrupt accept deferred).
    pub ei: u8,
    /// The internal address latch, named WZ in period documentation.
    pub wz: u16,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    /// Parity of the flag byte copy, carried by some vector sets. Not modeled.
    #[serde(default)]
    pub p: u8,
    /// Whether the previous instruction modified the flag register.
    pub q: u8,
    pub iff1: u8,
    pub iff2: u8,
    pub ram: Vec<(u16, u8)>,
}
