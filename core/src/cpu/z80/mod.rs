mod alu;
mod bit;
mod block;
mod ed;
mod index;
mod stack;

use crate::core::{Bus, Notify};
use crate::cpu::state::{CpuStateTrait, IntMode, Z80State};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

pub(crate) const FLAG_53: u8 = Flag::Y as u8 | Flag::X as u8;
pub(crate) const FLAG_SZ: u8 = Flag::S as u8 | Flag::Z as u8;
pub(crate) const FLAG_SZP: u8 = FLAG_SZ | Flag::PV as u8;
pub(crate) const FLAG_SZHN: u8 = FLAG_SZ | Flag::H as u8 | Flag::N as u8;
pub(crate) const FLAG_SZHP: u8 = FLAG_SZP | Flag::H as u8;

pub struct Z80 {
    // Registers
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub sp: u16,
    pub pc: u16,
    pub memptr: u16, // Hidden WZ register

    // S/Z/5/H/3/PV/N packed; bit 0 always clear. Several rotates read and
    // write carry independently of the packed byte, so it lives apart.
    f: u8,
    carry: bool,

    // Refresh counter: 7 counted bits; bit 7 is only written by LD R,A.
    r: u8,
    r_bit7: bool,

    // Interrupt and control state
    pub iff1: bool,
    pub iff2: bool,
    pub im: IntMode,
    pub halted: bool,
    pub pending_ei: bool,
    int_line: bool,
    nmi_pending: bool,
    pin_reset: bool,

    // Active opcode prefix surviving across step() calls (0 = none).
    // Only DD/FD/ED chains park here; CB resolves within one step.
    prefix: u8,

    // Q tracking: whether the current/previous instruction touched F.
    flag_q: bool,
    last_flag_q: bool,

    exec_done: bool,
    breakpoints: Box<[bool; 0x10000]>,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        let mut cpu = Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_prime: 0,
            f_prime: 0,
            b_prime: 0,
            c_prime: 0,
            d_prime: 0,
            e_prime: 0,
            h_prime: 0,
            l_prime: 0,
            ix: 0,
            iy: 0,
            i: 0,
            sp: 0,
            pc: 0,
            memptr: 0,
            f: 0,
            carry: false,
            r: 0,
            r_bit7: false,
            iff1: false,
            iff2: false,
            im: IntMode::Im0,
            halted: false,
            pending_ei: false,
            int_line: false,
            nmi_pending: false,
            pin_reset: false,
            prefix: 0,
            flag_q: false,
            last_flag_q: false,
            exec_done: false,
            breakpoints: Box::new([false; 0x10000]),
        };
        cpu.reset();
        cpu
    }

    // --- 16-bit register pairs ---

    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    pub fn get_af(&self) -> u16 { ((self.a as u16) << 8) | self.flags() as u16 }
    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.set_flags(val as u8);
    }

    pub fn get_af_prime(&self) -> u16 { ((self.a_prime as u16) << 8) | self.f_prime as u16 }
    pub fn set_af_prime(&mut self, val: u16) {
        self.a_prime = (val >> 8) as u8;
        self.f_prime = val as u8;
    }

    pub fn get_bc_prime(&self) -> u16 { ((self.b_prime as u16) << 8) | self.c_prime as u16 }
    pub fn set_bc_prime(&mut self, val: u16) {
        self.b_prime = (val >> 8) as u8;
        self.c_prime = val as u8;
    }

    pub fn get_de_prime(&self) -> u16 { ((self.d_prime as u16) << 8) | self.e_prime as u16 }
    pub fn set_de_prime(&mut self, val: u16) {
        self.d_prime = (val >> 8) as u8;
        self.e_prime = val as u8;
    }

    pub fn get_hl_prime(&self) -> u16 { ((self.h_prime as u16) << 8) | self.l_prime as u16 }
    pub fn set_hl_prime(&mut self, val: u16) {
        self.h_prime = (val >> 8) as u8;
        self.l_prime = val as u8;
    }

    /// I in the high byte, full 8-bit R in the low byte, the value the
    /// refresh machinery holds on the address bus during internal cycles.
    pub fn get_ir(&self) -> u16 {
        ((self.i as u16) << 8) | self.get_r() as u16
    }

    // --- Refresh register ---

    pub fn get_r(&self) -> u8 {
        if self.r_bit7 { (self.r & 0x7f) | 0x80 } else { self.r & 0x7f }
    }

    pub fn set_r(&mut self, val: u8) {
        self.r = val & 0x7f;
        self.r_bit7 = val > 0x7f;
    }

    // One increment per opcode byte fetched, prefixes included. Bit 7 is
    // untouched by the counting.
    fn inc_r(&mut self) {
        self.r = (self.r + 1) & 0x7f;
    }

    // --- Flags ---

    /// Packed flag byte, carry folded back into bit 0.
    pub fn flags(&self) -> u8 {
        if self.carry { self.f | Flag::C as u8 } else { self.f }
    }

    pub fn set_flags(&mut self, val: u8) {
        self.f = val & 0xfe;
        self.carry = (val & Flag::C as u8) != 0;
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::C => self.carry,
            _ => (self.f & flag as u8) != 0,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        match flag {
            Flag::C => self.carry = on,
            _ => {
                if on {
                    self.f |= flag as u8;
                } else {
                    self.f &= !(flag as u8);
                }
            }
        }
    }

    // --- 8-bit register file by decode index ---

    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    /// 16-bit register pair by decode index (0=BC, 1=DE, 2=HL, 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_hl(),
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    // --- Breakpoints ---

    pub fn set_breakpoint(&mut self, addr: u16, on: bool) {
        self.breakpoints[addr as usize] = on;
    }

    pub fn is_breakpoint(&self, addr: u16) -> bool {
        self.breakpoints[addr as usize]
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.fill(false);
    }

    // --- Interrupt lines and control ---

    /// Assert/deassert the maskable-interrupt line from the host side.
    /// `step` samples the OR of this and `Bus::int_line`.
    pub fn set_int_line(&mut self, active: bool) {
        self.int_line = active;
    }

    pub fn int_line(&self) -> bool {
        self.int_line
    }

    /// Latch a non-maskable interrupt edge; auto-clears when serviced.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Fire `Notify::exec_done` after every completed instruction.
    pub fn set_exec_done(&mut self, on: bool) {
        self.exec_done = on;
    }

    /// Prefix byte parked between `step` calls, or 0 when the next fetch
    /// starts a fresh instruction.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Request that the next `reset()` behaves like the /RESET pin: PC,
    /// refresh, interrupt state and prefix are forced, registers survive.
    pub fn set_pin_reset(&mut self) {
        self.pin_reset = true;
    }

    pub fn reset(&mut self) {
        if self.pin_reset {
            self.pin_reset = false;
        } else {
            // Full power-on pattern: everything reads back as ones.
            self.a = 0xff;
            self.set_flags(0xff);
            self.b = 0xff;
            self.c = 0xff;
            self.d = 0xff;
            self.e = 0xff;
            self.h = 0xff;
            self.l = 0xff;
            self.a_prime = 0xff;
            self.f_prime = 0xff;
            self.b_prime = 0xff;
            self.c_prime = 0xff;
            self.d_prime = 0xff;
            self.e_prime = 0xff;
            self.h_prime = 0xff;
            self.l_prime = 0xff;
            self.ix = 0xffff;
            self.iy = 0xffff;
            self.sp = 0xffff;
            self.memptr = 0xffff;
        }

        self.pc = 0;
        self.i = 0;
        self.r = 0;
        self.r_bit7 = false;
        self.iff1 = false;
        self.iff2 = false;
        self.im = IntMode::Im0;
        self.halted = false;
        self.pending_ei = false;
        self.int_line = false;
        self.nmi_pending = false;
        self.last_flag_q = false;
        self.prefix = 0;
    }

    /// Import a snapshot. `flag_q` restarts cleared; only the previous
    /// instruction's bit matters for SCF/CCF and that one round-trips.
    pub fn restore(&mut self, state: &Z80State) {
        self.a = state.a;
        self.set_flags(state.f);
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.a_prime = state.a_prime;
        self.f_prime = state.f_prime;
        self.b_prime = state.b_prime;
        self.c_prime = state.c_prime;
        self.d_prime = state.d_prime;
        self.e_prime = state.e_prime;
        self.h_prime = state.h_prime;
        self.l_prime = state.l_prime;
        self.ix = state.ix;
        self.iy = state.iy;
        self.sp = state.sp;
        self.pc = state.pc;
        self.i = state.i;
        self.set_r(state.r);
        self.memptr = state.memptr;
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.im = state.im;
        self.halted = state.halted;
        self.int_line = state.int_line;
        self.pending_ei = state.pending_ei;
        self.nmi_pending = state.nmi_pending;
        self.flag_q = false;
        self.last_flag_q = state.last_flag_q;
        self.prefix = 0;
    }

    /// Execute one fetch-decode-execute unit of work.
    ///
    /// A DD/FD/ED prefix byte chained behind another prefix parks in
    /// `prefix` and completes on the next call; interrupt sampling is
    /// suppressed until the instruction fully resolves.
    pub fn step<B, N>(&mut self, bus: &mut B, notify: &mut N)
    where
        B: Bus + ?Sized,
        N: Notify + ?Sized,
    {
        let mut opcode = bus.fetch_opcode(self.pc);
        self.inc_r();
        if self.prefix == 0 && self.breakpoints[self.pc as usize] {
            opcode = notify.breakpoint(self.pc, opcode);
        }
        self.pc = self.pc.wrapping_add(1);

        match self.prefix {
            0x00 => {
                self.flag_q = false;
                self.pending_ei = false;
                self.decode_main(opcode, bus, notify);
            }
            0xDD => {
                self.prefix = 0;
                self.ix = self.decode_index(opcode, self.ix, bus, notify);
            }
            0xED => {
                self.prefix = 0;
                self.decode_ed(opcode, bus);
            }
            0xFD => {
                self.prefix = 0;
                self.iy = self.decode_index(opcode, self.iy, bus, notify);
            }
            other => unreachable!("corrupt prefix state {:#04x}", other),
        }

        if self.prefix != 0 {
            return;
        }

        self.last_flag_q = self.flag_q;
        if self.exec_done {
            notify.exec_done();
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            self.nmi(bus);
            return;
        }

        if self.iff1 && !self.pending_ei && (self.int_line || bus.int_line()) {
            self.interrupt(bus);
        }
    }

    /// Maskable interrupt acknowledge. Both flip-flops drop; the vector
    /// depends on the mode (IM0 is serviced as RST 38h, assuming the
    /// device drives 0xFF).
    fn interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.last_flag_q = false;
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        bus.interrupt_delay(7);
        self.inc_r();
        self.iff1 = false;
        self.iff2 = false;
        let pc = self.pc;
        self.push(pc, bus);
        self.pc = match self.im {
            IntMode::Im2 => {
                let table = ((self.i as u16) << 8) | bus.int_vector() as u16;
                bus.read_word(table)
            }
            _ => 0x0038,
        };
        self.memptr = self.pc;
    }

    /// Non-maskable interrupt: the fetch in progress is abandoned (its
    /// address was still clocked onto the bus), IFF1 drops but IFF2 keeps
    /// the pre-NMI enable state for RETN.
    fn nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.last_flag_q = false;
        bus.fetch_opcode(self.pc);
        bus.interrupt_delay(1);
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.inc_r();
        self.iff1 = false;
        let pc = self.pc;
        self.push(pc, bus);
        self.pc = 0x0066;
        self.memptr = 0x0066;
    }

    /// Condition code by decode index: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, index: u8) -> bool {
        match index {
            0 => (self.f & Flag::Z as u8) == 0,
            1 => (self.f & Flag::Z as u8) != 0,
            2 => !self.carry,
            3 => self.carry,
            4 => (self.f & Flag::PV as u8) == 0,
            5 => (self.f & Flag::PV as u8) != 0,
            6 => (self.f & Flag::S as u8) == 0,
            7 => (self.f & Flag::S as u8) != 0,
            _ => unreachable!("condition called with index {}", index),
        }
    }

    /// Unprefixed opcode table. Every slot is total; timing beyond the
    /// already-charged M1 fetch comes from the bus calls each arm makes.
    fn decode_main<B, N>(&mut self, opcode: u8, bus: &mut B, notify: &mut N)
    where
        B: Bus + ?Sized,
        N: Notify + ?Sized,
    {
        match opcode {
            // NOP
            0x00 => {}

            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = bus.read_word(self.pc);
                self.set_rp((opcode >> 4) & 3, val);
                self.pc = self.pc.wrapping_add(2);
            }

            // LD (BC), A
            0x02 => {
                bus.write(self.get_bc(), self.a);
                self.memptr = ((self.a as u16) << 8) | self.c.wrapping_add(1) as u16;
            }

            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                bus.address_on_bus(self.get_ir(), 2);
                let idx = (opcode >> 4) & 3;
                let val = self.get_rp(idx).wrapping_add(1);
                self.set_rp(idx, val);
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let idx = (opcode >> 3) & 7;
                let val = self.inc8(self.get_reg8(idx));
                self.set_reg8(idx, val);
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let idx = (opcode >> 3) & 7;
                let val = self.dec8(self.get_reg8(idx));
                self.set_reg8(idx, val);
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let val = bus.read(self.pc);
                self.set_reg8((opcode >> 3) & 7, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // RLCA
            0x07 => {
                self.carry = self.a > 0x7f;
                self.a = (self.a << 1) | u8::from(self.carry);
                self.f = (self.f & FLAG_SZP) | (self.a & FLAG_53);
                self.flag_q = true;
            }

            // EX AF, AF'
            0x08 => {
                let a = self.a;
                self.a = self.a_prime;
                self.a_prime = a;
                let f = self.flags();
                self.set_flags(self.f_prime);
                self.f_prime = f;
            }

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                bus.address_on_bus(self.get_ir(), 7);
                let oper = self.get_rp((opcode >> 4) & 3);
                let res = self.add16(self.get_hl(), oper);
                self.set_hl(res);
            }

            // LD A, (BC)
            0x0A => {
                self.memptr = self.get_bc();
                self.a = bus.read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
            }

            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => {
                bus.address_on_bus(self.get_ir(), 2);
                let idx = (opcode >> 4) & 3;
                let val = self.get_rp(idx).wrapping_sub(1);
                self.set_rp(idx, val);
            }

            // RRCA
            0x0F => {
                self.carry = (self.a & 0x01) != 0;
                self.a = (self.a >> 1) | (u8::from(self.carry) << 7);
                self.f = (self.f & FLAG_SZP) | (self.a & FLAG_53);
                self.flag_q = true;
            }

            // DJNZ e
            0x10 => {
                bus.address_on_bus(self.get_ir(), 1);
                let offset = bus.read(self.pc) as i8;
                self.b = self.b.wrapping_sub(1);
                if self.b != 0 {
                    bus.address_on_bus(self.pc, 5);
                    self.pc = self.pc.wrapping_add(offset as u16).wrapping_add(1);
                    self.memptr = self.pc;
                } else {
                    self.pc = self.pc.wrapping_add(1);
                }
            }

            // LD (DE), A
            0x12 => {
                bus.write(self.get_de(), self.a);
                self.memptr = ((self.a as u16) << 8) | self.e.wrapping_add(1) as u16;
            }

            // RLA
            0x17 => {
                let old_carry = self.carry;
                self.carry = self.a > 0x7f;
                self.a = (self.a << 1) | u8::from(old_carry);
                self.f = (self.f & FLAG_SZP) | (self.a & FLAG_53);
                self.flag_q = true;
            }

            // JR e
            0x18 => {
                let offset = bus.read(self.pc) as i8;
                bus.address_on_bus(self.pc, 5);
                self.pc = self.pc.wrapping_add(offset as u16).wrapping_add(1);
                self.memptr = self.pc;
            }

            // LD A, (DE)
            0x1A => {
                self.memptr = self.get_de();
                self.a = bus.read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
            }

            // RRA
            0x1F => {
                let old_carry = self.carry;
                self.carry = (self.a & 0x01) != 0;
                self.a = (self.a >> 1) | (u8::from(old_carry) << 7);
                self.f = (self.f & FLAG_SZP) | (self.a & FLAG_53);
                self.flag_q = true;
            }

            // JR cc, e (NZ/Z/NC/C only)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = bus.read(self.pc) as i8;
                if self.condition((opcode >> 3) & 3) {
                    bus.address_on_bus(self.pc, 5);
                    self.pc = self.pc.wrapping_add(offset as u16);
                    self.memptr = self.pc.wrapping_add(1);
                }
                self.pc = self.pc.wrapping_add(1);
            }

            // LD (nn), HL
            0x22 => {
                self.memptr = bus.read_word(self.pc);
                bus.write_word(self.memptr, self.get_hl());
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // DAA
            0x27 => self.daa(),

            // LD HL, (nn)
            0x2A => {
                self.memptr = bus.read_word(self.pc);
                let val = bus.read_word(self.memptr);
                self.set_hl(val);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // CPL
            0x2F => {
                self.a ^= 0xff;
                self.f = (self.f & FLAG_SZP)
                    | Flag::H as u8
                    | Flag::N as u8
                    | (self.a & FLAG_53);
                self.flag_q = true;
            }

            // LD (nn), A
            0x32 => {
                self.memptr = bus.read_word(self.pc);
                bus.write(self.memptr, self.a);
                self.memptr =
                    ((self.a as u16) << 8) | (self.memptr.wrapping_add(1) & 0x00ff);
                self.pc = self.pc.wrapping_add(2);
            }

            // INC (HL)
            0x34 => {
                let addr = self.get_hl();
                let val = bus.read(addr);
                let val = self.inc8(val);
                bus.address_on_bus(addr, 1);
                bus.write(addr, val);
            }

            // DEC (HL)
            0x35 => {
                let addr = self.get_hl();
                let val = bus.read(addr);
                let val = self.dec8(val);
                bus.address_on_bus(addr, 1);
                bus.write(addr, val);
            }

            // LD (HL), n
            0x36 => {
                let val = bus.read(self.pc);
                bus.write(self.get_hl(), val);
                self.pc = self.pc.wrapping_add(1);
            }

            // SCF: undocumented 5/3 depend on whether the previous
            // instruction touched flags (Q) and on A.
            0x37 => {
                let q = if self.last_flag_q { self.f } else { 0 };
                self.carry = true;
                self.f = (self.f & FLAG_SZP) | (((q ^ self.f) | self.a) & FLAG_53);
                self.flag_q = true;
            }

            // LD A, (nn)
            0x3A => {
                self.memptr = bus.read_word(self.pc);
                self.a = bus.read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // CCF: same Q interplay as SCF; old carry becomes half-carry.
            0x3F => {
                let q = if self.last_flag_q { self.f } else { 0 };
                self.f = (self.f & FLAG_SZP) | (((q ^ self.f) | self.a) & FLAG_53);
                if self.carry {
                    self.f |= Flag::H as u8;
                }
                self.carry = !self.carry;
                self.flag_q = true;
            }

            // HALT: PC backs up so the fetch loop re-executes the slot
            // until an interrupt wakes it.
            0x76 => {
                self.pc = self.pc.wrapping_sub(1);
                self.halted = true;
            }

            // LD r, r' / LD r, (HL) / LD (HL), r
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                if src == 6 {
                    let val = bus.read(self.get_hl());
                    self.set_reg8(dst, val);
                } else if dst == 6 {
                    bus.write(self.get_hl(), self.get_reg8(src));
                } else {
                    let val = self.get_reg8(src);
                    self.set_reg8(dst, val);
                }
            }

            // ALU A, r / ALU A, (HL)
            0x80..=0xBF => {
                let val = if (opcode & 7) == 6 {
                    bus.read(self.get_hl())
                } else {
                    self.get_reg8(opcode & 7)
                };
                self.alu_op((opcode >> 3) & 7, val);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                bus.address_on_bus(self.get_ir(), 1);
                if self.condition((opcode >> 3) & 7) {
                    self.pc = self.pop(bus);
                    self.memptr = self.pc;
                }
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 => {
                let val = self.pop(bus);
                self.set_rp((opcode >> 4) & 3, val);
            }
            0xF1 => {
                let val = self.pop(bus);
                self.set_af(val);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                self.memptr = bus.read_word(self.pc);
                if self.condition((opcode >> 3) & 7) {
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                }
            }

            // JP nn
            0xC3 => {
                self.memptr = bus.read_word(self.pc);
                self.pc = self.memptr;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                self.memptr = bus.read_word(self.pc);
                if self.condition((opcode >> 3) & 7) {
                    bus.address_on_bus(self.pc.wrapping_add(1), 1);
                    let ret = self.pc.wrapping_add(2);
                    self.push(ret, bus);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                }
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 => {
                bus.address_on_bus(self.get_ir(), 1);
                let val = self.get_rp((opcode >> 4) & 3);
                self.push(val, bus);
            }
            0xF5 => {
                bus.address_on_bus(self.get_ir(), 1);
                let val = self.get_af();
                self.push(val, bus);
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = bus.read(self.pc);
                self.alu_op((opcode >> 3) & 7, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                bus.address_on_bus(self.get_ir(), 1);
                let pc = self.pc;
                self.push(pc, bus);
                self.pc = (opcode & 0x38) as u16;
                self.memptr = self.pc;
            }

            // RET
            0xC9 => {
                self.pc = self.pop(bus);
                self.memptr = self.pc;
            }

            // CB prefix: resolves within this step (own fetch + refresh)
            0xCB => self.decode_cb(bus),

            // CALL nn
            0xCD => {
                self.memptr = bus.read_word(self.pc);
                bus.address_on_bus(self.pc.wrapping_add(1), 1);
                let ret = self.pc.wrapping_add(2);
                self.push(ret, bus);
                self.pc = self.memptr;
            }

            // OUT (n), A
            0xD3 => {
                let n = bus.read(self.pc);
                self.memptr = (self.a as u16) << 8;
                bus.port_write(self.memptr | n as u16, self.a);
                self.memptr |= n.wrapping_add(1) as u16;
                self.pc = self.pc.wrapping_add(1);
            }

            // EXX
            0xD9 => {
                core::mem::swap(&mut self.b, &mut self.b_prime);
                core::mem::swap(&mut self.c, &mut self.c_prime);
                core::mem::swap(&mut self.d, &mut self.d_prime);
                core::mem::swap(&mut self.e, &mut self.e_prime);
                core::mem::swap(&mut self.h, &mut self.h_prime);
                core::mem::swap(&mut self.l, &mut self.l_prime);
            }

            // IN A, (n)
            0xDB => {
                self.memptr = ((self.a as u16) << 8) | bus.read(self.pc) as u16;
                self.a = bus.port_read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(1);
            }

            // DD prefix: IX context for the next opcode
            0xDD => {
                let sub = bus.fetch_opcode(self.pc);
                self.inc_r();
                self.pc = self.pc.wrapping_add(1);
                self.ix = self.decode_index(sub, self.ix, bus, notify);
            }

            // EX (SP), HL
            0xE3 => {
                let hl = self.get_hl();
                let val = bus.read_word(self.sp);
                self.set_hl(val);
                bus.address_on_bus(self.sp.wrapping_add(1), 1);
                bus.write(self.sp.wrapping_add(1), (hl >> 8) as u8);
                bus.write(self.sp, hl as u8);
                bus.address_on_bus(self.sp, 2);
                self.memptr = self.get_hl();
            }

            // JP (HL)
            0xE9 => self.pc = self.get_hl(),

            // EX DE, HL
            0xEB => {
                core::mem::swap(&mut self.d, &mut self.h);
                core::mem::swap(&mut self.e, &mut self.l);
            }

            // ED prefix
            0xED => {
                let sub = bus.fetch_opcode(self.pc);
                self.inc_r();
                self.pc = self.pc.wrapping_add(1);
                self.decode_ed(sub, bus);
            }

            // DI
            0xF3 => {
                self.iff1 = false;
                self.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                bus.address_on_bus(self.get_ir(), 2);
                self.sp = self.get_hl();
            }

            // EI: interrupt sampling suppressed for one instruction
            0xFB => {
                self.iff1 = true;
                self.iff2 = true;
                self.pending_ei = true;
            }

            // FD prefix: IY context for the next opcode
            0xFD => {
                let sub = bus.fetch_opcode(self.pc);
                self.inc_r();
                self.pc = self.pc.wrapping_add(1);
                self.iy = self.decode_index(sub, self.iy, bus, notify);
            }
        }
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.flags(),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.get_r(),
            memptr: self.memptr,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
            int_line: self.int_line,
            pending_ei: self.pending_ei,
            nmi_pending: self.nmi_pending,
            last_flag_q: self.last_flag_q,
        }
    }
}
