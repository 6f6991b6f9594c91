//! ED-prefixed decode: 16-bit carry arithmetic, register/port transfers,
//! interrupt-mode control and the block instruction families. Unassigned
//! slots execute as two-fetch no-ops.

use super::alu::{SZ53N_ADD, SZ53PN_ADD};
use super::{Flag, Z80};
use crate::core::Bus;
use crate::cpu::state::IntMode;

impl Z80 {
    pub(crate) fn decode_ed<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        match opcode {
            // IN r, (C): carry survives, everything else from the input
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x78 => {
                self.memptr = self.get_bc();
                let val = bus.port_read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.set_reg8((opcode >> 3) & 7, val);
                self.f = SZ53PN_ADD[val as usize];
                self.flag_q = true;
            }

            // IN (C): input discarded, flags still set
            0x70 => {
                self.memptr = self.get_bc();
                let val = bus.port_read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.f = SZ53PN_ADD[val as usize];
                self.flag_q = true;
            }

            // OUT (C), r
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x79 => {
                self.memptr = self.get_bc();
                bus.port_write(self.memptr, self.get_reg8((opcode >> 3) & 7));
                self.memptr = self.memptr.wrapping_add(1);
            }

            // OUT (C): drives zero
            0x71 => {
                self.memptr = self.get_bc();
                bus.port_write(self.memptr, 0x00);
                self.memptr = self.memptr.wrapping_add(1);
            }

            // SBC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 => {
                bus.address_on_bus(self.get_ir(), 7);
                let oper = self.get_rp((opcode >> 4) & 3);
                self.sbc16(oper);
            }

            // ADC HL, rr
            0x4A | 0x5A | 0x6A | 0x7A => {
                bus.address_on_bus(self.get_ir(), 7);
                let oper = self.get_rp((opcode >> 4) & 3);
                self.adc16(oper);
            }

            // LD (nn), rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                self.memptr = bus.read_word(self.pc);
                bus.write_word(self.memptr, self.get_rp((opcode >> 4) & 3));
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                self.memptr = bus.read_word(self.pc);
                let val = bus.read_word(self.memptr);
                self.set_rp((opcode >> 4) & 3, val);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // IM 0 / IM 1 / IM 2 (with undocumented aliases)
            0x46 | 0x4E | 0x66 | 0x6E => self.im = IntMode::Im0,
            0x56 | 0x76 => self.im = IntMode::Im1,
            0x5E | 0x7E => self.im = IntMode::Im2,

            // LD I, A
            0x47 => {
                bus.address_on_bus(self.get_ir(), 1);
                self.i = self.a;
            }

            // LD R, A is the only writer of R's bit 7
            0x4F => {
                bus.address_on_bus(self.get_ir(), 1);
                let a = self.a;
                self.set_r(a);
            }

            // LD A, I: PV reflects IFF2 unless an interrupt is being
            // requested at this very moment
            0x57 => {
                bus.address_on_bus(self.get_ir(), 1);
                self.a = self.i;
                self.f = SZ53N_ADD[self.a as usize];
                if self.iff2 && !(self.int_line || bus.int_line()) {
                    self.f |= Flag::PV as u8;
                }
                self.flag_q = true;
            }

            // LD A, R
            0x5F => {
                bus.address_on_bus(self.get_ir(), 1);
                self.a = self.get_r();
                self.f = SZ53N_ADD[self.a as usize];
                if self.iff2 && !(self.int_line || bus.int_line()) {
                    self.f |= Flag::PV as u8;
                }
                self.flag_q = true;
            }

            // RRD / RLD
            0x67 => self.rrd(bus),
            0x6F => self.rld(bus),

            // NEG (documented 0x44 plus aliases)
            op if (op & 0xC7) == 0x44 => {
                let aux = self.a;
                self.a = 0;
                self.sub_a(aux);
            }

            // RETN / RETI: both restore IFF1 from IFF2
            op if (op & 0xC7) == 0x45 => {
                self.iff1 = self.iff2;
                self.pc = self.pop(bus);
                self.memptr = self.pc;
            }

            // Block primitives
            0xA0 => self.ldi(bus),
            0xA1 => self.cpi(bus),
            0xA2 => self.ini(bus),
            0xA3 => self.outi(bus),
            0xA8 => self.ldd(bus),
            0xA9 => self.cpd(bus),
            0xAA => self.ind(bus),
            0xAB => self.outd(bus),

            // LDIR: repeat while BC != 0 (PV after the primitive)
            0xB0 => {
                self.ldi(bus);
                if (self.f & Flag::PV as u8) != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    bus.address_on_bus(self.get_de().wrapping_sub(1), 5);
                }
            }

            // CPIR: repeat while BC != 0 and no match
            0xB1 => {
                self.cpi(bus);
                if (self.f & Flag::PV as u8) != 0
                    && (self.f & Flag::Z as u8) == 0
                {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    bus.address_on_bus(self.get_hl().wrapping_sub(1), 5);
                }
            }

            // INIR
            0xB2 => {
                self.ini(bus);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    bus.address_on_bus(self.get_hl().wrapping_sub(1), 5);
                }
            }

            // OTIR
            0xB3 => {
                self.outi(bus);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    bus.address_on_bus(self.get_bc(), 5);
                }
            }

            // LDDR
            0xB8 => {
                self.ldd(bus);
                if (self.f & Flag::PV as u8) != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    bus.address_on_bus(self.get_de().wrapping_add(1), 5);
                }
            }

            // CPDR
            0xB9 => {
                self.cpd(bus);
                if (self.f & Flag::PV as u8) != 0
                    && (self.f & Flag::Z as u8) == 0
                {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    bus.address_on_bus(self.get_hl().wrapping_add(1), 5);
                }
            }

            // INDR
            0xBA => {
                self.ind(bus);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    bus.address_on_bus(self.get_hl().wrapping_add(1), 5);
                }
            }

            // OTDR
            0xBB => {
                self.outd(bus);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    bus.address_on_bus(self.get_bc(), 5);
                }
            }

            // Chained prefixes: the next step call resolves them
            0xDD | 0xED | 0xFD => self.prefix = opcode,

            // Every remaining slot behaves as an 8 T-state no-op
            _ => {}
        }
    }
}
