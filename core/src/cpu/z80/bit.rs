//! CB-prefixed decode: rotates, shifts and single-bit operations, plus the
//! DD/FD CB variant that works on an indexed address and mirrors the result
//! into a register.

use super::{Z80, FLAG_53, FLAG_SZHP};
use crate::core::Bus;

impl Z80 {
    /// Rotate/shift family by decode index: RLC, RRC, RL, RR, SLA, SRA,
    /// SLL, SRL.
    fn shift_op(&mut self, family: u8, oper: u8) -> u8 {
        match family {
            0 => self.rlc(oper),
            1 => self.rrc(oper),
            2 => self.rl(oper),
            3 => self.rr(oper),
            4 => self.sla(oper),
            5 => self.sra(oper),
            6 => self.sll(oper),
            7 => self.srl(oper),
            _ => unreachable!("shift_op called with family {}", family),
        }
    }

    pub(crate) fn decode_cb<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let opcode = bus.fetch_opcode(self.pc);
        self.inc_r();
        self.pc = self.pc.wrapping_add(1);

        let reg = opcode & 7;
        let selector = (opcode >> 3) & 7;
        match opcode >> 6 {
            // Rotates and shifts
            0 => {
                if reg == 6 {
                    let addr = self.get_hl();
                    let val = bus.read(addr);
                    let res = self.shift_op(selector, val);
                    bus.address_on_bus(addr, 1);
                    bus.write(addr, res);
                } else {
                    let res = self.shift_op(selector, self.get_reg8(reg));
                    self.set_reg8(reg, res);
                }
            }

            // BIT n, r: the memory form takes bits 5/3 from MEMPTR's
            // high byte, not from the operand
            1 => {
                let mask = 1u8 << selector;
                if reg == 6 {
                    let addr = self.get_hl();
                    let val = bus.read(addr);
                    self.bit_test(mask, val);
                    self.f = (self.f & FLAG_SZHP) | (((self.memptr >> 8) as u8) & FLAG_53);
                    bus.address_on_bus(addr, 1);
                } else {
                    self.bit_test(mask, self.get_reg8(reg));
                }
            }

            // RES n, r / SET n, r
            _ => {
                let mask = 1u8 << selector;
                let set = opcode >= 0xC0;
                if reg == 6 {
                    let addr = self.get_hl();
                    let val = bus.read(addr);
                    let res = if set { val | mask } else { val & !mask };
                    bus.address_on_bus(addr, 1);
                    bus.write(addr, res);
                } else {
                    let val = self.get_reg8(reg);
                    let res = if set { val | mask } else { val & !mask };
                    self.set_reg8(reg, res);
                }
            }
        }
    }

    /// DD CB / FD CB decode. The displacement and sub-opcode were already
    /// consumed by the caller; every operation here works on `addr` and
    /// (except BIT) also lands in the register selected by bits 0-2.
    pub(crate) fn decode_index_cb<B: Bus + ?Sized>(
        &mut self,
        opcode: u8,
        addr: u16,
        bus: &mut B,
    ) {
        let selector = (opcode >> 3) & 7;
        match opcode >> 6 {
            0 => {
                let val = bus.read(addr);
                let res = self.shift_op(selector, val);
                bus.address_on_bus(addr, 1);
                bus.write(addr, res);
                self.copy_to_register(opcode, res);
            }

            1 => {
                let mask = 1u8 << selector;
                let val = bus.read(addr);
                self.bit_test(mask, val);
                self.f = (self.f & FLAG_SZHP) | (((addr >> 8) as u8) & FLAG_53);
                bus.address_on_bus(addr, 1);
            }

            _ => {
                let mask = 1u8 << selector;
                let set = opcode >= 0xC0;
                let val = bus.read(addr);
                let res = if set { val | mask } else { val & !mask };
                bus.address_on_bus(addr, 1);
                bus.write(addr, res);
                self.copy_to_register(opcode, res);
            }
        }
    }

    // Undocumented mirror of the indexed CB result into the register file;
    // index 6 is the pure memory form.
    fn copy_to_register(&mut self, opcode: u8, val: u8) {
        let reg = opcode & 7;
        if reg != 6 {
            self.set_reg8(reg, val);
        }
    }
}
