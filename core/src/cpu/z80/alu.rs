//! Arithmetic and logic primitives shared by every decode table.
//!
//! Flag results come from four precomputed 256-entry tables holding the
//! S/Z/5/3 (and parity) pattern for each result byte; the per-operation
//! half-carry and overflow bits are layered on top.

use super::{Flag, Z80, FLAG_53, FLAG_SZHN, FLAG_SZP};
use crate::core::Bus;

const fn sz53n(value: u8) -> u8 {
    let mut f = value & (Flag::S as u8 | FLAG_53);
    if value == 0 {
        f |= Flag::Z as u8;
    }
    f
}

const fn build_table(n: bool, parity: bool) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let v = i as u8;
        let mut f = sz53n(v);
        if n {
            f |= Flag::N as u8;
        }
        if parity && v.count_ones() % 2 == 0 {
            f |= Flag::PV as u8;
        }
        table[i] = f;
        i += 1;
    }
    table
}

/// S/Z/5/3 per result byte, N clear (additive operations).
pub(crate) const SZ53N_ADD: [u8; 256] = build_table(false, false);
/// S/Z/5/3 per result byte, N set (subtractive operations).
pub(crate) const SZ53N_SUB: [u8; 256] = build_table(true, false);
/// S/Z/5/3 plus even-parity bit, N clear.
pub(crate) const SZ53PN_ADD: [u8; 256] = build_table(false, true);
/// S/Z/5/3 plus even-parity bit, N set.
pub(crate) const SZ53PN_SUB: [u8; 256] = build_table(true, true);

impl Z80 {
    /// ALU group dispatch by decode index: ADD/ADC/SUB/SBC/AND/XOR/OR/CP.
    pub(crate) fn alu_op(&mut self, index: u8, oper: u8) {
        match index {
            0 => self.add_a(oper),
            1 => self.adc_a(oper),
            2 => self.sub_a(oper),
            3 => self.sbc_a(oper),
            4 => self.and_a(oper),
            5 => self.xor_a(oper),
            6 => self.or_a(oper),
            7 => self.cp_a(oper),
            _ => unreachable!("alu_op called with index {}", index),
        }
    }

    pub(crate) fn add_a(&mut self, oper: u8) {
        let res = self.a.wrapping_add(oper);
        self.carry = (self.a as u16 + oper as u16) > 0xff;
        self.f = SZ53N_ADD[res as usize];
        if (res & 0x0f) < (self.a & 0x0f) {
            self.f |= Flag::H as u8;
        }
        if ((self.a ^ !oper) & (self.a ^ res)) > 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.a = res;
        self.flag_q = true;
    }

    pub(crate) fn adc_a(&mut self, oper: u8) {
        let wide = self.a as u16 + oper as u16 + u16::from(self.carry);
        let res = wide as u8;
        self.carry = wide > 0xff;
        self.f = SZ53N_ADD[res as usize];
        if ((self.a ^ oper ^ res) & 0x10) != 0 {
            self.f |= Flag::H as u8;
        }
        if ((self.a ^ !oper) & (self.a ^ res)) > 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.a = res;
        self.flag_q = true;
    }

    pub(crate) fn sub_a(&mut self, oper: u8) {
        let res = self.a.wrapping_sub(oper);
        self.carry = (self.a as u16) < (oper as u16);
        self.f = SZ53N_SUB[res as usize];
        if (res & 0x0f) > (self.a & 0x0f) {
            self.f |= Flag::H as u8;
        }
        if ((self.a ^ oper) & (self.a ^ res)) > 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.a = res;
        self.flag_q = true;
    }

    pub(crate) fn sbc_a(&mut self, oper: u8) {
        let wide = (self.a as u16)
            .wrapping_sub(oper as u16)
            .wrapping_sub(u16::from(self.carry));
        let res = wide as u8;
        self.carry = (wide & 0x100) != 0;
        self.f = SZ53N_SUB[res as usize];
        if ((self.a ^ oper ^ res) & 0x10) != 0 {
            self.f |= Flag::H as u8;
        }
        if ((self.a ^ oper) & (self.a ^ res)) > 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.a = res;
        self.flag_q = true;
    }

    pub(crate) fn and_a(&mut self, oper: u8) {
        self.a &= oper;
        self.carry = false;
        self.f = SZ53PN_ADD[self.a as usize] | Flag::H as u8;
        self.flag_q = true;
    }

    pub(crate) fn xor_a(&mut self, oper: u8) {
        self.a ^= oper;
        self.carry = false;
        self.f = SZ53PN_ADD[self.a as usize];
        self.flag_q = true;
    }

    pub(crate) fn or_a(&mut self, oper: u8) {
        self.a |= oper;
        self.carry = false;
        self.f = SZ53PN_ADD[self.a as usize];
        self.flag_q = true;
    }

    /// Like SUB without storing the result; bits 5 and 3 come from the
    /// operand, not the difference.
    pub(crate) fn cp_a(&mut self, oper: u8) {
        let res = self.a.wrapping_sub(oper);
        self.carry = (self.a as u16) < (oper as u16);
        self.f = (SZ53N_ADD[oper as usize] & FLAG_53) | (SZ53N_SUB[res as usize] & FLAG_SZHN);
        if (res & 0x0f) > (self.a & 0x0f) {
            self.f |= Flag::H as u8;
        }
        if ((self.a ^ oper) & (self.a ^ res)) > 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
    }

    /// Carry is preserved; overflow fires crossing 0x7f -> 0x80.
    pub(crate) fn inc8(&mut self, oper: u8) -> u8 {
        let res = oper.wrapping_add(1);
        self.f = SZ53N_ADD[res as usize];
        if (res & 0x0f) == 0 {
            self.f |= Flag::H as u8;
        }
        if res == 0x80 {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
        res
    }

    /// Carry is preserved; overflow fires crossing 0x80 -> 0x7f.
    pub(crate) fn dec8(&mut self, oper: u8) -> u8 {
        let res = oper.wrapping_sub(1);
        self.f = SZ53N_SUB[res as usize];
        if (res & 0x0f) == 0x0f {
            self.f |= Flag::H as u8;
        }
        if res == 0x7f {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
        res
    }

    /// 16-bit add: S/Z/PV survive, 5/3 come from the result high byte,
    /// half-carry is carry out of bit 11.
    pub(crate) fn add16(&mut self, reg: u16, oper: u16) -> u16 {
        self.memptr = reg.wrapping_add(1);
        let wide = reg as u32 + oper as u32;
        self.carry = wide > 0xffff;
        let res = wide as u16;
        self.f = (self.f & FLAG_SZP) | (((res >> 8) as u8) & FLAG_53);
        if (res & 0x0fff) < (reg & 0x0fff) {
            self.f |= Flag::H as u8;
        }
        self.flag_q = true;
        res
    }

    /// ADC HL, rr: full flag set, zero computed over all 16 bits.
    pub(crate) fn adc16(&mut self, oper: u16) {
        let hl = self.get_hl();
        self.memptr = hl.wrapping_add(1);
        let wide = hl as u32 + oper as u32 + u32::from(self.carry);
        self.carry = wide > 0xffff;
        let res = wide as u16;
        self.set_hl(res);
        self.f = SZ53N_ADD[(res >> 8) as usize];
        if res != 0 {
            self.f &= !(Flag::Z as u8);
        }
        if ((res ^ hl ^ oper) & 0x1000) != 0 {
            self.f |= Flag::H as u8;
        }
        if ((hl ^ !oper) & (hl ^ res)) > 0x7fff {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
    }

    /// SBC HL, rr: full flag set, zero computed over all 16 bits.
    pub(crate) fn sbc16(&mut self, oper: u16) {
        let hl = self.get_hl();
        self.memptr = hl.wrapping_add(1);
        let wide = (hl as u32)
            .wrapping_sub(oper as u32)
            .wrapping_sub(u32::from(self.carry));
        self.carry = (wide & 0x10000) != 0;
        let res = wide as u16;
        self.set_hl(res);
        self.f = SZ53N_SUB[(res >> 8) as usize];
        if res != 0 {
            self.f &= !(Flag::Z as u8);
        }
        if ((res ^ hl ^ oper) & 0x1000) != 0 {
            self.f |= Flag::H as u8;
        }
        if ((hl ^ oper) & (hl ^ res)) > 0x7fff {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
    }

    /// BCD adjust. The correction is applied with ADD or SUB depending on
    /// the N flag, then half-carry from the adjust survives into the result.
    pub(crate) fn daa(&mut self) {
        let mut correction = 0u8;
        let mut carry = self.carry;

        if (self.f & Flag::H as u8) != 0 || (self.a & 0x0f) > 0x09 {
            correction = 0x06;
        }
        if carry || self.a > 0x99 {
            correction |= 0x60;
        }
        if self.a > 0x99 {
            carry = true;
        }
        if (self.f & Flag::N as u8) != 0 {
            self.sub_a(correction);
            self.f = (self.f & Flag::H as u8) | SZ53PN_SUB[self.a as usize];
        } else {
            self.add_a(correction);
            self.f = (self.f & Flag::H as u8) | SZ53PN_ADD[self.a as usize];
        }
        self.carry = carry;
        self.flag_q = true;
    }

    // --- Rotate and shift primitives (CB and indexed CB tables) ---

    pub(crate) fn rlc(&mut self, oper: u8) -> u8 {
        self.carry = oper > 0x7f;
        let res = (oper << 1) | u8::from(self.carry);
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn rrc(&mut self, oper: u8) -> u8 {
        self.carry = (oper & 0x01) != 0;
        let res = (oper >> 1) | (u8::from(self.carry) << 7);
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn rl(&mut self, oper: u8) -> u8 {
        let res = (oper << 1) | u8::from(self.carry);
        self.carry = oper > 0x7f;
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn rr(&mut self, oper: u8) -> u8 {
        let res = (oper >> 1) | (u8::from(self.carry) << 7);
        self.carry = (oper & 0x01) != 0;
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn sla(&mut self, oper: u8) -> u8 {
        self.carry = oper > 0x7f;
        let res = oper << 1;
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    /// Undocumented shift: like SLA but bit 0 comes in set.
    pub(crate) fn sll(&mut self, oper: u8) -> u8 {
        self.carry = oper > 0x7f;
        let res = (oper << 1) | 0x01;
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn sra(&mut self, oper: u8) -> u8 {
        self.carry = (oper & 0x01) != 0;
        let res = (oper & 0x80) | (oper >> 1);
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    pub(crate) fn srl(&mut self, oper: u8) -> u8 {
        self.carry = (oper & 0x01) != 0;
        let res = oper >> 1;
        self.f = SZ53PN_ADD[res as usize];
        self.flag_q = true;
        res
    }

    /// Nibble rotate left through A and (HL).
    pub(crate) fn rld<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low_a = self.a & 0x0f;
        self.memptr = self.get_hl();
        let mem = bus.read(self.memptr);
        self.a = (self.a & 0xf0) | (mem >> 4);
        bus.address_on_bus(self.memptr, 4);
        bus.write(self.memptr, (mem << 4) | low_a);
        self.f = SZ53PN_ADD[self.a as usize];
        self.memptr = self.memptr.wrapping_add(1);
        self.flag_q = true;
    }

    /// Nibble rotate right through A and (HL).
    pub(crate) fn rrd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low_a = (self.a & 0x0f) << 4;
        self.memptr = self.get_hl();
        let mem = bus.read(self.memptr);
        self.a = (self.a & 0xf0) | (mem & 0x0f);
        bus.address_on_bus(self.memptr, 4);
        bus.write(self.memptr, (mem >> 4) | low_a);
        self.f = SZ53PN_ADD[self.a as usize];
        self.memptr = self.memptr.wrapping_add(1);
        self.flag_q = true;
    }

    /// BIT n, r: Z and PV track the tested bit, 5/3 come from the operand
    /// (the indexed forms overwrite them afterwards).
    pub(crate) fn bit_test(&mut self, mask: u8, reg: u8) {
        let zero = (mask & reg) == 0;
        self.f = (SZ53N_ADD[reg as usize] & !FLAG_SZP) | Flag::H as u8;
        if zero {
            self.f |= Flag::PV as u8 | Flag::Z as u8;
        }
        if mask == 0x80 && !zero {
            self.f |= Flag::S as u8;
        }
        self.flag_q = true;
    }
}
