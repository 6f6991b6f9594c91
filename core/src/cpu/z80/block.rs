//! Block transfer, compare and I/O primitives (LDI/LDD, CPI/CPD, INI/IND,
//! OUTI/OUTD). The repeating forms live in the ED table and re-run these
//! with the program counter wound back.

use super::alu::{SZ53N_ADD, SZ53N_SUB, SZ53PN_ADD};
use super::{Flag, Z80, FLAG_SZ, FLAG_SZHN};
use crate::core::Bus;

impl Z80 {
    // Shared flag tail for LDI/LDD: 5/3 come from (transferred byte + A),
    // PV mirrors BC != 0, carry is untouched.
    fn ldx_flags(&mut self, transferred: u8) {
        let n = transferred.wrapping_add(self.a);
        self.f = (self.f & FLAG_SZ) | (n & Flag::X as u8);
        if (n & Flag::N as u8) != 0 {
            self.f |= Flag::Y as u8;
        }
        if self.b != 0 || self.c != 0 {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
    }

    pub(crate) fn ldi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let val = bus.read(self.get_hl());
        let de = self.get_de();
        bus.write(de, val);
        bus.address_on_bus(de, 2);
        self.set_hl(self.get_hl().wrapping_add(1));
        self.set_de(de.wrapping_add(1));
        self.set_bc(self.get_bc().wrapping_sub(1));
        self.ldx_flags(val);
    }

    pub(crate) fn ldd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let val = bus.read(self.get_hl());
        let de = self.get_de();
        bus.write(de, val);
        bus.address_on_bus(de, 2);
        self.set_hl(self.get_hl().wrapping_sub(1));
        self.set_de(de.wrapping_sub(1));
        self.set_bc(self.get_bc().wrapping_sub(1));
        self.ldx_flags(val);
    }

    // Shared body for CPI/CPD: a CP with carry preserved, then 5/3 from
    // A - mem - H (the half-borrow from the compare itself).
    fn cpx<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let hl = self.get_hl();
        let mem = bus.read(hl);
        let carry = self.carry;
        self.cp_a(mem);
        self.carry = carry;
        bus.address_on_bus(hl, 5);
        let n = self
            .a
            .wrapping_sub(mem)
            .wrapping_sub(u8::from((self.f & Flag::H as u8) != 0));
        self.f = (self.f & FLAG_SZHN) | (n & Flag::X as u8);
        if (n & Flag::N as u8) != 0 {
            self.f |= Flag::Y as u8;
        }
    }

    pub(crate) fn cpi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.cpx(bus);
        self.set_hl(self.get_hl().wrapping_add(1));
        self.set_bc(self.get_bc().wrapping_sub(1));
        if self.b != 0 || self.c != 0 {
            self.f |= Flag::PV as u8;
        }
        self.memptr = self.memptr.wrapping_add(1);
        self.flag_q = true;
    }

    pub(crate) fn cpd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.cpx(bus);
        self.set_hl(self.get_hl().wrapping_sub(1));
        self.set_bc(self.get_bc().wrapping_sub(1));
        if self.b != 0 || self.c != 0 {
            self.f |= Flag::PV as u8;
        }
        self.memptr = self.memptr.wrapping_sub(1);
        self.flag_q = true;
    }

    // Flag tail for INI/IND: most flags track the decremented B; carry and
    // half-carry track (input + adjusted C) overflowing a byte, and parity
    // mixes the low bits of that sum with B.
    fn inx_flags(&mut self, input: u8, c_adjusted: u8) {
        self.f = SZ53PN_ADD[self.b as usize];
        if input > 0x7f {
            self.f |= Flag::N as u8;
        }
        self.carry = false;
        let tmp = input as u16 + c_adjusted as u16;
        if tmp > 0xff {
            self.f |= Flag::H as u8;
            self.carry = true;
        }
        if (SZ53PN_ADD[(((tmp as u8) & 0x07) ^ self.b) as usize] & Flag::PV as u8) != 0 {
            self.f |= Flag::PV as u8;
        } else {
            self.f &= !(Flag::PV as u8);
        }
        self.flag_q = true;
    }

    pub(crate) fn ini<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.memptr = self.get_bc();
        bus.address_on_bus(self.get_ir(), 1);
        let input = bus.port_read(self.memptr);
        bus.write(self.get_hl(), input);
        self.memptr = self.memptr.wrapping_add(1);
        self.b = self.b.wrapping_sub(1);
        self.set_hl(self.get_hl().wrapping_add(1));
        self.inx_flags(input, self.c.wrapping_add(1));
    }

    pub(crate) fn ind<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.memptr = self.get_bc();
        bus.address_on_bus(self.get_ir(), 1);
        let input = bus.port_read(self.memptr);
        bus.write(self.get_hl(), input);
        self.memptr = self.memptr.wrapping_sub(1);
        self.b = self.b.wrapping_sub(1);
        self.set_hl(self.get_hl().wrapping_sub(1));
        self.inx_flags(input, self.c.wrapping_sub(1));
    }

    // Flag tail for OUTI/OUTD: table pick by the output byte's sign folds
    // N in; carry/half and parity use L (already moved) plus the output.
    fn outx_flags(&mut self, output: u8) {
        self.carry = false;
        self.f = if output > 0x7f {
            SZ53N_SUB[self.b as usize]
        } else {
            SZ53N_ADD[self.b as usize]
        };
        let tmp = self.l as u16 + output as u16;
        if tmp > 0xff {
            self.f |= Flag::H as u8;
            self.carry = true;
        }
        if (SZ53PN_ADD[(((tmp as u8) & 0x07) ^ self.b) as usize] & Flag::PV as u8) != 0 {
            self.f |= Flag::PV as u8;
        }
        self.flag_q = true;
    }

    pub(crate) fn outi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        bus.address_on_bus(self.get_ir(), 1);
        self.b = self.b.wrapping_sub(1);
        self.memptr = self.get_bc();
        let output = bus.read(self.get_hl());
        bus.port_write(self.memptr, output);
        self.memptr = self.memptr.wrapping_add(1);
        self.set_hl(self.get_hl().wrapping_add(1));
        self.outx_flags(output);
    }

    pub(crate) fn outd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        bus.address_on_bus(self.get_ir(), 1);
        self.b = self.b.wrapping_sub(1);
        self.memptr = self.get_bc();
        let output = bus.read(self.get_hl());
        bus.port_write(self.memptr, output);
        self.memptr = self.memptr.wrapping_sub(1);
        self.set_hl(self.get_hl().wrapping_sub(1));
        self.outx_flags(output);
    }
}
