//! DD/FD-prefixed decode. Only the opcodes that actually involve H, L,
//! (HL) or the HL pair are redirected at the index register; anything else
//! falls through to the plain table, re-checking breakpoints because a
//! full unprefixed instruction executes there.

use super::Z80;
use crate::core::{Bus, Notify};

impl Z80 {
    // Effective address of (IXY+d). Displacement is sign-extended and the
    // sum wraps within 64K.
    fn index_addr<B: Bus + ?Sized>(&mut self, ixy: u16, bus: &mut B) -> u16 {
        let offset = bus.read(self.pc) as i8;
        ixy.wrapping_add(offset as u16)
    }

    pub(crate) fn decode_index<B, N>(
        &mut self,
        opcode: u8,
        mut ixy: u16,
        bus: &mut B,
        notify: &mut N,
    ) -> u16
    where
        B: Bus + ?Sized,
        N: Notify + ?Sized,
    {
        match opcode {
            // ADD IXY, rr (rr index 2 is the index register itself)
            0x09 | 0x19 | 0x29 | 0x39 => {
                bus.address_on_bus(self.get_ir(), 7);
                let oper = match (opcode >> 4) & 3 {
                    0 => self.get_bc(),
                    1 => self.get_de(),
                    2 => ixy,
                    _ => self.sp,
                };
                ixy = self.add16(ixy, oper);
            }

            // LD IXY, nn
            0x21 => {
                ixy = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
            }

            // LD (nn), IXY
            0x22 => {
                self.memptr = bus.read_word(self.pc);
                bus.write_word(self.memptr, ixy);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // INC IXY
            0x23 => {
                bus.address_on_bus(self.get_ir(), 2);
                ixy = ixy.wrapping_add(1);
            }

            // INC IXYh / DEC IXYh / LD IXYh, n
            0x24 => {
                let hi = self.inc8((ixy >> 8) as u8);
                ixy = ((hi as u16) << 8) | (ixy & 0x00ff);
            }
            0x25 => {
                let hi = self.dec8((ixy >> 8) as u8);
                ixy = ((hi as u16) << 8) | (ixy & 0x00ff);
            }
            0x26 => {
                ixy = ((bus.read(self.pc) as u16) << 8) | (ixy & 0x00ff);
                self.pc = self.pc.wrapping_add(1);
            }

            // LD IXY, (nn)
            0x2A => {
                self.memptr = bus.read_word(self.pc);
                ixy = bus.read_word(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.pc = self.pc.wrapping_add(2);
            }

            // DEC IXY
            0x2B => {
                bus.address_on_bus(self.get_ir(), 2);
                ixy = ixy.wrapping_sub(1);
            }

            // INC IXYl / DEC IXYl / LD IXYl, n
            0x2C => {
                let lo = self.inc8(ixy as u8);
                ixy = (ixy & 0xff00) | lo as u16;
            }
            0x2D => {
                let lo = self.dec8(ixy as u8);
                ixy = (ixy & 0xff00) | lo as u16;
            }
            0x2E => {
                ixy = (ixy & 0xff00) | bus.read(self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
            }

            // INC (IXY+d)
            0x34 => {
                self.memptr = self.index_addr(ixy, bus);
                bus.address_on_bus(self.pc, 5);
                let val = bus.read(self.memptr);
                let val = self.inc8(val);
                bus.address_on_bus(self.memptr, 1);
                bus.write(self.memptr, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // DEC (IXY+d)
            0x35 => {
                self.memptr = self.index_addr(ixy, bus);
                bus.address_on_bus(self.pc, 5);
                let val = bus.read(self.memptr);
                let val = self.dec8(val);
                bus.address_on_bus(self.memptr, 1);
                bus.write(self.memptr, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // LD (IXY+d), n
            0x36 => {
                self.memptr = self.index_addr(ixy, bus);
                self.pc = self.pc.wrapping_add(1);
                let val = bus.read(self.pc);
                bus.address_on_bus(self.pc, 2);
                self.pc = self.pc.wrapping_add(1);
                bus.write(self.memptr, val);
            }

            // LD r, IXYh
            0x44 | 0x4C | 0x54 | 0x5C | 0x7C => {
                self.set_reg8((opcode >> 3) & 7, (ixy >> 8) as u8);
            }

            // LD r, IXYl
            0x45 | 0x4D | 0x55 | 0x5D | 0x7D => {
                self.set_reg8((opcode >> 3) & 7, ixy as u8);
            }

            // LD r, (IXY+d) (including the real H and L)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
                self.memptr = self.index_addr(ixy, bus);
                bus.address_on_bus(self.pc, 5);
                let val = bus.read(self.memptr);
                self.set_reg8((opcode >> 3) & 7, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // LD IXYh, r / LD IXYh, IXYl
            0x60 | 0x61 | 0x62 | 0x63 | 0x67 => {
                let val = self.get_reg8(opcode & 7);
                ixy = ((val as u16) << 8) | (ixy & 0x00ff);
            }
            0x64 => {}
            0x65 => ixy = ((ixy & 0x00ff) << 8) | (ixy & 0x00ff),

            // LD IXYl, r / LD IXYl, IXYh
            0x68 | 0x69 | 0x6A | 0x6B | 0x6F => {
                let val = self.get_reg8(opcode & 7);
                ixy = (ixy & 0xff00) | val as u16;
            }
            0x6C => ixy = (ixy & 0xff00) | (ixy >> 8),
            0x6D => {}

            // LD (IXY+d), r (the real H and L for 0x74/0x75)
            0x70 | 0x71 | 0x72 | 0x73 | 0x74 | 0x75 | 0x77 => {
                self.memptr = self.index_addr(ixy, bus);
                bus.address_on_bus(self.pc, 5);
                bus.write(self.memptr, self.get_reg8(opcode & 7));
                self.pc = self.pc.wrapping_add(1);
            }

            // ALU A, IXYh
            0x84 | 0x8C | 0x94 | 0x9C | 0xA4 | 0xAC | 0xB4 | 0xBC => {
                self.alu_op((opcode >> 3) & 7, (ixy >> 8) as u8);
            }

            // ALU A, IXYl
            0x85 | 0x8D | 0x95 | 0x9D | 0xA5 | 0xAD | 0xB5 | 0xBD => {
                self.alu_op((opcode >> 3) & 7, ixy as u8);
            }

            // ALU A, (IXY+d)
            0x86 | 0x8E | 0x96 | 0x9E | 0xA6 | 0xAE | 0xB6 | 0xBE => {
                self.memptr = self.index_addr(ixy, bus);
                bus.address_on_bus(self.pc, 5);
                let val = bus.read(self.memptr);
                self.alu_op((opcode >> 3) & 7, val);
                self.pc = self.pc.wrapping_add(1);
            }

            // DD CB / FD CB: displacement first, then the sub-opcode as a
            // plain read with no refresh increment
            0xCB => {
                self.memptr = self.index_addr(ixy, bus);
                self.pc = self.pc.wrapping_add(1);
                let sub = bus.read(self.pc);
                bus.address_on_bus(self.pc, 2);
                self.pc = self.pc.wrapping_add(1);
                let addr = self.memptr;
                self.decode_index_cb(sub, addr, bus);
            }

            // POP IXY
            0xE1 => ixy = self.pop(bus),

            // EX (SP), IXY
            0xE3 => {
                let work = ixy;
                ixy = bus.read_word(self.sp);
                bus.address_on_bus(self.sp.wrapping_add(1), 1);
                bus.write(self.sp.wrapping_add(1), (work >> 8) as u8);
                bus.write(self.sp, work as u8);
                bus.address_on_bus(self.sp, 2);
                self.memptr = ixy;
            }

            // PUSH IXY
            0xE5 => {
                bus.address_on_bus(self.get_ir(), 1);
                self.push(ixy, bus);
            }

            // JP (IXY)
            0xE9 => self.pc = ixy,

            // LD SP, IXY
            0xF9 => {
                bus.address_on_bus(self.get_ir(), 2);
                self.sp = ixy;
            }

            // Chained prefixes
            0xDD | 0xED | 0xFD => self.prefix = opcode,

            // The prefix had no effect: execute as a plain opcode. PC has
            // already moved past this byte, so the breakpoint test lands
            // on the following address.
            _ => {
                let opcode = if self.breakpoints[self.pc as usize] {
                    notify.breakpoint(self.pc, opcode)
                } else {
                    opcode
                };
                self.decode_main(opcode, bus, notify);
            }
        }

        ixy
    }
}
