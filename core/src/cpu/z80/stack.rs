//! Stack primitives. Pushes write high byte first at SP-1, then low byte
//! at SP-2; pops read as one little-endian word.

use super::Z80;
use crate::core::Bus;

impl Z80 {
    pub(crate) fn push<B: Bus + ?Sized>(&mut self, word: u16, bus: &mut B) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (word >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, word as u8);
    }

    pub(crate) fn pop<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let word = bus.read_word(self.sp);
        self.sp = self.sp.wrapping_add(2);
        word
    }
}
