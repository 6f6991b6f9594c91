/// Memory/port bus consumed by the CPU core.
///
/// The bus is the timing authority: every access charges T-states into the
/// bus's cumulative counter. The core never keeps its own clock; it asks
/// for bus time (`address_on_bus`) or non-bus time (`interrupt_delay`) and
/// reads the total back through `tstates`.
pub trait Bus {
    /// Opcode fetch (M1 cycle). Charges 4 T-states.
    fn fetch_opcode(&mut self, addr: u16) -> u8;

    /// Memory read. Charges 3 T-states.
    fn read(&mut self, addr: u16) -> u8;

    /// Memory write. Charges 3 T-states.
    fn write(&mut self, addr: u16, data: u8);

    /// 16-bit read as two byte accesses, low byte first.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        ((hi as u16) << 8) | lo as u16
    }

    /// 16-bit write as two byte accesses, low byte first.
    fn write_word(&mut self, addr: u16, word: u16) {
        self.write(addr, word as u8);
        self.write(addr.wrapping_add(1), (word >> 8) as u8);
    }

    /// Read from I/O port address space (separate from memory on Z80).
    /// Charges 4 T-states.
    fn port_read(&mut self, port: u16) -> u8;

    /// Write to I/O port address space. Charges 4 T-states.
    fn port_write(&mut self, port: u16, data: u8);

    /// The address is held on the bus with no transfer for `tstates` cycles
    /// (internal CPU operation, e.g. the 16-bit add stall).
    fn address_on_bus(&mut self, addr: u16, tstates: u32);

    /// Non-bus stall during interrupt acknowledge.
    fn interrupt_delay(&mut self, tstates: u32);

    /// Level of the maskable-interrupt request line.
    fn int_line(&self) -> bool {
        false
    }

    /// Byte the interrupting device drives on the data bus during the IM2
    /// acknowledge cycle. Real devices usually drive 0xFF.
    fn int_vector(&self) -> u8 {
        0xff
    }

    /// Cumulative T-state counter.
    fn tstates(&self) -> u64;

    /// Zero the T-state counter.
    fn reset(&mut self);
}
