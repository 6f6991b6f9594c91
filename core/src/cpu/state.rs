//! CPU state snapshot types and traits

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// Maskable-interrupt service policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntMode {
    /// Device-supplied instruction on the data bus (serviced as RST 38h).
    #[default]
    Im0,
    /// Fixed vector 0x0038.
    Im1,
    /// Vector table lookup at (I << 8) | device byte.
    Im2,
}

/// Z80 CPU state snapshot.
///
/// A flat copy of every externally visible field, used only for
/// save/restore. `last_flag_q` must round-trip so a restored core computes
/// the SCF/CCF undocumented bits identically to the live run.
#[derive(Debug, Clone, PartialEq)]
pub struct Z80State {
    pub a: u8,             // Accumulator
    pub f: u8,             // Flags register (packed, carry included)
    pub b: u8,             // Register B
    pub c: u8,             // Register C
    pub d: u8,             // Register D
    pub e: u8,             // Register E
    pub h: u8,             // Register H
    pub l: u8,             // Register L
    pub a_prime: u8,       // Shadow accumulator
    pub f_prime: u8,       // Shadow flags
    pub b_prime: u8,       // Shadow B
    pub c_prime: u8,       // Shadow C
    pub d_prime: u8,       // Shadow D
    pub e_prime: u8,       // Shadow E
    pub h_prime: u8,       // Shadow H
    pub l_prime: u8,       // Shadow L
    pub ix: u16,           // Index register X
    pub iy: u16,           // Index register Y
    pub sp: u16,           // Stack pointer
    pub pc: u16,           // Program counter
    pub i: u8,             // Interrupt vector base register
    pub r: u8,             // Refresh register (7 counted bits + bit 7)
    pub memptr: u16,       // Hidden WZ register
    pub iff1: bool,        // Interrupt flip-flop 1
    pub iff2: bool,        // Interrupt flip-flop 2
    pub im: IntMode,       // Interrupt mode
    pub halted: bool,      // HALT state
    pub int_line: bool,    // Level of the maskable-interrupt line
    pub pending_ei: bool,  // EI executed, interrupt check suppressed once
    pub nmi_pending: bool, // Latched NMI edge awaiting service
    pub last_flag_q: bool, // Previous instruction modified flags (for SCF/CCF)
}
