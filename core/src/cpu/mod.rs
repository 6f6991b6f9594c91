// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, IntMode, Z80State};

// Z80 CPU
pub mod z80;
pub use z80::{Flag, Z80};
