pub mod core;
pub mod cpu;

pub mod prelude {
    pub use crate::core::{Bus, Notify, NullNotify};
    pub use crate::cpu::{CpuStateTrait, IntMode, Z80, Z80State};
}
