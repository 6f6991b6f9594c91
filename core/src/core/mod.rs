pub mod bus;
pub mod notify;

pub use bus::Bus;
pub use notify::{Notify, NullNotify};
