/// Execution-time notification channel supplied by the host.
///
/// This is the core's single behavioral extension point. Hooks are called
/// synchronously from inside `step` and must not call back into the core.
pub trait Notify {
    /// Called once per non-prefixed opcode fetch at a flagged address. The
    /// return value replaces the fetched opcode, which lets a harness
    /// rewrite the instruction stream (e.g. inject a RET at a trap address).
    fn breakpoint(&mut self, _addr: u16, opcode: u8) -> u8 {
        opcode
    }

    /// Fired after every completed instruction while trace mode is enabled
    /// via `Z80::set_exec_done`.
    fn exec_done(&mut self) {}
}

/// No-op notification sink for hosts that use neither hook.
pub struct NullNotify;

impl Notify for NullNotify {}
