//! Instruction-accurate Zilog Z80 emulator.
//!
//! Executes Z80 machine code held in a flat 64 KiB address space:
//! documented and undocumented opcodes, all four prefix regimes
//! (none, `CB`, `DD`/`FD`, `DD CB`/`FD CB`), bit-exact flags including
//! the undocumented X/Y bits, and the block operations.
//!
//! [`System`] bundles the CPU with RAM and I/O ports and adds the
//! jump-to-zero termination convention used by stand-alone Z80 test
//! binaries such as ZEXALL, plus an optional CP/M BDOS stub for their
//! console output. Timing is not modeled: one `execute_instruction`
//! call retires one instruction.

mod cpu;
mod flags;
mod registers;

pub use cpu::{System, SystemConfig};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::Registers;

#[cfg(test)]
mod proptest_tests;
