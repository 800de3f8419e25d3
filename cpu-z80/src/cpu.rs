//! The Z80 system: registers, RAM, ports, and the execution harness.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Intentional i8 casts for displacements.

use std::io::{self, Write};

use emu_core::{IoPorts, Memory, NullPorts};

use crate::flags::Tables;
use crate::registers::Registers;

// Instruction execution split into a separate file for readability.
mod execute;

/// DD/FD prefix state for the instruction currently being decoded.
///
/// Selects whether HL-addressed operations use IX or IY instead, and
/// whether the H/L sub-register selectors mean IXH/IXL or IYH/IYL. Reset
/// to `None` at the start of every instruction; it never persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    Dd,
    Fd,
}

/// Construction options for [`System`].
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// RAM size in bytes. The CPU masks addresses to 16 bits, so anything
    /// below the full 64 KiB is the host's own risk.
    pub ram_size: usize,
    /// Initial program counter.
    pub initial_pc: u16,
    /// Install the CP/M BDOS stub at 0x0005 and service calls to it.
    pub cpm_stub: bool,
    /// Treat a transfer of control to address 0 as program exit. This is
    /// the convention stand-alone Z80 test binaries rely on; hosts that
    /// legitimately execute code at address 0 can turn it off.
    pub stop_on_zero: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            ram_size: 0x10000,
            initial_pc: 0x0100,
            cpm_stub: false,
            stop_on_zero: true,
        }
    }
}

/// A Z80 CPU wired to flat RAM and I/O ports.
///
/// `execute_instruction` is the sole mutator: it retires exactly one
/// instruction per call (block-repeat forms run to completion within a
/// single call). The system is strictly single-threaded; a host wanting
/// concurrency must wrap the whole thing in its own synchronization.
pub struct System {
    pub(crate) regs: Registers,
    memory: Memory,
    ports: Box<dyn IoPorts>,
    /// Sink for CP/M console output. Raw 8-bit bytes, no translation.
    console: Box<dyn Write>,
    tables: &'static Tables,
    prefix: Prefix,
    running: bool,
    starting: bool,
    cpm_stub: bool,
    stop_on_zero: bool,
}

impl System {
    /// Create a system with `ram_size` bytes of zeroed RAM and PC at
    /// `initial_pc`. Ports read idle; console output goes to stdout.
    #[must_use]
    pub fn new(ram_size: usize, initial_pc: u16) -> Self {
        Self::with_config(&SystemConfig {
            ram_size,
            initial_pc,
            ..SystemConfig::default()
        })
    }

    /// Create a system from explicit options.
    #[must_use]
    pub fn with_config(config: &SystemConfig) -> Self {
        let mut memory = Memory::new(config.ram_size);
        if config.cpm_stub {
            // BDOS entry: a lone RET, intercepted by the RET handler.
            memory.set_byte(0x0005, 0xC9);
            // Pseudo-address read by CP/M programs via LD HL,(0x0006).
            memory.set_word(0x0006, 0x06E4);
        }
        Self {
            regs: Registers::new(config.initial_pc),
            memory,
            ports: Box::new(NullPorts),
            console: Box::new(io::stdout()),
            tables: Tables::get(),
            prefix: Prefix::None,
            running: true,
            starting: true,
            cpm_stub: config.cpm_stub,
            stop_on_zero: config.stop_on_zero,
        }
    }

    /// Replace the I/O port implementation.
    pub fn set_ports(&mut self, ports: Box<dyn IoPorts>) {
        self.ports = ports;
    }

    /// Redirect CP/M console output.
    pub fn set_console(&mut self, console: Box<dyn Write>) {
        self.console = console;
    }

    /// Whether the program is still running. Cleared by HALT, RST 0,
    /// a transfer of control to address 0, or [`System::stop`].
    #[must_use]
    pub fn running(&self) -> bool {
        self.running
    }

    /// Request termination at the next instruction boundary.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Run until the program terminates.
    pub fn run(&mut self) {
        while self.running {
            self.execute_instruction();
        }
    }

    /// The register file.
    #[must_use]
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Mutable access to the register file, for harnesses that need to
    /// preload state.
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// The system RAM.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to RAM, primarily for loading program images.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    // =========================================================================
    // Fetch and stack primitives
    // =========================================================================

    /// Read the byte at PC and advance past it.
    fn fetch_byte(&mut self) -> u8 {
        let value = self.memory.get_byte(self.regs.pc);
        self.regs.inc_pc();
        value
    }

    /// Read a little-endian word at PC and advance past it.
    fn fetch_word(&mut self) -> u16 {
        let low = self.fetch_byte();
        let high = self.fetch_byte();
        u16::from(low) | (u16::from(high) << 8)
    }

    /// Push a word: SP -= 2, then store. The stack grows downward and SP
    /// wraps modulo 64 KiB.
    fn push(&mut self, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        self.memory.set_word(self.regs.sp, value);
    }

    /// Pop a word: load, then SP += 2.
    fn pop(&mut self) -> u16 {
        let value = self.memory.get_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    // =========================================================================
    // Prefix-aware operand selection
    // =========================================================================

    /// The HL-class register selected by the current prefix.
    fn index_reg(&self) -> u16 {
        match self.prefix {
            Prefix::None => self.regs.hl(),
            Prefix::Dd => self.regs.ix,
            Prefix::Fd => self.regs.iy,
        }
    }

    fn set_index_reg(&mut self, value: u16) {
        match self.prefix {
            Prefix::None => self.regs.set_hl(value),
            Prefix::Dd => self.regs.ix = value,
            Prefix::Fd => self.regs.iy = value,
        }
    }

    /// Effective address for the r=6 memory operand: HL, or IX/IY plus a
    /// signed displacement byte consumed here.
    fn operand_addr(&mut self) -> u16 {
        match self.prefix {
            Prefix::None => self.regs.hl(),
            Prefix::Dd => {
                let d = self.fetch_byte() as i8;
                self.regs.ix.wrapping_add(d as u16)
            }
            Prefix::Fd => {
                let d = self.fetch_byte() as i8;
                self.regs.iy.wrapping_add(d as u16)
            }
        }
    }

    /// Get a register by 3-bit encoding, ignoring the prefix.
    ///
    /// The r=6 slot is the memory operand and is handled by callers.
    fn get_reg8(&self, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => unreachable!("(HL) is not a simple register"),
        }
    }

    /// Set a register by 3-bit encoding, ignoring the prefix.
    fn set_reg8(&mut self, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => unreachable!("(HL) is not a simple register"),
        }
    }

    /// Get a register by 3-bit encoding; under DD/FD the H/L slots mean
    /// the index register halves (undocumented IXH/IXL/IYH/IYL).
    fn get_reg8_indexed(&self, r: u8) -> u8 {
        match (r & 7, self.prefix) {
            (4, Prefix::Dd) => self.regs.ixh(),
            (5, Prefix::Dd) => self.regs.ixl(),
            (4, Prefix::Fd) => self.regs.iyh(),
            (5, Prefix::Fd) => self.regs.iyl(),
            (r, _) => self.get_reg8(r),
        }
    }

    /// Set a register by 3-bit encoding with index-half substitution.
    fn set_reg8_indexed(&mut self, r: u8, value: u8) {
        match (r & 7, self.prefix) {
            (4, Prefix::Dd) => self.regs.set_ixh(value),
            (5, Prefix::Dd) => self.regs.set_ixl(value),
            (4, Prefix::Fd) => self.regs.set_iyh(value),
            (5, Prefix::Fd) => self.regs.set_iyl(value),
            (r, _) => self.set_reg8(r, value),
        }
    }

    /// Get a register pair by 2-bit encoding (BC, DE, HL-class, SP).
    fn get_reg16(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.index_reg(),
            _ => self.regs.sp,
        }
    }

    /// Set a register pair by 2-bit encoding.
    fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_index_reg(value),
            _ => self.regs.sp = value,
        }
    }

    /// Get a register pair for PUSH/POP, where slot 3 is AF not SP.
    fn get_reg16_af(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.index_reg(),
            _ => self.regs.af(),
        }
    }

    /// Set a register pair for PUSH/POP.
    fn set_reg16_af(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_index_reg(value),
            _ => self.regs.set_af(value),
        }
    }

    // =========================================================================
    // CP/M BDOS stub
    // =========================================================================

    /// Minimal BDOS dispatch, run when the stub RET at 0x0005 executes.
    ///
    /// Function 2 prints the character in E; function 9 prints the
    /// `$`-terminated string at DE. Everything else is reported and
    /// ignored. Execution continues normally afterwards.
    fn bdos_call(&mut self) {
        match self.regs.c {
            2 => {
                let _ = self.console.write_all(&[self.regs.e]);
                let _ = self.console.flush();
            }
            9 => {
                let mut addr = self.regs.de();
                loop {
                    let ch = self.memory.get_byte(addr);
                    if ch == b'$' {
                        break;
                    }
                    let _ = self.console.write_all(&[ch]);
                    addr = addr.wrapping_add(1);
                }
                let _ = self.console.flush();
            }
            function => {
                let _ = writeln!(self.console, "Unhandled BDOS call {function:02X}");
            }
        }
    }
}
