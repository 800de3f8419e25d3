//! Instruction decode and execution.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

use super::{Prefix, System};

impl System {
    /// Fetch, decode, and execute one instruction.
    ///
    /// Handles the termination convention and the DD/FD prefix state
    /// machine, then dispatches on the opcode byte. Block-repeat forms
    /// run to completion inside this call.
    pub fn execute_instruction(&mut self) {
        // Jump-to-zero is the exit convention for stand-alone test
        // binaries. `starting` suppresses it for the very first
        // instruction so a program may legitimately begin at 0.
        if self.regs.pc == 0 && !self.starting && self.stop_on_zero {
            self.running = false;
            return;
        }
        self.starting = false;

        self.prefix = Prefix::None;
        let mut op = self.fetch_byte();
        // A run of DD/FD bytes collapses to its last element: each prefix
        // displaces the previous one and applies to the next opcode.
        while op == 0xDD || op == 0xFD {
            self.prefix = if op == 0xDD { Prefix::Dd } else { Prefix::Fd };
            op = self.fetch_byte();
        }

        // A prefix in front of an opcode it cannot modify is dropped:
        // push the opcode back and re-decode it without the prefix on
        // the next call.
        if self.prefix != Prefix::None && !self.tables.prefixable[op as usize] {
            self.regs.pc = self.regs.pc.wrapping_sub(1);
            return;
        }

        self.dispatch(op);
    }

    fn dispatch(&mut self, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD (BC), A
            0x02 => {
                self.memory.set_byte(self.regs.bc(), self.regs.a);
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry;
                self.set_rotate_a_flags(carry);
            }

            // EX AF, AF'
            0x08 => self.regs.exchange_af(),

            // LD A, (BC)
            0x0A => {
                self.regs.a = self.memory.get_byte(self.regs.bc());
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry << 7);
                self.set_rotate_a_flags(carry);
            }

            // DJNZ e
            0x10 => {
                let displacement = self.fetch_byte() as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.regs.add_pc(displacement);
                }
            }

            // LD (DE), A
            0x12 => {
                self.memory.set_byte(self.regs.de(), self.regs.a);
            }

            // RLA
            0x17 => {
                let carry_in = self.regs.carry();
                let carry_out = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry_in;
                self.set_rotate_a_flags(carry_out);
            }

            // JR e
            0x18 => {
                let displacement = self.fetch_byte() as i8;
                self.regs.add_pc(displacement);
            }

            // LD A, (DE)
            0x1A => {
                self.regs.a = self.memory.get_byte(self.regs.de());
            }

            // RRA (carry shifts into bit 7)
            0x1F => {
                let carry_in = self.regs.carry();
                let carry_out = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry_in << 7);
                self.set_rotate_a_flags(carry_out);
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let displacement = self.fetch_byte() as i8;
                if self.regs.condition(((op >> 3) & 7) - 4) {
                    self.regs.add_pc(displacement);
                }
            }

            // LD (nn), HL
            0x22 => {
                let addr = self.fetch_word();
                self.memory.set_word(addr, self.index_reg());
            }

            // DAA
            0x27 => self.daa(),

            // LD HL, (nn)
            0x2A => {
                let addr = self.fetch_word();
                let value = self.memory.get_word(addr);
                self.set_index_reg(value);
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.f = (self.regs.f & (SF | ZF | PF | CF))
                    | HF
                    | NF
                    | (self.regs.a & (YF | XF));
            }

            // LD (nn), A
            0x32 => {
                let addr = self.fetch_word();
                self.memory.set_byte(addr, self.regs.a);
            }

            // SCF
            0x37 => {
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | CF | (self.regs.a & (YF | XF));
            }

            // LD A, (nn)
            0x3A => {
                let addr = self.fetch_word();
                self.regs.a = self.memory.get_byte(addr);
            }

            // CCF (old carry becomes half-carry)
            0x3F => {
                let old_carry = self.regs.carry();
                self.regs.f = (self.regs.f & (SF | ZF | PF))
                    | (self.regs.a & (YF | XF))
                    | (old_carry << 4)
                    | (old_carry ^ CF);
            }

            // HALT sits inside the LD r,r' range and must win.
            0x76 => self.running = false,

            // LD r1, r2
            0x40..=0x7F => self.ld_r_r(op),

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP r
            0x80..=0xBF => {
                let r = op & 7;
                let value = if r == 6 {
                    let addr = self.operand_addr();
                    self.memory.get_byte(addr)
                } else {
                    self.get_reg8_indexed(r)
                };
                self.alu_op((op >> 3) & 7, value);
            }

            // JP nn
            0xC3 => {
                let target = self.fetch_word();
                self.jump(target);
            }

            // RET (with the CP/M BDOS intercept when returning from 0x0005)
            0xC9 => {
                if self.cpm_stub && self.regs.pc == 0x0006 {
                    self.bdos_call();
                }
                let target = self.pop();
                self.jump(target);
            }

            // CB-prefixed bit operations
            0xCB => self.execute_cb(),

            // CALL nn
            0xCD => {
                let target = self.fetch_word();
                self.push(self.regs.pc);
                self.regs.pc = target;
            }

            // OUT (n), A
            0xD3 => {
                let port = self.fetch_byte();
                self.ports.output(port, self.regs.a);
            }

            // EXX
            0xD9 => self.regs.exchange(),

            // IN A, (n)
            0xDB => {
                let port = self.fetch_byte();
                self.regs.a = self.ports.input(port, self.regs.a);
            }

            // EX (SP), HL
            0xE3 => {
                let stacked = self.memory.get_word(self.regs.sp);
                self.memory.set_word(self.regs.sp, self.index_reg());
                self.set_index_reg(stacked);
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.index_reg();
            }

            // EX DE, HL (never IX/IY: the prefix does not apply here)
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
            }

            // ED-prefixed extended operations
            0xED => self.execute_ed(),

            // DI / EI: interrupts are not modeled, accepted as no-ops
            0xF3 | 0xFB => {}

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.index_reg();
            }

            // LD rr, nn
            _ if op & 0xCF == 0x01 => {
                let value = self.fetch_word();
                self.set_reg16((op >> 4) & 3, value);
            }

            // INC rr (no flags)
            _ if op & 0xCF == 0x03 => {
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // ADD HL, rr
            _ if op & 0xCF == 0x09 => self.add16(op),

            // DEC rr (no flags)
            _ if op & 0xCF == 0x0B => {
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // POP qq
            _ if op & 0xCF == 0xC1 => {
                let value = self.pop();
                self.set_reg16_af((op >> 4) & 3, value);
            }

            // PUSH qq
            _ if op & 0xCF == 0xC5 => {
                let value = self.get_reg16_af((op >> 4) & 3);
                self.push(value);
            }

            // INC r8
            _ if op & 0xC7 == 0x04 => {
                let new = self.read_modify_write_r8((op >> 3) & 7, |value| value.wrapping_add(1));
                self.regs.f = (self.regs.f & CF) | self.tables.szhv_inc[new as usize];
            }

            // DEC r8
            _ if op & 0xC7 == 0x05 => {
                let new = self.read_modify_write_r8((op >> 3) & 7, |value| value.wrapping_sub(1));
                self.regs.f = (self.regs.f & CF) | self.tables.szhv_dec[new as usize];
            }

            // LD r8, n
            _ if op & 0xC7 == 0x06 => {
                let r = (op >> 3) & 7;
                if r == 6 {
                    // Displacement precedes the immediate in DD 36 d n.
                    let addr = self.operand_addr();
                    let value = self.fetch_byte();
                    self.memory.set_byte(addr, value);
                } else {
                    let value = self.fetch_byte();
                    self.set_reg8_indexed(r, value);
                }
            }

            // RET cc
            _ if op & 0xC7 == 0xC0 => {
                if self.regs.condition((op >> 3) & 7) {
                    let target = self.pop();
                    self.jump(target);
                }
            }

            // JP cc, nn
            _ if op & 0xC7 == 0xC2 => {
                let target = self.fetch_word();
                if self.regs.condition((op >> 3) & 7) {
                    self.jump(target);
                }
            }

            // CALL cc, nn (operands consumed even when not taken)
            _ if op & 0xC7 == 0xC4 => {
                let target = self.fetch_word();
                if self.regs.condition((op >> 3) & 7) {
                    self.push(self.regs.pc);
                    self.regs.pc = target;
                }
            }

            // ALU immediate
            _ if op & 0xC7 == 0xC6 => {
                let value = self.fetch_byte();
                self.alu_op((op >> 3) & 7, value);
            }

            // RST p: only RST 0 is supported, as a termination instruction
            _ if op == 0xC7 => self.running = false,

            _ => panic!("unimplemented opcode {op:02X}"),
        }
    }

    /// Transfer control, honoring the jump-to-zero exit convention.
    fn jump(&mut self, target: u16) {
        self.regs.pc = target;
        if target == 0x0000 && self.stop_on_zero {
            self.running = false;
        }
    }

    /// Flags shared by RLCA/RRCA/RLA/RRA: S, Z, P preserved, Y/X from A.
    fn set_rotate_a_flags(&mut self, carry: u8) {
        self.regs.f = (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
    }

    /// Apply `transform` to the 8-bit operand selected by `r`, honoring
    /// the prefix for index halves and displaced memory. Returns the new
    /// value for flag computation.
    fn read_modify_write_r8(&mut self, r: u8, transform: impl Fn(u8) -> u8) -> u8 {
        if r == 6 {
            let addr = self.operand_addr();
            let new = transform(self.memory.get_byte(addr));
            self.memory.set_byte(addr, new);
            new
        } else {
            let new = transform(self.get_reg8_indexed(r));
            self.set_reg8_indexed(r, new);
            new
        }
    }

    /// LD r1, r2 in all its prefix variants.
    fn ld_r_r(&mut self, op: u8) {
        let dst = (op >> 3) & 7;
        let src = op & 7;
        if dst == 6 {
            // Only one side of a move can be displaced. When the target
            // is (IX+d)/(IY+d), the register side always means the plain
            // register, never an index half.
            let value = self.get_reg8(src);
            let addr = self.operand_addr();
            self.memory.set_byte(addr, value);
        } else if src == 6 {
            let addr = self.operand_addr();
            let value = self.memory.get_byte(addr);
            self.set_reg8(dst, value);
        } else {
            let value = self.get_reg8_indexed(src);
            self.set_reg8_indexed(dst, value);
        }
    }

    /// The eight accumulator operations selected by bits 5-3.
    fn alu_op(&mut self, family: u8, value: u8) {
        match family & 7 {
            // ADD A
            0 => {
                let old = self.regs.a;
                let new = old.wrapping_add(value);
                self.regs.a = new;
                self.regs.f = self.tables.add_flags(0, old, new);
            }
            // ADC A
            1 => {
                let carry = self.regs.carry();
                let old = self.regs.a;
                let new = old.wrapping_add(value).wrapping_add(carry);
                self.regs.a = new;
                self.regs.f = self.tables.add_flags(carry, old, new);
            }
            // SUB
            2 => {
                let old = self.regs.a;
                let new = old.wrapping_sub(value);
                self.regs.a = new;
                self.regs.f = self.tables.sub_flags(0, old, new);
            }
            // SBC A
            3 => {
                let carry = self.regs.carry();
                let old = self.regs.a;
                let new = old.wrapping_sub(value).wrapping_sub(carry);
                self.regs.a = new;
                self.regs.f = self.tables.sub_flags(carry, old, new);
            }
            // AND
            4 => {
                self.regs.a &= value;
                self.regs.f = self.tables.szp[self.regs.a as usize] | HF;
            }
            // XOR
            5 => {
                self.regs.a ^= value;
                self.regs.f = self.tables.szp[self.regs.a as usize];
            }
            // OR
            6 => {
                self.regs.a |= value;
                self.regs.f = self.tables.szp[self.regs.a as usize];
            }
            // CP: A unchanged, undocumented flags from the operand
            _ => {
                let old = self.regs.a;
                let new = old.wrapping_sub(value);
                self.regs.f =
                    (self.tables.sub_flags(0, old, new) & !(YF | XF)) | (value & (YF | XF));
            }
        }
    }

    /// ADD HL,rr (or IX/IY under prefix). S, Z, P are preserved; H is the
    /// bit-11 carry, C the bit-16 carry, Y/X come from the high byte.
    fn add16(&mut self, op: u8) {
        let dst = self.index_reg();
        let rr = self.get_reg16((op >> 4) & 3);
        let wide = u32::from(dst) + u32::from(rr);
        let result = wide as u16;
        self.set_index_reg(result);
        self.regs.f = (self.regs.f & (SF | ZF | PF))
            | ((((dst ^ result ^ rr) >> 8) as u8) & HF)
            | if wide > 0xFFFF { CF } else { 0 }
            | (((result >> 8) as u8) & (YF | XF));
    }

    /// DAA: decimal-adjust A after BCD addition or subtraction.
    fn daa(&mut self) {
        let a = self.regs.a;
        let f = self.regs.f;
        let mut adjusted = a;
        let mut carry = f & CF != 0;

        if f & NF == 0 {
            if f & HF != 0 || a & 0x0F > 9 {
                adjusted = adjusted.wrapping_add(0x06);
            }
            if carry || a > 0x99 {
                adjusted = adjusted.wrapping_add(0x60);
                carry = true;
            }
        } else {
            if f & HF != 0 || a & 0x0F > 9 {
                adjusted = adjusted.wrapping_sub(0x06);
            }
            if carry || a > 0x99 {
                adjusted = adjusted.wrapping_sub(0x60);
                carry = true;
            }
        }

        self.regs.a = adjusted;
        self.regs.f = (f & NF)
            | if carry { CF } else { 0 }
            | ((a ^ adjusted) & HF)
            | self.tables.szp[adjusted as usize];
    }

    // =========================================================================
    // CB prefix: rotates, shifts, and bit operations
    // =========================================================================

    fn execute_cb(&mut self) {
        if self.prefix == Prefix::None {
            let op = self.fetch_byte();
            let r = op & 7;
            let value = if r == 6 {
                self.memory.get_byte(self.regs.hl())
            } else {
                self.get_reg8(r)
            };
            match op >> 6 {
                // Rotate/shift family
                0 => {
                    let (result, f) = self.rotate_shift(op >> 3, value);
                    self.write_cb_operand(r, result);
                    self.regs.f = f;
                }
                // BIT n, r: P/V doubles as a zero flag
                1 => {
                    let bit = (op >> 3) & 7;
                    self.regs.f = (self.regs.f & CF)
                        | HF
                        | self.tables.sz_bit[(value & (1 << bit)) as usize];
                }
                // RES n, r
                2 => {
                    let bit = (op >> 3) & 7;
                    self.write_cb_operand(r, value & !(1 << bit));
                }
                // SET n, r
                _ => {
                    let bit = (op >> 3) & 7;
                    self.write_cb_operand(r, value | (1 << bit));
                }
            }
        } else {
            // DD CB d op / FD CB d op: the displacement comes before the
            // opcode, and every operation targets memory.
            let displacement = self.fetch_byte() as i8;
            let op = self.fetch_byte();
            let base = match self.prefix {
                Prefix::Dd => self.regs.ix,
                _ => self.regs.iy,
            };
            let addr = base.wrapping_add(displacement as u16);
            let value = self.memory.get_byte(addr);
            let bit = (op >> 3) & 7;
            match op >> 6 {
                0 => {
                    let (result, f) = self.rotate_shift(op >> 3, value);
                    self.memory.set_byte(addr, result);
                    self.regs.f = f;
                }
                1 => {
                    self.regs.f = (self.regs.f & CF)
                        | HF
                        | self.tables.sz_bit[(value & (1 << bit)) as usize];
                }
                2 => self.memory.set_byte(addr, value & !(1 << bit)),
                _ => self.memory.set_byte(addr, value | (1 << bit)),
            }
        }
    }

    /// Write back a CB-family result to a register or (HL).
    fn write_cb_operand(&mut self, r: u8, value: u8) {
        if r == 6 {
            self.memory.set_byte(self.regs.hl(), value);
        } else {
            self.set_reg8(r, value);
        }
    }

    /// The rotate/shift family selected by bits 5-3 of a CB opcode:
    /// RLC, RRC, RL, RR, SLA, SRA, SLL, SRL. Returns the result and the
    /// full flag byte.
    fn rotate_shift(&self, kind: u8, value: u8) -> (u8, u8) {
        let carry_in = self.regs.carry();
        let (result, carry_out) = match kind & 7 {
            0 => ((value << 1) | (value >> 7), value >> 7),
            1 => ((value >> 1) | (value << 7), value & 1),
            2 => ((value << 1) | carry_in, value >> 7),
            3 => ((value >> 1) | (carry_in << 7), value & 1),
            4 => (value << 1, value >> 7),
            5 => ((value >> 1) | (value & 0x80), value & 1),
            // Undocumented SLL shifts a 1 into bit 0
            6 => ((value << 1) | 1, value >> 7),
            _ => (value >> 1, value & 1),
        };
        (result, self.tables.szp[result as usize] | carry_out)
    }

    // =========================================================================
    // ED prefix: extended operations
    // =========================================================================

    fn execute_ed(&mut self) {
        let op = self.fetch_byte();
        match op {
            // NEG: subtract A from zero
            0x44 => {
                let old = self.regs.a;
                let new = 0u8.wrapping_sub(old);
                self.regs.a = new;
                self.regs.f = self.tables.sub_flags(0, 0, new);
            }

            // LD A, I (interrupts are not modeled, so P/V reads 0)
            0x57 => {
                self.regs.a = self.regs.i;
                self.regs.f = (self.regs.f & CF) | self.tables.sz[self.regs.a as usize];
            }

            // RRD: low nibble of (HL) into A, nibbles rotate right
            0x67 => {
                let addr = self.regs.hl();
                let m = self.memory.get_byte(addr);
                self.memory.set_byte(addr, (self.regs.a << 4) | (m >> 4));
                self.regs.a = (self.regs.a & 0xF0) | (m & 0x0F);
                self.regs.f = (self.regs.f & CF) | self.tables.szp[self.regs.a as usize];
            }

            // RLD: nibbles rotate left through A
            0x6F => {
                let addr = self.regs.hl();
                let m = self.memory.get_byte(addr);
                self.memory.set_byte(addr, (m << 4) | (self.regs.a & 0x0F));
                self.regs.a = (self.regs.a & 0xF0) | (m >> 4);
                self.regs.f = (self.regs.f & CF) | self.tables.szp[self.regs.a as usize];
            }

            // LDI / LDD
            0xA0 => self.block_transfer(true),
            0xA8 => self.block_transfer(false),

            // CPI / CPD
            0xA1 => {
                self.block_compare(true);
            }
            0xA9 => {
                self.block_compare(false);
            }

            // LDIR / LDDR: run to completion, flags from the last step
            0xB0 => loop {
                self.block_transfer(true);
                if self.regs.bc() == 0 {
                    break;
                }
            },
            0xB8 => loop {
                self.block_transfer(false);
                if self.regs.bc() == 0 {
                    break;
                }
            },

            // CPIR / CPDR: stop on exhaustion or match
            0xB1 => loop {
                let matched = self.block_compare(true);
                if self.regs.bc() == 0 || matched {
                    break;
                }
            },
            0xB9 => loop {
                let matched = self.block_compare(false);
                if self.regs.bc() == 0 || matched {
                    break;
                }
            },

            // ADC HL, rr
            _ if op & 0xCF == 0x4A => {
                let rr = self.get_reg16((op >> 4) & 3);
                let hl = self.regs.hl();
                let carry = self.regs.carry();
                let wide = u32::from(hl) + u32::from(rr) + u32::from(carry);
                let result = wide as u16;
                let mut f = ((result >> 8) as u8) & (YF | XF);
                if result == 0 {
                    f |= ZF;
                }
                if result & 0x8000 != 0 {
                    f |= SF;
                }
                if (hl & 0x0FFF) + (rr & 0x0FFF) + u16::from(carry) > 0x0FFF {
                    f |= HF;
                }
                if (hl ^ rr) & 0x8000 == 0 && (hl ^ result) & 0x8000 != 0 {
                    f |= PF;
                }
                if wide > 0xFFFF {
                    f |= CF;
                }
                self.regs.set_hl(result);
                self.regs.f = f;
            }

            // SBC HL, rr
            _ if op & 0xCF == 0x42 => {
                let rr = self.get_reg16((op >> 4) & 3);
                let hl = self.regs.hl();
                let carry = self.regs.carry();
                let result = hl.wrapping_sub(rr).wrapping_sub(u16::from(carry));
                let mut f = NF | (((result >> 8) as u8) & (YF | XF));
                if result == 0 {
                    f |= ZF;
                }
                if result & 0x8000 != 0 {
                    f |= SF;
                }
                if (hl & 0x0FFF) < (rr & 0x0FFF) + u16::from(carry) {
                    f |= HF;
                }
                if (hl ^ rr) & 0x8000 != 0 && (rr ^ result) & 0x8000 == 0 {
                    f |= PF;
                }
                if u32::from(hl) < u32::from(rr) + u32::from(carry) {
                    f |= CF;
                }
                self.regs.set_hl(result);
                self.regs.f = f;
            }

            // LD (nn), rr
            _ if op & 0xCF == 0x43 => {
                let addr = self.fetch_word();
                self.memory.set_word(addr, self.get_reg16((op >> 4) & 3));
            }

            // LD rr, (nn)
            _ if op & 0xCF == 0x4B => {
                let addr = self.fetch_word();
                let value = self.memory.get_word(addr);
                self.set_reg16((op >> 4) & 3, value);
            }

            _ => panic!("unimplemented opcode ED {op:02X}"),
        }
    }

    /// One LDI/LDD step: copy (HL) to (DE), step the pointers, decrement
    /// BC. Undocumented Y/X come from bits 1 and 3 of `copied + A`.
    fn block_transfer(&mut self, increment: bool) {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.memory.get_byte(hl);
        self.memory.set_byte(de, value);

        if increment {
            self.regs.set_hl(hl.wrapping_add(1));
            self.regs.set_de(de.wrapping_add(1));
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
            self.regs.set_de(de.wrapping_sub(1));
        }
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        self.regs.f = (self.regs.f & (SF | ZF | CF))
            | if bc != 0 { PF } else { 0 }
            | (n & XF)
            | ((n & 0x02) << 4);
    }

    /// One CPI/CPD step: compare A with (HL), step HL, decrement BC.
    /// Returns whether the compare matched. Undocumented Y/X come from
    /// bits 1 and 3 of `result - half_borrow`.
    fn block_compare(&mut self, increment: bool) -> bool {
        let hl = self.regs.hl();
        let value = self.memory.get_byte(hl);
        let result = self.regs.a.wrapping_sub(value);

        self.regs.set_hl(if increment {
            hl.wrapping_add(1)
        } else {
            hl.wrapping_sub(1)
        });
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let half_borrow = (self.regs.a & 0x0F) < (value & 0x0F);
        let mut f = (self.regs.f & CF) | NF | (result & SF);
        if result == 0 {
            f |= ZF;
        }
        if half_borrow {
            f |= HF;
        }
        if bc != 0 {
            f |= PF;
        }
        let n = result.wrapping_sub(u8::from(half_borrow));
        f |= (n & XF) | ((n & 0x02) << 4);
        self.regs.f = f;

        result == 0
    }
}
