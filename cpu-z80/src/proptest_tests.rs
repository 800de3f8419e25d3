//! Property-based tests for the CPU using proptest.

use proptest::prelude::*;

use crate::flags::{CF, HF, NF, ZF};
use crate::{System, SystemConfig};

fn system_with_program(program: &[u8]) -> System {
    let mut system = System::with_config(&SystemConfig {
        initial_pc: 0x0100,
        ..SystemConfig::default()
    });
    system
        .memory_mut()
        .set_range(0x0100, program.len(), program)
        .expect("program fits in RAM");
    system
}

proptest! {
    // ==================== Register pair invariants ====================

    #[test]
    fn prop_bc_roundtrip(value in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[]);
        system.regs_mut().set_bc(value);
        prop_assert_eq!(system.regs().bc(), value);
        prop_assert_eq!(system.regs().b, (value >> 8) as u8);
        prop_assert_eq!(system.regs().c, value as u8);
    }

    #[test]
    fn prop_af_roundtrip(value in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[]);
        system.regs_mut().set_af(value);
        prop_assert_eq!(system.regs().af(), value);
    }

    // ==================== Exchange involutions ====================

    #[test]
    fn prop_exx_twice_restores_state(bc in 0u16..=0xFFFF, de in 0u16..=0xFFFF, hl in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[0xD9, 0xD9]); // EXX, EXX
        system.regs_mut().set_bc(bc);
        system.regs_mut().set_de(de);
        system.regs_mut().set_hl(hl);
        system.execute_instruction();
        system.execute_instruction();
        prop_assert_eq!(system.regs().bc(), bc);
        prop_assert_eq!(system.regs().de(), de);
        prop_assert_eq!(system.regs().hl(), hl);
        prop_assert_eq!((system.regs().b_alt, system.regs().c_alt), (0, 0));
    }

    #[test]
    fn prop_ex_af_twice_restores_state(af in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[0x08, 0x08]); // EX AF,AF' twice
        system.regs_mut().set_af(af);
        system.execute_instruction();
        system.execute_instruction();
        prop_assert_eq!(system.regs().af(), af);
    }

    // ==================== Stack ====================

    #[test]
    fn prop_push_pop_roundtrip(value in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[0xC5, 0xD1]); // PUSH BC, POP DE
        system.regs_mut().set_bc(value);
        let sp = system.regs().sp;
        system.execute_instruction();
        prop_assert_eq!(system.regs().sp, sp.wrapping_sub(2));
        system.execute_instruction();
        prop_assert_eq!(system.regs().de(), value);
        prop_assert_eq!(system.regs().sp, sp);
    }

    // ==================== Loads ====================

    #[test]
    fn prop_ld_rr_nn(low in 0u8..=255, high in 0u8..=255) {
        let mut system = system_with_program(&[0x21, low, high]); // LD HL,nn
        system.execute_instruction();
        prop_assert_eq!(system.regs().hl(), u16::from(low) | (u16::from(high) << 8));
        prop_assert_eq!(system.regs().pc, 0x0103);
    }

    #[test]
    fn prop_ld_ix_nn(low in 0u8..=255, high in 0u8..=255) {
        let mut system = system_with_program(&[0xDD, 0x21, low, high]);
        system.execute_instruction();
        prop_assert_eq!(system.regs().ix, u16::from(low) | (u16::from(high) << 8));
    }

    #[test]
    fn prop_ld_b_c_copies(value in 0u8..=255) {
        let mut system = system_with_program(&[0x41]); // LD B,C
        system.regs_mut().c = value;
        system.execute_instruction();
        prop_assert_eq!(system.regs().b, value);
    }

    // ==================== ALU identities ====================

    #[test]
    fn prop_add_a_b(a in 0u8..=255, b in 0u8..=255) {
        let mut system = system_with_program(&[0x80]); // ADD A,B
        system.regs_mut().a = a;
        system.regs_mut().b = b;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, a.wrapping_add(b));
        prop_assert_eq!(
            system.regs().flag(CF),
            u16::from(a) + u16::from(b) > 0xFF
        );
        prop_assert_eq!(system.regs().flag(ZF), a.wrapping_add(b) == 0);
    }

    #[test]
    fn prop_sub_a_b(a in 0u8..=255, b in 0u8..=255) {
        let mut system = system_with_program(&[0x90]); // SUB B
        system.regs_mut().a = a;
        system.regs_mut().b = b;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, a.wrapping_sub(b));
        prop_assert!(system.regs().flag(NF));
        prop_assert_eq!(system.regs().flag(CF), a < b);
    }

    #[test]
    fn prop_cp_preserves_a(a in 0u8..=255, b in 0u8..=255) {
        let mut system = system_with_program(&[0xB8]); // CP B
        system.regs_mut().a = a;
        system.regs_mut().b = b;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, a);
        prop_assert_eq!(system.regs().flag(ZF), a == b);
    }

    #[test]
    fn prop_and_a_b(a in 0u8..=255, b in 0u8..=255) {
        let mut system = system_with_program(&[0xA0]); // AND B
        system.regs_mut().a = a;
        system.regs_mut().b = b;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, a & b);
        prop_assert!(system.regs().flag(HF));
        prop_assert!(!system.regs().flag(CF));
    }

    #[test]
    fn prop_xor_self_is_zero(a in 0u8..=255) {
        let mut system = system_with_program(&[0xAF]); // XOR A
        system.regs_mut().a = a;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, 0);
        prop_assert!(system.regs().flag(ZF));
    }

    // ==================== CPL ====================

    #[test]
    fn prop_cpl_twice_restores_a(a in 0u8..=255) {
        let mut system = system_with_program(&[0x2F, 0x2F]); // CPL, CPL
        system.regs_mut().a = a;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, !a);
        prop_assert!(system.regs().flag(HF));
        prop_assert!(system.regs().flag(NF));
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, a);
    }

    // ==================== RRA carry propagation ====================

    #[test]
    fn prop_rra_shifts_carry_into_bit_7(a in 0u8..=255, carry in proptest::bool::ANY) {
        let mut system = system_with_program(&[0x1F]); // RRA
        system.regs_mut().a = a;
        system.regs_mut().f = if carry { CF } else { 0 };
        system.execute_instruction();
        let expected = (a >> 1) | if carry { 0x80 } else { 0 };
        prop_assert_eq!(system.regs().a, expected);
        prop_assert_eq!(system.regs().flag(CF), a & 1 != 0);
    }

    // ==================== CB bit operations ====================

    #[test]
    fn prop_cb_set_then_res(bit in 0u8..8, value in 0u8..=255) {
        // SET bit,A then RES bit,A
        let set_op = 0xC0 | (bit << 3) | 0x07;
        let res_op = 0x80 | (bit << 3) | 0x07;
        let mut system = system_with_program(&[0xCB, set_op, 0xCB, res_op]);
        system.regs_mut().a = value;
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, value | (1 << bit));
        system.execute_instruction();
        prop_assert_eq!(system.regs().a, value & !(1 << bit));
    }

    #[test]
    fn prop_cb_bit_reads_bit(bit in 0u8..8, value in 0u8..=255) {
        let bit_op = 0x40 | (bit << 3) | 0x07; // BIT bit,A
        let mut system = system_with_program(&[0xCB, bit_op]);
        system.regs_mut().a = value;
        system.execute_instruction();
        prop_assert_eq!(system.regs().flag(ZF), value & (1 << bit) == 0);
        prop_assert!(system.regs().flag(HF));
    }

    // ==================== Memory word laws ====================

    #[test]
    fn prop_memory_word_layout(addr in 0u16..=0xFFFE, value in 0u16..=0xFFFF) {
        let mut system = system_with_program(&[]);
        system.memory_mut().set_word(addr, value);
        prop_assert_eq!(system.memory().get_word(addr), value);
        prop_assert_eq!(system.memory().get_byte(addr), value as u8);
        prop_assert_eq!(system.memory().get_byte(addr + 1), (value >> 8) as u8);
    }

    // ==================== Prefix handling ====================

    #[test]
    fn prop_prefix_on_unaffected_opcode_is_dropped(value in 0u8..=255) {
        // DD before LD A,n: the prefix cannot modify it, so the opcode is
        // re-decoded plain and the load still happens.
        let mut system = system_with_program(&[0xDD, 0x3E, value]);
        system.execute_instruction(); // absorbs DD, pushes 0x3E back
        prop_assert_eq!(system.regs().pc, 0x0101);
        system.execute_instruction(); // LD A,n
        prop_assert_eq!(system.regs().a, value);
        prop_assert_eq!(system.regs().pc, 0x0103);
    }
}
