//! Declarative opcode tables.
//!
//! The 256-entry primary map and the 256-entry CB-prefixed map, each
//! entry describing mnemonic, operand kinds, encoded length, and
//! machine-cycle costs (taken and not-taken for conditional flow).
//! Hosts use these to build dispatch tables or tooling; the test suite
//! cross-checks the costs against what the primitives actually charge.

use crate::cpu::{Cond, R16, R16Stack, R8};

/// Operand kinds as they appear in the instruction encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No operand in this position.
    Implied,
    R8(R8),
    R16(R16),
    Stack(R16Stack),
    /// [HL] indirection.
    HlInd,
    /// [HL+] / [HL-] post-modify indirection.
    HlInc,
    HlDec,
    /// [BC] / [DE] indirection.
    BcInd,
    DeInd,
    /// [0xFF00 + C].
    CInd,
    /// Immediate byte / word / signed offset.
    N8,
    N16,
    E8,
    /// [0xFF00 + a8] / [a16] immediates.
    A8,
    A16,
    /// SP + e8.
    SpE8,
    /// Restart vector index.
    Vector(u8),
    /// Bit index of a CB-prefixed bit operation.
    Bit(u8),
}

#[derive(Debug, Clone, Copy)]
pub struct OpDesc {
    pub mnemonic: &'static str,
    pub lhs: Operand,
    pub rhs: Operand,
    /// Branch condition, if the operation is conditional.
    pub cond: Option<Cond>,
    /// Encoded length in bytes, immediates included.
    pub bytes: u8,
    /// Machine-cycle cost (branch taken, for conditional flow).
    pub cycles: u8,
    /// Machine-cycle cost when the branch is not taken.
    pub cycles_short: u8,
    /// False for the eleven holes in the primary map.
    pub valid: bool,
}

const fn op(mnemonic: &'static str, lhs: Operand, rhs: Operand, bytes: u8, cycles: u8) -> OpDesc {
    OpDesc {
        mnemonic,
        lhs,
        rhs,
        cond: None,
        bytes,
        cycles,
        cycles_short: cycles,
        valid: true,
    }
}

const fn br(
    mnemonic: &'static str,
    cond: Cond,
    rhs: Operand,
    bytes: u8,
    cycles: u8,
    cycles_short: u8,
) -> OpDesc {
    OpDesc {
        mnemonic,
        lhs: Operand::Implied,
        rhs,
        cond: Some(cond),
        bytes,
        cycles,
        cycles_short,
        valid: true,
    }
}

const ILLEGAL: OpDesc = OpDesc {
    mnemonic: "???",
    lhs: Operand::Implied,
    rhs: Operand::Implied,
    cond: None,
    bytes: 1,
    cycles: 0,
    cycles_short: 0,
    valid: false,
};

use Operand::*;

/// Register operand for an encoded 3-bit index (B,C,D,E,H,L,[HL],A).
const fn encoded_target(index: u8) -> Operand {
    match index {
        0 => R8(self::R8::B),
        1 => R8(self::R8::C),
        2 => R8(self::R8::D),
        3 => R8(self::R8::E),
        4 => R8(self::R8::H),
        5 => R8(self::R8::L),
        6 => HlInd,
        _ => R8(self::R8::A),
    }
}

/// The primary opcode map.
pub const OPCODES: [OpDesc; 256] = build_primary();

/// The CB-prefixed opcode map.
pub const CB_OPCODES: [OpDesc; 256] = build_cb();

const fn build_primary() -> [OpDesc; 256] {
    let mut t = [ILLEGAL; 256];

    // ── 0x00-0x3F: loads, 16-bit arithmetic, relative jumps ──
    t[0x00] = op("NOP", Implied, Implied, 1, 1);
    t[0x01] = op("LD", R16(self::R16::BC), N16, 3, 3);
    t[0x02] = op("LD", BcInd, R8(self::R8::A), 1, 2);
    t[0x03] = op("INC", R16(self::R16::BC), Implied, 1, 2);
    t[0x04] = op("INC", R8(self::R8::B), Implied, 1, 1);
    t[0x05] = op("DEC", R8(self::R8::B), Implied, 1, 1);
    t[0x06] = op("LD", R8(self::R8::B), N8, 2, 2);
    t[0x07] = op("RLCA", Implied, Implied, 1, 1);
    t[0x08] = op("LD", A16, R16(self::R16::SP), 3, 5);
    t[0x09] = op("ADD", R16(self::R16::HL), R16(self::R16::BC), 1, 2);
    t[0x0A] = op("LD", R8(self::R8::A), BcInd, 1, 2);
    t[0x0B] = op("DEC", R16(self::R16::BC), Implied, 1, 2);
    t[0x0C] = op("INC", R8(self::R8::C), Implied, 1, 1);
    t[0x0D] = op("DEC", R8(self::R8::C), Implied, 1, 1);
    t[0x0E] = op("LD", R8(self::R8::C), N8, 2, 2);
    t[0x0F] = op("RRCA", Implied, Implied, 1, 1);

    t[0x10] = op("STOP", Implied, Implied, 2, 1);
    t[0x11] = op("LD", R16(self::R16::DE), N16, 3, 3);
    t[0x12] = op("LD", DeInd, R8(self::R8::A), 1, 2);
    t[0x13] = op("INC", R16(self::R16::DE), Implied, 1, 2);
    t[0x14] = op("INC", R8(self::R8::D), Implied, 1, 1);
    t[0x15] = op("DEC", R8(self::R8::D), Implied, 1, 1);
    t[0x16] = op("LD", R8(self::R8::D), N8, 2, 2);
    t[0x17] = op("RLA", Implied, Implied, 1, 1);
    t[0x18] = br("JR", Cond::Always, E8, 2, 3, 3);
    t[0x19] = op("ADD", R16(self::R16::HL), R16(self::R16::DE), 1, 2);
    t[0x1A] = op("LD", R8(self::R8::A), DeInd, 1, 2);
    t[0x1B] = op("DEC", R16(self::R16::DE), Implied, 1, 2);
    t[0x1C] = op("INC", R8(self::R8::E), Implied, 1, 1);
    t[0x1D] = op("DEC", R8(self::R8::E), Implied, 1, 1);
    t[0x1E] = op("LD", R8(self::R8::E), N8, 2, 2);
    t[0x1F] = op("RRA", Implied, Implied, 1, 1);

    t[0x20] = br("JR", Cond::NZ, E8, 2, 3, 2);
    t[0x21] = op("LD", R16(self::R16::HL), N16, 3, 3);
    t[0x22] = op("LD", HlInc, R8(self::R8::A), 1, 2);
    t[0x23] = op("INC", R16(self::R16::HL), Implied, 1, 2);
    t[0x24] = op("INC", R8(self::R8::H), Implied, 1, 1);
    t[0x25] = op("DEC", R8(self::R8::H), Implied, 1, 1);
    t[0x26] = op("LD", R8(self::R8::H), N8, 2, 2);
    t[0x27] = op("DAA", Implied, Implied, 1, 1);
    t[0x28] = br("JR", Cond::Z, E8, 2, 3, 2);
    t[0x29] = op("ADD", R16(self::R16::HL), R16(self::R16::HL), 1, 2);
    t[0x2A] = op("LD", R8(self::R8::A), HlInc, 1, 2);
    t[0x2B] = op("DEC", R16(self::R16::HL), Implied, 1, 2);
    t[0x2C] = op("INC", R8(self::R8::L), Implied, 1, 1);
    t[0x2D] = op("DEC", R8(self::R8::L), Implied, 1, 1);
    t[0x2E] = op("LD", R8(self::R8::L), N8, 2, 2);
    t[0x2F] = op("CPL", Implied, Implied, 1, 1);

    t[0x30] = br("JR", Cond::NC, E8, 2, 3, 2);
    t[0x31] = op("LD", R16(self::R16::SP), N16, 3, 3);
    t[0x32] = op("LD", HlDec, R8(self::R8::A), 1, 2);
    t[0x33] = op("INC", R16(self::R16::SP), Implied, 1, 2);
    t[0x34] = op("INC", HlInd, Implied, 1, 3);
    t[0x35] = op("DEC", HlInd, Implied, 1, 3);
    t[0x36] = op("LD", HlInd, N8, 2, 3);
    t[0x37] = op("SCF", Implied, Implied, 1, 1);
    t[0x38] = br("JR", Cond::C, E8, 2, 3, 2);
    t[0x39] = op("ADD", R16(self::R16::HL), R16(self::R16::SP), 1, 2);
    t[0x3A] = op("LD", R8(self::R8::A), HlDec, 1, 2);
    t[0x3B] = op("DEC", R16(self::R16::SP), Implied, 1, 2);
    t[0x3C] = op("INC", R8(self::R8::A), Implied, 1, 1);
    t[0x3D] = op("DEC", R8(self::R8::A), Implied, 1, 1);
    t[0x3E] = op("LD", R8(self::R8::A), N8, 2, 2);
    t[0x3F] = op("CCF", Implied, Implied, 1, 1);

    // ── 0x40-0x7F: LD r,r' block (0x76 is HALT) ──
    let mut code = 0x40;
    while code < 0x80 {
        let dst = encoded_target((code as u8 >> 3) & 0x07);
        let src = encoded_target(code as u8 & 0x07);
        let touches_memory = matches!(dst, HlInd) || matches!(src, HlInd);
        t[code] = op("LD", dst, src, 1, if touches_memory { 2 } else { 1 });
        code += 1;
    }
    t[0x76] = op("HALT", Implied, Implied, 1, 1);

    // ── 0x80-0xBF: accumulator arithmetic block ──
    let mut code = 0x80;
    while code < 0xC0 {
        let mnemonic = match (code as u8 >> 3) & 0x07 {
            0 => "ADD",
            1 => "ADC",
            2 => "SUB",
            3 => "SBC",
            4 => "AND",
            5 => "XOR",
            6 => "OR",
            _ => "CP",
        };
        let src = encoded_target(code as u8 & 0x07);
        let cycles = if matches!(src, HlInd) { 2 } else { 1 };
        t[code] = op(mnemonic, R8(self::R8::A), src, 1, cycles);
        code += 1;
    }

    // ── 0xC0-0xFF: flow, stack, immediates, high-page loads ──
    t[0xC0] = br("RET", Cond::NZ, Implied, 1, 5, 2);
    t[0xC1] = op("POP", Stack(R16Stack::BC), Implied, 1, 3);
    t[0xC2] = br("JP", Cond::NZ, A16, 3, 4, 3);
    t[0xC3] = br("JP", Cond::Always, A16, 3, 4, 4);
    t[0xC4] = br("CALL", Cond::NZ, A16, 3, 6, 3);
    t[0xC5] = op("PUSH", Stack(R16Stack::BC), Implied, 1, 4);
    t[0xC6] = op("ADD", R8(self::R8::A), N8, 2, 2);
    t[0xC7] = op("RST", Vector(0), Implied, 1, 4);
    t[0xC8] = br("RET", Cond::Z, Implied, 1, 5, 2);
    t[0xC9] = op("RET", Implied, Implied, 1, 4);
    t[0xCA] = br("JP", Cond::Z, A16, 3, 4, 3);
    t[0xCB] = op("PREFIX", Implied, Implied, 1, 1);
    t[0xCC] = br("CALL", Cond::Z, A16, 3, 6, 3);
    t[0xCD] = br("CALL", Cond::Always, A16, 3, 6, 6);
    t[0xCE] = op("ADC", R8(self::R8::A), N8, 2, 2);
    t[0xCF] = op("RST", Vector(1), Implied, 1, 4);

    t[0xD0] = br("RET", Cond::NC, Implied, 1, 5, 2);
    t[0xD1] = op("POP", Stack(R16Stack::DE), Implied, 1, 3);
    t[0xD2] = br("JP", Cond::NC, A16, 3, 4, 3);
    t[0xD4] = br("CALL", Cond::NC, A16, 3, 6, 3);
    t[0xD5] = op("PUSH", Stack(R16Stack::DE), Implied, 1, 4);
    t[0xD6] = op("SUB", R8(self::R8::A), N8, 2, 2);
    t[0xD7] = op("RST", Vector(2), Implied, 1, 4);
    t[0xD8] = br("RET", Cond::C, Implied, 1, 5, 2);
    t[0xD9] = op("RETI", Implied, Implied, 1, 4);
    t[0xDA] = br("JP", Cond::C, A16, 3, 4, 3);
    t[0xDC] = br("CALL", Cond::C, A16, 3, 6, 3);
    t[0xDE] = op("SBC", R8(self::R8::A), N8, 2, 2);
    t[0xDF] = op("RST", Vector(3), Implied, 1, 4);

    t[0xE0] = op("LDH", A8, R8(self::R8::A), 2, 3);
    t[0xE1] = op("POP", Stack(R16Stack::HL), Implied, 1, 3);
    t[0xE2] = op("LDH", CInd, R8(self::R8::A), 1, 2);
    t[0xE5] = op("PUSH", Stack(R16Stack::HL), Implied, 1, 4);
    t[0xE6] = op("AND", R8(self::R8::A), N8, 2, 2);
    t[0xE7] = op("RST", Vector(4), Implied, 1, 4);
    t[0xE8] = op("ADD", R16(self::R16::SP), E8, 2, 4);
    t[0xE9] = op("JP", R16(self::R16::HL), Implied, 1, 1);
    t[0xEA] = op("LD", A16, R8(self::R8::A), 3, 4);
    t[0xEE] = op("XOR", R8(self::R8::A), N8, 2, 2);
    t[0xEF] = op("RST", Vector(5), Implied, 1, 4);

    t[0xF0] = op("LDH", R8(self::R8::A), A8, 2, 3);
    t[0xF1] = op("POP", Stack(R16Stack::AF), Implied, 1, 3);
    t[0xF2] = op("LDH", R8(self::R8::A), CInd, 1, 2);
    t[0xF3] = op("DI", Implied, Implied, 1, 1);
    t[0xF5] = op("PUSH", Stack(R16Stack::AF), Implied, 1, 4);
    t[0xF6] = op("OR", R8(self::R8::A), N8, 2, 2);
    t[0xF7] = op("RST", Vector(6), Implied, 1, 4);
    t[0xF8] = op("LD", R16(self::R16::HL), SpE8, 2, 3);
    t[0xF9] = op("LD", R16(self::R16::SP), R16(self::R16::HL), 1, 2);
    t[0xFA] = op("LD", R8(self::R8::A), A16, 3, 4);
    t[0xFB] = op("EI", Implied, Implied, 1, 1);
    t[0xFE] = op("CP", R8(self::R8::A), N8, 2, 2);
    t[0xFF] = op("RST", Vector(7), Implied, 1, 4);

    t
}

const fn build_cb() -> [OpDesc; 256] {
    let mut t = [ILLEGAL; 256];
    let mut code = 0;
    while code < 256 {
        let target = encoded_target(code as u8 & 0x07);
        let group = (code as u8 >> 3) & 0x1F;
        let memory = matches!(target, HlInd);

        t[code] = match group {
            0..=7 => {
                let mnemonic = match group {
                    0 => "RLC",
                    1 => "RRC",
                    2 => "RL",
                    3 => "RR",
                    4 => "SLA",
                    5 => "SRA",
                    6 => "SWAP",
                    _ => "SRL",
                };
                op(mnemonic, target, Implied, 2, if memory { 4 } else { 2 })
            }
            8..=15 => op("BIT", Bit(group - 8), target, 2, if memory { 3 } else { 2 }),
            16..=23 => op("RES", Bit(group - 16), target, 2, if memory { 4 } else { 2 }),
            _ => op("SET", Bit(group - 24), target, 2, if memory { 4 } else { 2 }),
        };
        code += 1;
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_holes_in_the_primary_map() {
        let holes: Vec<usize> = OPCODES
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.valid)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(
            holes,
            vec![0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD]
        );
    }

    #[test]
    fn cb_map_is_fully_populated() {
        assert!(CB_OPCODES.iter().all(|d| d.valid));
    }

    #[test]
    fn load_block_costs() {
        assert_eq!(OPCODES[0x41].cycles, 1); // LD B,C
        assert_eq!(OPCODES[0x46].cycles, 2); // LD B,[HL]
        assert_eq!(OPCODES[0x70].cycles, 2); // LD [HL],B
        assert_eq!(OPCODES[0x76].mnemonic, "HALT");
    }

    #[test]
    fn arithmetic_block_decodes() {
        assert_eq!(OPCODES[0x80].mnemonic, "ADD");
        assert_eq!(OPCODES[0x96].mnemonic, "SUB");
        assert_eq!(OPCODES[0x96].rhs, Operand::HlInd);
        assert_eq!(OPCODES[0x96].cycles, 2);
        assert_eq!(OPCODES[0xBF].mnemonic, "CP");
        assert_eq!(OPCODES[0xBF].rhs, Operand::R8(crate::cpu::R8::A));
    }

    #[test]
    fn conditional_flow_has_two_costs() {
        let jp_nz = OPCODES[0xC2];
        assert_eq!(jp_nz.cond, Some(crate::cpu::Cond::NZ));
        assert_eq!((jp_nz.cycles, jp_nz.cycles_short), (4, 3));
        let call = OPCODES[0xCD];
        assert_eq!((call.cycles, call.cycles_short), (6, 6));
        let ret_c = OPCODES[0xD8];
        assert_eq!((ret_c.cycles, ret_c.cycles_short), (5, 2));
    }

    #[test]
    fn cb_bit_group_shapes() {
        let bit0_b = CB_OPCODES[0x40];
        assert_eq!(bit0_b.mnemonic, "BIT");
        assert_eq!(bit0_b.lhs, Operand::Bit(0));
        assert_eq!(bit0_b.cycles, 2);
        let bit3_hl = CB_OPCODES[0x5E];
        assert_eq!(bit3_hl.lhs, Operand::Bit(3));
        assert_eq!(bit3_hl.rhs, Operand::HlInd);
        assert_eq!(bit3_hl.cycles, 3);
        let set7_hl = CB_OPCODES[0xFE];
        assert_eq!(set7_hl.mnemonic, "SET");
        assert_eq!(set7_hl.lhs, Operand::Bit(7));
        assert_eq!(set7_hl.cycles, 4);
        let swap_a = CB_OPCODES[0x37];
        assert_eq!(swap_a.mnemonic, "SWAP");
        assert_eq!(swap_a.cycles, 2);
    }

    #[test]
    fn immediates_extend_encoded_length() {
        assert_eq!(OPCODES[0x01].bytes, 3); // LD BC,n16
        assert_eq!(OPCODES[0x06].bytes, 2); // LD B,n8
        assert_eq!(OPCODES[0x18].bytes, 2); // JR e8
        assert_eq!(OPCODES[0xC3].bytes, 3); // JP a16
        assert_eq!(OPCODES[0xC7].bytes, 1); // RST 0
    }

    /// The table's costs must match what the primitives charge.
    #[test]
    fn costs_agree_with_primitives() {
        use crate::cpu::{Cond, R16Stack, R8};
        let mut e = crate::engine::Engine::new();

        let cases: Vec<(u8, u64)> = vec![
            (0x00, {
                let b = e.cycles();
                e.nop().unwrap();
                e.cycles() - b
            }),
            (0x80, {
                let b = e.cycles();
                e.add_a_r8(R8::B).unwrap();
                e.cycles() - b
            }),
            (0xC6, {
                let b = e.cycles();
                e.add_a_n8(1).unwrap();
                e.cycles() - b
            }),
            (0xC5, {
                e.regs.sp = 0xD000;
                let b = e.cycles();
                e.push_r16(R16Stack::BC).unwrap();
                e.cycles() - b
            }),
            (0xC1, {
                let b = e.cycles();
                e.pop_r16(R16Stack::BC).unwrap();
                e.cycles() - b
            }),
            (0x08, {
                let b = e.cycles();
                e.ld_a16_sp(0xC000).unwrap();
                e.cycles() - b
            }),
            (0xC9, {
                let b = e.cycles();
                e.ret().unwrap();
                e.cycles() - b
            }),
            (0xC7, {
                let b = e.cycles();
                e.rst(0).unwrap();
                e.cycles() - b
            }),
        ];
        for (code, ticks) in cases {
            assert_eq!(
                ticks,
                OPCODES[code as usize].cycles as u64 * 4,
                "opcode {code:#04x}"
            );
        }

        // Conditional flow, both outcomes.
        e.regs.f.set_z(false);
        let b = e.cycles();
        assert!(e.jp(Cond::NZ).unwrap());
        assert_eq!(e.cycles() - b, OPCODES[0xC2].cycles as u64 * 4);
        let b = e.cycles();
        assert!(!e.jp(Cond::Z).unwrap());
        assert_eq!(e.cycles() - b, OPCODES[0xCA].cycles_short as u64 * 4);
    }
}
