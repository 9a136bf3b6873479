//! Short-form dispatch: drive the engine by opcode byte.
//!
//! `execute` maps the 256-entry primary map onto the long-form
//! primitives, and `execute_cb` the CB-prefixed map.  Data-carrying
//! encodings take their immediate through [`Imm`]; control-flow facades
//! ignore the encoded target (the host performs the transfer) and report
//! their outcome through [`Outcome`].  The CB prefix itself dispatches
//! with the second opcode byte as its immediate.

use crate::cpu::{Cond, R16, R16Stack, R8};
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Immediate operand accompanying an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imm {
    None,
    N8(u8),
    N16(u16),
    E8(i8),
}

impl Imm {
    fn n8(self, opcode: u8) -> Result<u8> {
        match self {
            Imm::N8(v) => Ok(v),
            _ => Err(Error::MissingImmediate(opcode)),
        }
    }

    fn n16(self, opcode: u8) -> Result<u16> {
        match self {
            Imm::N16(v) => Ok(v),
            _ => Err(Error::MissingImmediate(opcode)),
        }
    }

    fn e8(self, opcode: u8) -> Result<i8> {
        match self {
            Imm::E8(v) => Ok(v),
            _ => Err(Error::MissingImmediate(opcode)),
        }
    }
}

/// What a dispatched operation reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed; nothing for the host to act on.
    Done,
    /// Branch outcome of JP/JR/CALL/RET-cc; the host transfers on true.
    Branch(bool),
    /// JP HL: the dispatch target for the host's jump table.
    Target(u16),
}

fn done(result: Result<()>) -> Result<Outcome> {
    result.map(|_| Outcome::Done)
}

/// Register for an encoded 3-bit index; `None` is the [HL] slot.
fn encoded_r8(index: u8) -> Option<R8> {
    match index {
        0 => Some(R8::B),
        1 => Some(R8::C),
        2 => Some(R8::D),
        3 => Some(R8::E),
        4 => Some(R8::H),
        5 => Some(R8::L),
        6 => None,
        _ => Some(R8::A),
    }
}

impl Engine {
    /// Execute one primary-map opcode.
    pub fn execute(&mut self, opcode: u8, imm: Imm) -> Result<Outcome> {
        match opcode {
            0x00 => done(self.nop()),
            0x01 => done(self.ld_r16_n16(R16::BC, imm.n16(opcode)?)),
            0x02 => done(self.ld_bc_a()),
            0x03 => done(self.inc_r16(R16::BC)),
            0x04 => done(self.inc_r8(R8::B)),
            0x05 => done(self.dec_r8(R8::B)),
            0x06 => done(self.ld_r8_n8(R8::B, imm.n8(opcode)?)),
            0x07 => done(self.rlca()),
            0x08 => done(self.ld_a16_sp(imm.n16(opcode)?)),
            0x09 => done(self.add_hl_r16(R16::BC)),
            0x0A => done(self.ld_a_bc()),
            0x0B => done(self.dec_r16(R16::BC)),
            0x0C => done(self.inc_r8(R8::C)),
            0x0D => done(self.dec_r8(R8::C)),
            0x0E => done(self.ld_r8_n8(R8::C, imm.n8(opcode)?)),
            0x0F => done(self.rrca()),

            0x10 => done(self.stop()),
            0x11 => done(self.ld_r16_n16(R16::DE, imm.n16(opcode)?)),
            0x12 => done(self.ld_de_a()),
            0x13 => done(self.inc_r16(R16::DE)),
            0x14 => done(self.inc_r8(R8::D)),
            0x15 => done(self.dec_r8(R8::D)),
            0x16 => done(self.ld_r8_n8(R8::D, imm.n8(opcode)?)),
            0x17 => done(self.rla()),
            0x18 => Ok(Outcome::Branch(self.jr(Cond::Always)?)),
            0x19 => done(self.add_hl_r16(R16::DE)),
            0x1A => done(self.ld_a_de()),
            0x1B => done(self.dec_r16(R16::DE)),
            0x1C => done(self.inc_r8(R8::E)),
            0x1D => done(self.dec_r8(R8::E)),
            0x1E => done(self.ld_r8_n8(R8::E, imm.n8(opcode)?)),
            0x1F => done(self.rra()),

            0x20 => Ok(Outcome::Branch(self.jr(Cond::NZ)?)),
            0x21 => done(self.ld_r16_n16(R16::HL, imm.n16(opcode)?)),
            0x22 => done(self.ld_hli_a()),
            0x23 => done(self.inc_r16(R16::HL)),
            0x24 => done(self.inc_r8(R8::H)),
            0x25 => done(self.dec_r8(R8::H)),
            0x26 => done(self.ld_r8_n8(R8::H, imm.n8(opcode)?)),
            0x27 => done(self.daa()),
            0x28 => Ok(Outcome::Branch(self.jr(Cond::Z)?)),
            0x29 => done(self.add_hl_r16(R16::HL)),
            0x2A => done(self.ld_a_hli()),
            0x2B => done(self.dec_r16(R16::HL)),
            0x2C => done(self.inc_r8(R8::L)),
            0x2D => done(self.dec_r8(R8::L)),
            0x2E => done(self.ld_r8_n8(R8::L, imm.n8(opcode)?)),
            0x2F => done(self.cpl()),

            0x30 => Ok(Outcome::Branch(self.jr(Cond::NC)?)),
            0x31 => done(self.ld_r16_n16(R16::SP, imm.n16(opcode)?)),
            0x32 => done(self.ld_hld_a()),
            0x33 => done(self.inc_r16(R16::SP)),
            0x34 => done(self.inc_hl_ind()),
            0x35 => done(self.dec_hl_ind()),
            0x36 => done(self.ld_hl_n8(imm.n8(opcode)?)),
            0x37 => done(self.scf()),
            0x38 => Ok(Outcome::Branch(self.jr(Cond::C)?)),
            0x39 => done(self.add_hl_r16(R16::SP)),
            0x3A => done(self.ld_a_hld()),
            0x3B => done(self.dec_r16(R16::SP)),
            0x3C => done(self.inc_r8(R8::A)),
            0x3D => done(self.dec_r8(R8::A)),
            0x3E => done(self.ld_r8_n8(R8::A, imm.n8(opcode)?)),
            0x3F => done(self.ccf()),

            0x76 => done(self.halt()),
            0x40..=0x7F => {
                let dst = encoded_r8(opcode >> 3 & 0x07);
                let src = encoded_r8(opcode & 0x07);
                done(match (dst, src) {
                    (Some(d), Some(s)) => self.ld_r8_r8(d, s),
                    (Some(d), None) => self.ld_r8_hl(d),
                    (None, Some(s)) => self.ld_hl_r8(s),
                    (None, None) => unreachable!(), // 0x76 is HALT
                })
            }

            0x80..=0xBF => {
                let src = encoded_r8(opcode & 0x07);
                done(match (opcode >> 3 & 0x07, src) {
                    (0, Some(r)) => self.add_a_r8(r),
                    (0, None) => self.add_a_hl(),
                    (1, Some(r)) => self.adc_a_r8(r),
                    (1, None) => self.adc_a_hl(),
                    (2, Some(r)) => self.sub_a_r8(r),
                    (2, None) => self.sub_a_hl(),
                    (3, Some(r)) => self.sbc_a_r8(r),
                    (3, None) => self.sbc_a_hl(),
                    (4, Some(r)) => self.and_a_r8(r),
                    (4, None) => self.and_a_hl(),
                    (5, Some(r)) => self.xor_a_r8(r),
                    (5, None) => self.xor_a_hl(),
                    (6, Some(r)) => self.or_a_r8(r),
                    (6, None) => self.or_a_hl(),
                    (_, Some(r)) => self.cp_a_r8(r),
                    (_, None) => self.cp_a_hl(),
                })
            }

            0xC0 => Ok(Outcome::Branch(self.ret_cond(Cond::NZ)?)),
            0xC1 => done(self.pop_r16(R16Stack::BC)),
            0xC2 => Ok(Outcome::Branch(self.jp(Cond::NZ)?)),
            0xC3 => Ok(Outcome::Branch(self.jp(Cond::Always)?)),
            0xC4 => Ok(Outcome::Branch(self.call(Cond::NZ)?)),
            0xC5 => done(self.push_r16(R16Stack::BC)),
            0xC6 => done(self.add_a_n8(imm.n8(opcode)?)),
            0xC8 => Ok(Outcome::Branch(self.ret_cond(Cond::Z)?)),
            0xC9 => done(self.ret()),
            0xCA => Ok(Outcome::Branch(self.jp(Cond::Z)?)),
            0xCB => {
                let cb_opcode = imm.n8(opcode)?;
                self.execute_cb(cb_opcode)?;
                Ok(Outcome::Done)
            }
            0xCC => Ok(Outcome::Branch(self.call(Cond::Z)?)),
            0xCD => Ok(Outcome::Branch(self.call(Cond::Always)?)),
            0xCE => done(self.adc_a_n8(imm.n8(opcode)?)),

            0xD0 => Ok(Outcome::Branch(self.ret_cond(Cond::NC)?)),
            0xD1 => done(self.pop_r16(R16Stack::DE)),
            0xD2 => Ok(Outcome::Branch(self.jp(Cond::NC)?)),
            0xD4 => Ok(Outcome::Branch(self.call(Cond::NC)?)),
            0xD5 => done(self.push_r16(R16Stack::DE)),
            0xD6 => done(self.sub_a_n8(imm.n8(opcode)?)),
            0xD8 => Ok(Outcome::Branch(self.ret_cond(Cond::C)?)),
            0xD9 => done(self.reti()),
            0xDA => Ok(Outcome::Branch(self.jp(Cond::C)?)),
            0xDC => Ok(Outcome::Branch(self.call(Cond::C)?)),
            0xDE => done(self.sbc_a_n8(imm.n8(opcode)?)),

            0xE0 => done(self.ldh_a8_a(imm.n8(opcode)?)),
            0xE1 => done(self.pop_r16(R16Stack::HL)),
            0xE2 => done(self.ldh_c_a()),
            0xE5 => done(self.push_r16(R16Stack::HL)),
            0xE6 => done(self.and_a_n8(imm.n8(opcode)?)),
            0xE8 => done(self.add_sp_e8(imm.e8(opcode)?)),
            0xE9 => Ok(Outcome::Target(self.jp_hl()?)),
            0xEA => done(self.ld_a16_a(imm.n16(opcode)?)),
            0xEE => done(self.xor_a_n8(imm.n8(opcode)?)),

            0xF0 => done(self.ldh_a_a8(imm.n8(opcode)?)),
            0xF1 => done(self.pop_r16(R16Stack::AF)),
            0xF2 => done(self.ldh_a_c()),
            0xF3 => done(self.di()),
            0xF5 => done(self.push_r16(R16Stack::AF)),
            0xF6 => done(self.or_a_n8(imm.n8(opcode)?)),
            0xF8 => done(self.ld_hl_sp_e8(imm.e8(opcode)?)),
            0xF9 => done(self.ld_sp_hl()),
            0xFA => done(self.ld_a_a16(imm.n16(opcode)?)),
            0xFB => done(self.ei()),
            0xFE => done(self.cp_a_n8(imm.n8(opcode)?)),

            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                done(self.rst(opcode >> 3 & 0x07))
            }

            _ => Err(Error::IllegalOpcode(opcode)),
        }
    }

    /// Execute one CB-prefixed opcode.
    pub fn execute_cb(&mut self, opcode: u8) -> Result<()> {
        let target = encoded_r8(opcode & 0x07);
        let bit = opcode >> 3 & 0x07;
        match (opcode, target) {
            (0x00..=0x07, Some(r)) => self.rlc_r8(r),
            (0x00..=0x07, None) => self.rlc_hl(),
            (0x08..=0x0F, Some(r)) => self.rrc_r8(r),
            (0x08..=0x0F, None) => self.rrc_hl(),
            (0x10..=0x17, Some(r)) => self.rl_r8(r),
            (0x10..=0x17, None) => self.rl_hl(),
            (0x18..=0x1F, Some(r)) => self.rr_r8(r),
            (0x18..=0x1F, None) => self.rr_hl(),
            (0x20..=0x27, Some(r)) => self.sla_r8(r),
            (0x20..=0x27, None) => self.sla_hl(),
            (0x28..=0x2F, Some(r)) => self.sra_r8(r),
            (0x28..=0x2F, None) => self.sra_hl(),
            (0x30..=0x37, Some(r)) => self.swap_r8(r),
            (0x30..=0x37, None) => self.swap_hl(),
            (0x38..=0x3F, Some(r)) => self.srl_r8(r),
            (0x38..=0x3F, None) => self.srl_hl(),
            (0x40..=0x7F, Some(r)) => self.bit_r8(bit, r),
            (0x40..=0x7F, None) => self.bit_hl(bit),
            (0x80..=0xBF, Some(r)) => self.res_r8(bit, r),
            (0x80..=0xBF, None) => self.res_hl(bit),
            (_, Some(r)) => self.set_r8(bit, r),
            (_, None) => self.set_hl(bit),
        }
    }
}
