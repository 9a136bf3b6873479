//! Control-flow facades and miscellaneous primitives.
//!
//! There is no program counter, so JP/JR/CALL/RET evaluate their
//! condition, charge the taken or not-taken cost, and report the outcome;
//! the host performs the actual transfer with native control flow.
//! JP HL returns the HL value for the host to dispatch on (a jump table
//! is the idiomatic shape).  RST routes through the engine's registered
//! restart handlers instead of fixed addresses.

use crate::cpu::Cond;
use crate::engine::Engine;
use crate::error::Result;

impl Engine {
    // ── Miscellaneous ─────────────────────────────────────────

    pub fn nop(&mut self) -> Result<()> {
        self.cycle(1)
    }

    /// Decimal-adjust the accumulator to valid BCD after an addition or
    /// subtraction, using the current N/H/C flags.
    pub fn daa(&mut self) -> Result<()> {
        let mut a = self.regs.a;
        let mut carry = self.regs.f.c();

        if !self.regs.f.n() {
            if self.regs.f.c() || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if self.regs.f.h() || a & 0x0F > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if self.regs.f.c() {
                a = a.wrapping_sub(0x60);
            }
            if self.regs.f.h() {
                a = a.wrapping_sub(0x06);
            }
        }

        self.regs.a = a;
        self.regs.f.set_z(a == 0);
        self.regs.f.set_h(false);
        self.regs.f.set_c(carry);
        self.cycle(1)
    }

    /// Complement A; sets N and H, leaves Z and C.
    pub fn cpl(&mut self) -> Result<()> {
        self.regs.a = !self.regs.a;
        self.regs.f.set_n(true);
        self.regs.f.set_h(true);
        self.cycle(1)
    }

    pub fn scf(&mut self) -> Result<()> {
        self.regs.f.set_n(false);
        self.regs.f.set_h(false);
        self.regs.f.set_c(true);
        self.cycle(1)
    }

    pub fn ccf(&mut self) -> Result<()> {
        let carry = self.regs.f.c();
        self.regs.f.set_n(false);
        self.regs.f.set_h(false);
        self.regs.f.set_c(!carry);
        self.cycle(1)
    }

    pub fn di(&mut self) -> Result<()> {
        self.interrupts.set_master(false);
        self.cycle(1)
    }

    pub fn ei(&mut self) -> Result<()> {
        self.interrupts.set_master(true);
        self.cycle(1)
    }

    /// HALT: the host owns control flow, so there is nothing to wait on;
    /// one machine cycle passes.
    pub fn halt(&mut self) -> Result<()> {
        self.cycle(1)
    }

    /// STOP: likewise a timed no-op.
    pub fn stop(&mut self) -> Result<()> {
        self.cycle(1)
    }

    /// RST: invoke the registered restart handler `vector` (0..=7),
    /// then charge the call cost.
    pub fn rst(&mut self, vector: u8) -> Result<()> {
        self.invoke_restart(vector)?;
        self.cycle(4)
    }

    // ── Control-flow facades ──────────────────────────────────

    /// JP cc,a16: returns whether the branch is taken (4 cycles taken,
    /// 3 not).
    pub fn jp(&mut self, cond: Cond) -> Result<bool> {
        let taken = self.regs.condition(cond);
        self.cycle(if taken { 4 } else { 3 })?;
        Ok(taken)
    }

    /// JP HL: returns the dispatch target held in HL (1 cycle).
    pub fn jp_hl(&mut self) -> Result<u16> {
        let target = self.regs.hl();
        self.cycle(1)?;
        Ok(target)
    }

    /// JR cc,e8: 3 cycles taken, 2 not.
    pub fn jr(&mut self, cond: Cond) -> Result<bool> {
        let taken = self.regs.condition(cond);
        self.cycle(if taken { 3 } else { 2 })?;
        Ok(taken)
    }

    /// CALL cc,a16: 6 cycles taken, 3 not.
    pub fn call(&mut self, cond: Cond) -> Result<bool> {
        let taken = self.regs.condition(cond);
        self.cycle(if taken { 6 } else { 3 })?;
        Ok(taken)
    }

    /// RET: unconditional return, 4 cycles.
    pub fn ret(&mut self) -> Result<()> {
        self.cycle(4)
    }

    /// RET cc: 5 cycles taken, 2 not.
    pub fn ret_cond(&mut self, cond: Cond) -> Result<bool> {
        let taken = self.regs.condition(cond);
        self.cycle(if taken { 5 } else { 2 })?;
        Ok(taken)
    }

    /// RETI: RET plus re-enabling the interrupt master flag.
    pub fn reti(&mut self) -> Result<()> {
        self.interrupts.set_master(true);
        self.cycle(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::R8;
    use crate::interrupts::Interrupt;

    fn engine() -> Engine {
        Engine::new()
    }

    #[test]
    fn nop_only_moves_the_clock() {
        let mut e = engine();
        let a = e.regs.a;
        let f = e.regs.f.bits();
        let sp = e.regs.sp;
        let before = e.cycles();
        e.nop().unwrap();
        assert_eq!(e.cycles(), before + 4);
        assert_eq!(e.regs.a, a);
        assert_eq!(e.regs.f.bits(), f);
        assert_eq!(e.regs.sp, sp);
    }

    #[test]
    fn daa_after_addition() {
        // 0x45 + 0x38 = 0x7D → adjusted to 0x83.
        let mut e = engine();
        e.regs.a = 0x45;
        e.add_a_n8(0x38).unwrap();
        e.daa().unwrap();
        assert_eq!(e.regs.a, 0x83);
        assert!(!e.regs.f.c());
        assert!(!e.regs.f.h());
    }

    #[test]
    fn daa_after_subtraction_applies_n_branch() {
        // BCD 0x83 - 0x38 = 0x45: the borrow path must subtract 0x06.
        let mut e = engine();
        e.regs.a = 0x83;
        e.sub_a_n8(0x38).unwrap();
        assert_eq!(e.regs.a, 0x4B);
        e.daa().unwrap();
        assert_eq!(e.regs.a, 0x45);
        assert!(e.regs.f.n());
    }

    #[test]
    fn daa_addition_carry_path() {
        // 0x99 + 0x01 = 0x9A → 0x00 with carry.
        let mut e = engine();
        e.regs.a = 0x99;
        e.add_a_n8(0x01).unwrap();
        e.daa().unwrap();
        assert_eq!(e.regs.a, 0x00);
        assert!(e.regs.f.z());
        assert!(e.regs.f.c());
    }

    #[test]
    fn cpl_scf_ccf_flag_rules() {
        let mut e = engine();
        e.regs.a = 0x35;
        e.regs.f.set_znhc(true, false, false, false);
        e.cpl().unwrap();
        assert_eq!(e.regs.a, 0xCA);
        assert!(e.regs.f.z());
        assert!(e.regs.f.n());
        assert!(e.regs.f.h());

        e.scf().unwrap();
        assert!(e.regs.f.c());
        assert!(!e.regs.f.n());
        assert!(!e.regs.f.h());
        assert!(e.regs.f.z());

        e.ccf().unwrap();
        assert!(!e.regs.f.c());
        e.ccf().unwrap();
        assert!(e.regs.f.c());
    }

    #[test]
    fn branch_costs_depend_on_outcome() {
        let mut e = engine();
        e.regs.f.set_z(false);

        let before = e.cycles();
        assert!(e.jp(Cond::NZ).unwrap());
        assert_eq!(e.cycles(), before + 16);
        let before = e.cycles();
        assert!(!e.jp(Cond::Z).unwrap());
        assert_eq!(e.cycles(), before + 12);

        let before = e.cycles();
        assert!(e.jr(Cond::Always).unwrap());
        assert_eq!(e.cycles(), before + 12);
        let before = e.cycles();
        assert!(!e.jr(Cond::Z).unwrap());
        assert_eq!(e.cycles(), before + 8);

        let before = e.cycles();
        assert!(e.call(Cond::NZ).unwrap());
        assert_eq!(e.cycles(), before + 24);
        let before = e.cycles();
        assert!(!e.call(Cond::Z).unwrap());
        assert_eq!(e.cycles(), before + 12);

        let before = e.cycles();
        assert!(e.ret_cond(Cond::NZ).unwrap());
        assert_eq!(e.cycles(), before + 20);
        let before = e.cycles();
        assert!(!e.ret_cond(Cond::Z).unwrap());
        assert_eq!(e.cycles(), before + 8);

        let before = e.cycles();
        e.ret().unwrap();
        assert_eq!(e.cycles(), before + 16);
    }

    #[test]
    fn jp_hl_reports_the_target() {
        let mut e = engine();
        e.regs.set_hl(0x1234);
        let before = e.cycles();
        assert_eq!(e.jp_hl().unwrap(), 0x1234);
        assert_eq!(e.cycles(), before + 4);
    }

    #[test]
    fn reti_restores_master_enable() {
        let mut e = engine();
        e.interrupts.set_master(false);
        e.reti().unwrap();
        assert!(e.interrupts.master_enabled());
    }

    #[test]
    fn di_ei_toggle_master() {
        let mut e = engine();
        e.ei().unwrap();
        assert!(e.interrupts.master_enabled());
        e.di().unwrap();
        assert!(!e.interrupts.master_enabled());
    }

    #[test]
    fn rst_routes_through_registered_handler() {
        let mut e = engine();
        e.set_user_data(Box::new(Vec::<u8>::new()));
        for vector in 0..8u8 {
            e.set_restart_handler(
                vector,
                Box::new(move |engine| {
                    engine.user_data_mut::<Vec<u8>>().unwrap().push(vector);
                    Ok(())
                }),
            )
            .unwrap();
        }
        let before = e.cycles();
        e.rst(3).unwrap();
        e.rst(0).unwrap();
        assert_eq!(e.cycles(), before + 32);
        assert_eq!(e.user_data::<Vec<u8>>().unwrap(), &vec![3, 0]);
        assert!(e.rst(8).is_err());
    }

    #[test]
    fn handler_failure_propagates_from_rst() {
        let mut e = engine();
        e.set_restart_handler(1, Box::new(|_| Err(crate::error::Error::Handler("bad".into()))))
            .unwrap();
        assert!(e.rst(1).is_err());
    }

    #[test]
    fn interrupted_host_flow_round_trip() {
        // EI → request → dispatch clears IME → RETI restores it.
        let mut e = engine();
        e.set_interrupt_handler(
            Interrupt::Timer,
            Box::new(|engine| {
                engine.ld_r8_n8(R8::B, 0x77)?;
                engine.reti()
            }),
        );
        e.interrupts.write_enable(Interrupt::Timer.bit());
        e.ei().unwrap();
        e.interrupts.request(Interrupt::Timer);
        e.nop().unwrap();
        assert_eq!(e.regs.b, 0x77);
        assert!(e.interrupts.master_enabled());
    }
}
