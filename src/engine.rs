//! The engine aggregate and the cycle driver.
//!
//! One `Engine` owns every subsystem exclusively and is the only thing a
//! host holds.  Host code calls instruction primitives (the `cpu`
//! modules) and register accessors; each primitive ends by charging
//! machine cycles through [`Engine::cycle`], which fans a clock tick out
//! to every time-driven subsystem in fixed order: timer → APU → video →
//! network → interrupt service.  One machine cycle is four clock ticks;
//! the OAM DMA engine moves one byte per machine cycle.
//!
//! Subsystems never see the engine.  Their tick methods return small
//! event records, and the fan-out loop here converts those into
//! interrupt requests.

use std::any::Any;

use crate::apu::{Apu, SampleCallback};
use crate::banks::{DataStore, HighRam, StaticRam, WorkRam};
use crate::config::EngineConfig;
use crate::cpu::Registers;
use crate::error::{Error, Result};
use crate::interrupts::{Interrupt, Interrupts};
use crate::joypad::{Button, Joypad};
use crate::network::{LoopbackNetwork, NetworkAdapter};
use crate::rtc::Rtc;
use crate::timer::Timer;
use crate::video::{HeadlessVideo, OamDma, VideoAdapter};

/// Callback invoked when an interrupt is dispatched or a restart vector
/// fires.  Handlers run on the calling thread, mid-tick; they may access
/// memory and registers but must not re-enter [`Engine::cycle`].
pub type Handler = Box<dyn FnMut(&mut Engine) -> Result<()>>;

/// Divider bit whose falling edge paces the APU (the DIV-APU event).
const APU_DIVIDER_BIT: u8 = 12;
/// Divider bit whose falling edge drives network transfer timeouts.
const NETWORK_TIMEOUT_BIT: u8 = 14;

pub struct Engine {
    /// CPU register file (the instruction primitives live in `cpu::*`).
    pub regs: Registers,

    pub timer: Timer,
    pub interrupts: Interrupts,
    pub apu: Apu,
    pub wram: WorkRam,
    pub sram: StaticRam,
    pub hram: HighRam,
    pub data: DataStore,
    pub video: Box<dyn VideoAdapter>,
    pub network: Box<dyn NetworkAdapter>,
    pub rtc: Rtc,
    pub joypad: Joypad,

    pub(crate) oam_dma: OamDma,

    cycles: u64,
    irq_handlers: [Option<Handler>; 6],
    rst_handlers: [Option<Handler>; 8],
    user_data: Option<Box<dyn Any>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            regs: Registers::new(),
            timer: Timer::new(),
            interrupts: Interrupts::new(),
            apu: Apu::new(config.sample_rate),
            wram: WorkRam::new(config.wram_banks),
            sram: StaticRam::new(config.sram_banks),
            hram: HighRam::new(),
            data: DataStore::new(config.data_banks),
            video: Box::new(HeadlessVideo::new()),
            network: Box::new(LoopbackNetwork::new()),
            rtc: Rtc::new(),
            joypad: Joypad::new(),
            oam_dma: OamDma::default(),
            cycles: 0,
            irq_handlers: std::array::from_fn(|_| None),
            rst_handlers: std::array::from_fn(|_| None),
            user_data: None,
        }
    }

    /// Global cycle counter, in clock ticks.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    // ── Cycle driver ──────────────────────────────────────────

    /// Advance `machine_cycles` machine cycles (four clock ticks each).
    ///
    /// Within a tick the fan-out order is observable: the timer
    /// increments its divider before the APU samples the DIV edge, and
    /// interrupt service runs last.  A failing subsystem access or
    /// handler aborts immediately with its error.
    pub fn cycle(&mut self, machine_cycles: u32) -> Result<()> {
        for _ in 0..machine_cycles {
            for _ in 0..4 {
                self.cycles += 1;

                let timer_tick = self.timer.tick();
                if timer_tick.tima_overflow {
                    self.interrupts.request(Interrupt::Timer);
                }

                self.apu.tick(self.timer.divider_bit_edge(APU_DIVIDER_BIT));

                let video_tick = self.video.tick();
                if video_tick.vblank {
                    self.interrupts.request(Interrupt::VBlank);
                }
                if video_tick.stat {
                    self.interrupts.request(Interrupt::LcdStat);
                }

                let net_tick = self
                    .network
                    .tick(self.timer.divider_bit_edge(NETWORK_TIMEOUT_BIT));
                if net_tick.interrupt {
                    self.interrupts.request(Interrupt::Network);
                }

                self.service_interrupt()?;
            }
            self.tick_oam_dma()?;
        }
        Ok(())
    }

    /// Dispatch at most one pending interrupt.  The handler slot is
    /// taken for the duration of the call so the handler itself can use
    /// the engine; a handler registered from inside a handler wins over
    /// the one being restored.
    fn service_interrupt(&mut self) -> Result<()> {
        if !self.interrupts.master_enabled() {
            return Ok(());
        }
        let Some(kind) = self.interrupts.pending() else {
            return Ok(());
        };
        self.interrupts.acknowledge(kind);
        log::debug!("dispatching {kind:?} interrupt");

        let slot = kind as usize;
        let mut handler = self.irq_handlers[slot].take();
        let result = match handler.as_mut() {
            Some(h) => h(self),
            None => Ok(()),
        };
        if self.irq_handlers[slot].is_none() {
            self.irq_handlers[slot] = handler;
        }
        result
    }

    /// Move one OAM DMA byte (called once per machine cycle).
    fn tick_oam_dma(&mut self) -> Result<()> {
        if !self.oam_dma.active() {
            return Ok(());
        }
        let (source, index) = self.oam_dma.next();
        let byte = self.read_byte(source)?;
        self.video.oam_write(index, byte);
        self.oam_dma.advance();
        Ok(())
    }

    // ── Host registration ─────────────────────────────────────

    /// Install the handler invoked when `kind` is dispatched.
    pub fn set_interrupt_handler(&mut self, kind: Interrupt, handler: Handler) {
        self.irq_handlers[kind as usize] = Some(handler);
    }

    pub fn clear_interrupt_handler(&mut self, kind: Interrupt) {
        self.irq_handlers[kind as usize] = None;
    }

    /// Install the handler for restart vector `vector` (0..=7).
    pub fn set_restart_handler(&mut self, vector: u8, handler: Handler) -> Result<()> {
        let slot = self
            .rst_handlers
            .get_mut(vector as usize)
            .ok_or(Error::BadVector(vector))?;
        *slot = Some(handler);
        Ok(())
    }

    /// Invoke restart handler `vector` with the same take/restore
    /// discipline as interrupt dispatch.
    pub(crate) fn invoke_restart(&mut self, vector: u8) -> Result<()> {
        if vector as usize >= self.rst_handlers.len() {
            return Err(Error::BadVector(vector));
        }
        let slot = vector as usize;
        let mut handler = self.rst_handlers[slot].take();
        let result = match handler.as_mut() {
            Some(h) => h(self),
            None => Ok(()),
        };
        if self.rst_handlers[slot].is_none() {
            self.rst_handlers[slot] = handler;
        }
        result
    }

    /// Register the APU's stereo sample sink.
    pub fn set_sample_callback(&mut self, callback: SampleCallback) {
        self.apu.set_sample_callback(callback);
    }

    /// Swap in a real video back-end.
    pub fn set_video_adapter(&mut self, adapter: Box<dyn VideoAdapter>) {
        self.video = adapter;
    }

    /// Swap in a real network transport.
    pub fn set_network_adapter(&mut self, adapter: Box<dyn NetworkAdapter>) {
        self.network = adapter;
    }

    /// Inject a button transition; a release→press edge requests the
    /// Joypad interrupt.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if self.joypad.set_button(button, pressed) {
            self.interrupts.request(Interrupt::Joypad);
        }
    }

    // ── User data ─────────────────────────────────────────────

    /// Attach opaque host state, retrievable from handlers.
    pub fn set_user_data(&mut self, data: Box<dyn Any>) {
        self.user_data = Some(data);
    }

    pub fn user_data<T: 'static>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub fn user_data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.user_data.as_mut()?.downcast_mut()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
