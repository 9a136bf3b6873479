//! dotmatrix — a cycle-driven Game Boy-like virtual runtime.
//!
//! The engine reproduces the externally observable behavior of the
//! classic handheld's hardware (CPU flags and instruction effects, the
//! memory map, interrupts, timer, four-channel audio, banked storage)
//! without interpreting an opcode stream.  Game logic is ordinary Rust:
//! host code calls instruction primitives on [`Engine`], and every
//! primitive keeps the hardware subsystems in lockstep with a global
//! cycle counter.
//!
//! ```no_run
//! use dotmatrix::{Engine, R8};
//!
//! let mut engine = Engine::new();
//! engine.ld_r8_n8(R8::A, 0x3A)?;
//! engine.add_a_n8(0x06)?;
//! assert_eq!(engine.regs.a, 0x40);
//! # Ok::<(), dotmatrix::Error>(())
//! ```

pub mod apu;
pub mod banks;
pub mod bus;
pub mod config;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod interrupts;
pub mod joypad;
pub mod network;
pub mod rtc;
pub mod timer;
pub mod video;

pub use apu::Apu;
pub use banks::{DataHandle, DataStore, HighRam, StaticRam, WorkRam};
pub use config::{EngineConfig, CLOCK_HZ};
pub use cpu::dispatch::{Imm, Outcome};
pub use cpu::opcodes::{OpDesc, Operand, CB_OPCODES, OPCODES};
pub use cpu::{Cond, Flags, Registers, R16, R16Stack, R8};
pub use engine::{Engine, Handler};
pub use error::{Error, Result};
pub use interrupts::Interrupt;
pub use joypad::Button;
pub use network::{LoopbackNetwork, NetworkAdapter};
pub use rtc::Rtc;
pub use timer::Timer;
pub use video::{HeadlessVideo, VideoAdapter};
