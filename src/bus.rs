//! Memory map dispatcher.
//!
//! Byte and word accessors route by fixed address range to the owning
//! subsystem; addresses in the 0xFF00-0xFF7F window dispatch through the
//! hardware-register port table below.  Word accesses are little-endian
//! (low byte at the address, high byte above it).  Plain accessors never
//! consume cycles; the `cycle_*` pair charges one machine cycle for the
//! bus access, for primitives whose timing includes one.

use crate::engine::Engine;
use crate::error::{Error, Result};

// ── Hardware register ports (offsets in the 0xFF00 page) ──────

pub const JOYP: u8 = 0x00;
pub const NTS: u8 = 0x01;
pub const NTC: u8 = 0x02;
pub const DIV: u8 = 0x04;
pub const TIMA: u8 = 0x05;
pub const TMA: u8 = 0x06;
pub const TAC: u8 = 0x07;
pub const RTCS: u8 = 0x08;
pub const RTCM: u8 = 0x09;
pub const RTCH: u8 = 0x0A;
pub const RTCDL: u8 = 0x0B;
pub const RTCDH: u8 = 0x0C;
pub const RTCL: u8 = 0x0D;
pub const IF: u8 = 0x0F;
pub const SVBK: u8 = 0x70;
pub const SSBK: u8 = 0x71;
pub const DSBKH: u8 = 0x72;
pub const DSBKL: u8 = 0x73;

/// First and last ports owned by the APU (wave RAM included).
const APU_FIRST: u8 = crate::apu::NR10;
const APU_LAST: u8 = crate::apu::WAVE_LAST;

/// First and last ports owned by the video adapter.
const VIDEO_FIRST: u8 = crate::video::LCDC;
const VIDEO_LAST: u8 = crate::video::GRPM;

impl Engine {
    // ── Byte access ───────────────────────────────────────────

    pub fn read_byte(&mut self, address: u16) -> Result<u8> {
        match address {
            0x0000..=0x7FFF => self.data.read(address),
            0x8000..=0x9FFF => Ok(self.video.vram_read(address - 0x8000)),
            0xA000..=0xBFFF => self.sram.read(address - 0xA000),
            0xC000..=0xDFFF => self.wram.read(address - 0xC000),
            0xE000..=0xE0FF => Ok(self.network.ram_read((address - 0xE000) as u8)),
            // Echo RAM mirrors 0xC100-0xDDFF.
            0xE100..=0xFDFF => self.wram.read(address - 0xE000),
            0xFE00..=0xFE9F => Ok(self.video.oam_read((address - 0xFE00) as u8)),
            0xFF00..=0xFF7F => self.read_port((address & 0x7F) as u8),
            0xFF80..=0xFFFE => self.hram.read(address - 0xFF80),
            0xFFFF => Ok(self.interrupts.read_enable()),
            _ => Err(Error::BadAddress(address)),
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) -> Result<()> {
        match address {
            // The data store is read-only through the bus.
            0x0000..=0x7FFF => {
                log::debug!("discarding write {value:#04x} to read-only {address:#06x}");
                Ok(())
            }
            0x8000..=0x9FFF => {
                self.video.vram_write(address - 0x8000, value);
                Ok(())
            }
            0xA000..=0xBFFF => self.sram.write(address - 0xA000, value),
            0xC000..=0xDFFF => self.wram.write(address - 0xC000, value),
            0xE000..=0xE0FF => {
                self.network.ram_write((address - 0xE000) as u8, value);
                Ok(())
            }
            0xE100..=0xFDFF => self.wram.write(address - 0xE000, value),
            0xFE00..=0xFE9F => {
                self.video.oam_write((address - 0xFE00) as u8, value);
                Ok(())
            }
            0xFF00..=0xFF7F => self.write_port((address & 0x7F) as u8, value),
            0xFF80..=0xFFFE => self.hram.write(address - 0xFF80, value),
            0xFFFF => {
                self.interrupts.write_enable(value);
                Ok(())
            }
            _ => Err(Error::BadAddress(address)),
        }
    }

    // ── Word access (little-endian) ───────────────────────────

    pub fn read_word(&mut self, address: u16) -> Result<u16> {
        let low = self.read_byte(address)? as u16;
        let high = self.read_byte(address.wrapping_add(1))? as u16;
        Ok(high << 8 | low)
    }

    pub fn write_word(&mut self, address: u16, value: u16) -> Result<()> {
        self.write_byte(address, value as u8)?;
        self.write_byte(address.wrapping_add(1), (value >> 8) as u8)
    }

    // ── Cycle-charging access ─────────────────────────────────

    /// Read a byte and charge one machine cycle for the bus access.
    pub fn cycle_read_byte(&mut self, address: u16) -> Result<u8> {
        let value = self.read_byte(address)?;
        self.cycle(1)?;
        Ok(value)
    }

    /// Write a byte and charge one machine cycle for the bus access.
    pub fn cycle_write_byte(&mut self, address: u16, value: u8) -> Result<()> {
        self.write_byte(address, value)?;
        self.cycle(1)
    }

    // ── Port table ────────────────────────────────────────────

    fn read_port(&mut self, port: u8) -> Result<u8> {
        match port {
            JOYP => Ok(self.joypad.read()),
            NTS => Ok(self.network.read_status()),
            NTC => Ok(self.network.read_control()),
            DIV => Ok(self.timer.read_div()),
            TIMA => Ok(self.timer.read_tima()),
            TMA => Ok(self.timer.read_tma()),
            TAC => Ok(self.timer.read_tac()),
            RTCS => Ok(self.rtc.read_seconds()),
            RTCM => Ok(self.rtc.read_minutes()),
            RTCH => Ok(self.rtc.read_hours()),
            RTCDL => Ok(self.rtc.read_day_low()),
            RTCDH => Ok(self.rtc.read_day_high()),
            // The latch port is write-only.
            RTCL => Ok(0xFF),
            IF => Ok(self.interrupts.read_flags()),
            APU_FIRST..=APU_LAST => self.apu.read_register(port),
            VIDEO_FIRST..=VIDEO_LAST => self.video.reg_read(port),
            SVBK => Ok(self.wram.selected()),
            SSBK => Ok(self.sram.selected()),
            DSBKH => Ok(self.data.read_bank_high()),
            DSBKL => Ok(self.data.read_bank_low()),
            _ => Err(Error::BadAddress(0xFF00 | port as u16)),
        }
    }

    fn write_port(&mut self, port: u8, value: u8) -> Result<()> {
        match port {
            JOYP => self.joypad.write(value),
            NTS => self.network.write_status(value),
            NTC => self.network.write_control(value),
            DIV => self.timer.write_div(),
            TIMA => self.timer.write_tima(value),
            TMA => self.timer.write_tma(value),
            TAC => self.timer.write_tac(value),
            // Clock registers are read-only; only the latch port acts.
            RTCS | RTCM | RTCH | RTCDL | RTCDH => {}
            RTCL => self.rtc.latch(),
            IF => self.interrupts.write_flags(value),
            APU_FIRST..=APU_LAST => return self.apu.write_register(port, value),
            crate::video::DMA => {
                self.oam_dma.start(value);
                return self.video.reg_write(port, value);
            }
            VIDEO_FIRST..=VIDEO_LAST => return self.video.reg_write(port, value),
            SVBK => self.wram.select(value),
            SSBK => self.sram.select(value),
            DSBKH => self.data.write_bank_high(value),
            DSBKL => self.data.write_bank_low(value),
            _ => return Err(Error::BadAddress(0xFF00 | port as u16)),
        }
        Ok(())
    }
}
