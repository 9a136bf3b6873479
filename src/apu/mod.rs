//! Audio processing unit: four channels, the stereo mixer, and the
//! sample callback.
//!
//! Channel pacing hangs off two clocks.  The period dividers run from
//! the tick stream itself (wave every 2nd tick, pulse every 4th, noise
//! at its own computed period).  Length timers, the channel-1 frequency
//! sweep, and the volume envelopes run from DIV-APU events — falling
//! edges of divider bit 12, handed in by the engine once per tick.
//!
//! Every `mix_clock` ticks the mixer sums the panned channel DACs,
//! applies per-side master volume and a first-order high-pass filter,
//! and hands one stereo frame to the registered callback.

pub mod noise;
pub mod pulse;
pub mod wave;

use crate::error::{Error, Result};

pub use noise::NoiseChannel;
pub use pulse::PulseChannel;
pub use wave::WaveChannel;

// ── Register ports (offsets in the 0xFF00 page) ───────────────

pub const NR10: u8 = 0x10;
pub const NR11: u8 = 0x11;
pub const NR12: u8 = 0x12;
pub const NR13: u8 = 0x13;
pub const NR14: u8 = 0x14;
pub const NR21: u8 = 0x16;
pub const NR22: u8 = 0x17;
pub const NR23: u8 = 0x18;
pub const NR24: u8 = 0x19;
pub const NR30: u8 = 0x1A;
pub const NR31: u8 = 0x1B;
pub const NR32: u8 = 0x1C;
pub const NR33: u8 = 0x1D;
pub const NR34: u8 = 0x1E;
pub const NR41: u8 = 0x20;
pub const NR42: u8 = 0x21;
pub const NR43: u8 = 0x22;
pub const NR44: u8 = 0x23;
pub const NR50: u8 = 0x24;
pub const NR51: u8 = 0x25;
pub const NR52: u8 = 0x26;
pub const WAVE_FIRST: u8 = 0x30;
pub const WAVE_LAST: u8 = 0x3F;

/// High-pass filter coefficient for the mixer output.
const HPF_ALPHA: f32 = 0.999_958;

/// Convert a 4-bit DAC input to an analog level in [-1.0, +1.0].
/// The DAC is inverting: input 0 maps to +1.0, input 15 to -1.0.
pub(crate) fn dac_analog(input: u8) -> f32 {
    -(input as f32 / 7.5 - 1.0)
}

/// Receives one stereo frame per mix-clock period.
pub type SampleCallback = Box<dyn FnMut(f32, f32) + Send>;

// ── High-pass filter ──────────────────────────────────────────

/// One-pole high-pass: `y[n] = x[n] - x[n-1] + α·y[n-1]`.
#[derive(Default)]
struct HighPass {
    prev_in: f32,
    prev_out: f32,
}

impl HighPass {
    fn process(&mut self, x: f32) -> f32 {
        let y = x - self.prev_in + HPF_ALPHA * self.prev_out;
        self.prev_in = x;
        self.prev_out = y;
        y
    }
}

// ── APU ───────────────────────────────────────────────────────

pub struct Apu {
    enabled: bool,
    pub ch1: PulseChannel,
    pub ch2: PulseChannel,
    pub ch3: WaveChannel,
    pub ch4: NoiseChannel,

    /// NR51 stereo panning mask: bits 0-3 route channels 1-4 right,
    /// bits 4-7 left.
    panning: u8,
    /// NR50 master volume: left in bits 6-4, right in bits 2-0
    /// (VIN select bits 7/3 are stored but unused).
    master: u8,

    /// DIV-APU event counter.
    divider: u32,
    /// Clock tick phase for the 2:1 / 4:1 period-divider rates.
    tick_count: u64,

    /// Ticks between mixer output frames (clock rate / sample rate).
    mix_clock: u32,
    mix_counter: u32,
    hpf_left: HighPass,
    hpf_right: HighPass,
    callback: Option<SampleCallback>,
}

impl Apu {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            enabled: false,
            ch1: PulseChannel::new(true),
            ch2: PulseChannel::new(false),
            ch3: WaveChannel::new(),
            ch4: NoiseChannel::new(),
            panning: 0,
            master: 0,
            divider: 0,
            tick_count: 0,
            mix_clock: (crate::config::CLOCK_HZ / sample_rate.max(1)).max(1),
            mix_counter: 0,
            hpf_left: HighPass::default(),
            hpf_right: HighPass::default(),
            callback: None,
        }
    }

    /// Register the stereo sample sink.
    pub fn set_sample_callback(&mut self, callback: SampleCallback) {
        self.callback = Some(callback);
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    // ── Clocking ──────────────────────────────────────────────

    /// Advance one clock tick.  `divider_edge` reports whether timer
    /// bit 12 fell in this tick (the DIV-APU event).
    pub fn tick(&mut self, divider_edge: bool) {
        if self.enabled {
            self.tick_count = self.tick_count.wrapping_add(1);
            if self.tick_count % 2 == 0 {
                self.ch3.tick_period();
            }
            if self.tick_count % 4 == 0 {
                self.ch1.tick_period();
                self.ch2.tick_period();
            }
            self.ch4.tick();
            if divider_edge {
                self.divider_event();
            }
        }

        self.mix_counter += 1;
        if self.mix_counter >= self.mix_clock {
            self.mix_counter = 0;
            self.mix();
        }
    }

    /// DIV-APU pacing: length timers every 2nd event, the channel-1
    /// sweep every 4th, envelopes every 8th.
    fn divider_event(&mut self) {
        self.divider = self.divider.wrapping_add(1);
        if self.divider % 2 == 0 {
            self.ch1.tick_length();
            self.ch2.tick_length();
            self.ch3.tick_length();
            self.ch4.tick_length();
        }
        if self.divider % 4 == 0 {
            self.ch1.tick_sweep();
        }
        if self.divider % 8 == 0 {
            self.ch1.tick_envelope();
            self.ch2.tick_envelope();
            self.ch4.tick_envelope();
        }
    }

    fn mix(&mut self) {
        let live = [
            (self.ch1.enabled && self.ch1.dac_enabled(), self.ch1.output()),
            (self.ch2.enabled && self.ch2.dac_enabled(), self.ch2.output()),
            (self.ch3.enabled && self.ch3.dac_enabled(), self.ch3.output()),
            (self.ch4.enabled && self.ch4.dac_enabled(), self.ch4.output()),
        ];

        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for (i, &(on, out)) in live.iter().enumerate() {
            if !on {
                continue;
            }
            if self.panning & 1 << (4 + i) != 0 {
                left += out;
            }
            if self.panning & 1 << i != 0 {
                right += out;
            }
        }

        let left_vol = (self.master >> 4 & 0x07) as f32 / 7.5;
        let right_vol = (self.master & 0x07) as f32 / 7.5;
        let l = self.hpf_left.process(left * left_vol) / 4.0;
        let r = self.hpf_right.process(right * right_vol) / 4.0;

        if let Some(cb) = self.callback.as_mut() {
            cb(l, r);
        }
    }

    // ── Power control ─────────────────────────────────────────

    /// Clearing NR52 bit 7 zeroes every APU register except NR52 itself
    /// (wave RAM survives) and freezes the register file until power
    /// returns.
    fn power_off(&mut self) {
        log::debug!("APU powered off");
        self.enabled = false;
        self.ch1.clear();
        self.ch2.clear();
        self.ch3.clear();
        self.ch4.clear();
        self.panning = 0;
        self.master = 0;
        self.divider = 0;
        self.tick_count = 0;
    }

    fn power_on(&mut self) {
        if !self.enabled {
            log::debug!("APU powered on");
        }
        self.enabled = true;
    }

    // ── Register file ─────────────────────────────────────────

    /// Read an APU port.  Write-only fields read back as zero; while the
    /// APU is off the whole file reads zero.
    pub fn read_register(&self, port: u8) -> Result<u8> {
        let value = match port {
            NR10 => self.ch1.read_sweep(),
            NR11 => self.ch1.read_length_duty(),
            NR12 => self.ch1.read_envelope(),
            NR13 => 0,
            NR14 => self.ch1.read_period_high(),
            NR21 => self.ch2.read_length_duty(),
            NR22 => self.ch2.read_envelope(),
            NR23 => 0,
            NR24 => self.ch2.read_period_high(),
            NR30 => self.ch3.read_dac_enable(),
            NR31 => 0,
            NR32 => self.ch3.read_output_level(),
            NR33 => 0,
            NR34 => self.ch3.read_period_high(),
            NR41 => 0,
            NR42 => self.ch4.read_envelope(),
            NR43 => self.ch4.read_frequency(),
            NR44 => self.ch4.read_control(),
            NR50 => self.master,
            NR51 => self.panning,
            NR52 => {
                (self.enabled as u8) << 7
                    | (self.ch4.enabled as u8) << 3
                    | (self.ch3.enabled as u8) << 2
                    | (self.ch2.enabled as u8) << 1
                    | self.ch1.enabled as u8
            }
            WAVE_FIRST..=WAVE_LAST => self.ch3.read_wave_ram(port - WAVE_FIRST),
            _ => return Err(Error::BadAddress(0xFF00 | port as u16)),
        };
        Ok(value)
    }

    /// Write an APU port.  While the APU is off only NR52 and wave RAM
    /// are writable.
    pub fn write_register(&mut self, port: u8, value: u8) -> Result<()> {
        if !self.enabled && port != NR52 && !(WAVE_FIRST..=WAVE_LAST).contains(&port) {
            return Ok(());
        }
        match port {
            NR10 => self.ch1.write_sweep(value),
            NR11 => self.ch1.write_length_duty(value),
            NR12 => self.ch1.write_envelope(value),
            NR13 => self.ch1.write_period_low(value),
            NR14 => self.ch1.write_period_high(value),
            NR21 => self.ch2.write_length_duty(value),
            NR22 => self.ch2.write_envelope(value),
            NR23 => self.ch2.write_period_low(value),
            NR24 => self.ch2.write_period_high(value),
            NR30 => self.ch3.write_dac_enable(value),
            NR31 => self.ch3.write_length(value),
            NR32 => self.ch3.write_output_level(value),
            NR33 => self.ch3.write_period_low(value),
            NR34 => self.ch3.write_period_high(value),
            NR41 => self.ch4.write_length(value),
            NR42 => self.ch4.write_envelope(value),
            NR43 => self.ch4.write_frequency(value),
            NR44 => self.ch4.write_control(value),
            NR50 => self.master = value,
            NR51 => self.panning = value,
            NR52 => {
                if value & 0x80 != 0 {
                    self.power_on();
                } else if self.enabled {
                    self.power_off();
                }
            }
            WAVE_FIRST..=WAVE_LAST => self.ch3.write_wave_ram(port - WAVE_FIRST, value),
            _ => return Err(Error::BadAddress(0xFF00 | port as u16)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_apu() -> Apu {
        let mut apu = Apu::new(48_000);
        apu.write_register(NR52, 0x80).unwrap();
        apu
    }

    #[test]
    fn power_off_wipes_registers() {
        let mut apu = powered_apu();
        apu.write_register(NR10, 0x55).unwrap();
        apu.write_register(NR12, 0xF3).unwrap();
        apu.write_register(NR32, 0x60).unwrap();
        apu.write_register(NR43, 0xA5).unwrap();
        apu.write_register(NR50, 0x77).unwrap();
        apu.write_register(NR51, 0xFF).unwrap();

        apu.write_register(NR52, 0x00).unwrap();
        for port in [NR10, NR11, NR12, NR13, NR14, NR21, NR22, NR23, NR24,
                     NR30, NR31, NR32, NR33, NR34, NR41, NR42, NR43, NR44,
                     NR50, NR51]
        {
            assert_eq!(apu.read_register(port).unwrap(), 0, "port {port:#04x}");
        }
    }

    #[test]
    fn writes_ignored_while_off() {
        let mut apu = powered_apu();
        apu.write_register(NR52, 0x00).unwrap();
        apu.write_register(NR12, 0xF0).unwrap();
        assert_eq!(apu.read_register(NR12).unwrap(), 0);
        apu.write_register(NR52, 0x80).unwrap();
        apu.write_register(NR12, 0xF0).unwrap();
        assert_eq!(apu.read_register(NR12).unwrap(), 0xF0);
    }

    #[test]
    fn wave_ram_survives_power_cycle() {
        let mut apu = powered_apu();
        apu.write_register(WAVE_FIRST, 0xA5).unwrap();
        apu.write_register(NR52, 0x00).unwrap();
        assert_eq!(apu.read_register(WAVE_FIRST).unwrap(), 0xA5);
    }

    #[test]
    fn nr52_reports_channel_status() {
        let mut apu = powered_apu();
        assert_eq!(apu.read_register(NR52).unwrap(), 0x80);
        apu.write_register(NR12, 0xF0).unwrap();
        apu.write_register(NR14, 0x80).unwrap();
        assert_eq!(apu.read_register(NR52).unwrap(), 0x81);
        apu.write_register(NR42, 0xF0).unwrap();
        apu.write_register(NR44, 0x80).unwrap();
        assert_eq!(apu.read_register(NR52).unwrap(), 0x89);
    }

    #[test]
    fn trigger_without_dac_leaves_channel_off() {
        let mut apu = powered_apu();
        apu.write_register(NR12, 0x00).unwrap();
        apu.write_register(NR14, 0x80).unwrap();
        assert_eq!(apu.read_register(NR52).unwrap() & 0x01, 0);
    }

    #[test]
    fn nr11_reads_duty_bits_only() {
        let mut apu = powered_apu();
        apu.write_register(NR11, 0xBF).unwrap();
        assert_eq!(apu.read_register(NR11).unwrap(), 0x80);
        apu.write_register(NR21, 0x7A).unwrap();
        assert_eq!(apu.read_register(NR21).unwrap(), 0x40);
    }

    #[test]
    fn mixer_emits_at_sample_rate() {
        let mut apu = powered_apu();
        let frames = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = frames.clone();
        apu.set_sample_callback(Box::new(move |_, _| {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }));
        let mix_clock = crate::config::CLOCK_HZ / 48_000;
        for _ in 0..mix_clock * 10 {
            apu.tick(false);
        }
        assert_eq!(frames.load(std::sync::atomic::Ordering::Relaxed), 10);
    }

    #[test]
    fn unused_ports_have_no_owner() {
        let apu = powered_apu();
        assert!(matches!(apu.read_register(0x15), Err(Error::BadAddress(_))));
        assert!(matches!(apu.read_register(0x27), Err(Error::BadAddress(_))));
    }
}
