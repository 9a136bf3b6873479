//! Latched real-time clock.
//!
//! The clock registers are read-only snapshots; a write to the latch
//! port samples wall time once and freezes it into the five registers.
//! This is the only place in the runtime that observes wall time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Day counter rolls over after 512 days; the carry bit records it.
const DAY_SPAN: u64 = 512;

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    seconds: u8,
    minutes: u8,
    hours: u8,
    day_low: u8,
    day_high: u8,
}

pub struct Rtc {
    latched: Snapshot,
}

impl Rtc {
    pub fn new() -> Self {
        Self {
            latched: Snapshot::default(),
        }
    }

    /// Latch the current wall time into the registers.
    pub fn latch(&mut self) {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.latched = Self::snapshot(secs);
        log::debug!(
            "RTC latched {:02}:{:02}:{:02} day {}",
            self.latched.hours,
            self.latched.minutes,
            self.latched.seconds,
            (self.latched.day_high as u16 & 1) << 8 | self.latched.day_low as u16,
        );
    }

    fn snapshot(total_secs: u64) -> Snapshot {
        let days = total_secs / 86_400;
        Snapshot {
            seconds: (total_secs % 60) as u8,
            minutes: (total_secs / 60 % 60) as u8,
            hours: (total_secs / 3_600 % 24) as u8,
            day_low: (days % DAY_SPAN) as u8,
            day_high: ((days % DAY_SPAN) >> 8) as u8 | if days >= DAY_SPAN { 0x80 } else { 0 },
        }
    }

    pub fn read_seconds(&self) -> u8 {
        self.latched.seconds
    }

    pub fn read_minutes(&self) -> u8 {
        self.latched.minutes
    }

    pub fn read_hours(&self) -> u8 {
        self.latched.hours
    }

    pub fn read_day_low(&self) -> u8 {
        self.latched.day_low
    }

    /// Bit 0 is day bit 8, bit 7 the day-counter carry.
    pub fn read_day_high(&self) -> u8 {
        self.latched.day_high
    }
}

impl Default for Rtc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decomposes_time() {
        // 1 day, 2 hours, 3 minutes, 4 seconds.
        let s = Rtc::snapshot(86_400 + 2 * 3_600 + 3 * 60 + 4);
        assert_eq!(s.seconds, 4);
        assert_eq!(s.minutes, 3);
        assert_eq!(s.hours, 2);
        assert_eq!(s.day_low, 1);
        assert_eq!(s.day_high, 0);
    }

    #[test]
    fn day_counter_carries_after_512_days() {
        let s = Rtc::snapshot(DAY_SPAN * 86_400 + 5);
        assert_eq!(s.day_low, 0);
        assert_eq!(s.day_high & 0x80, 0x80);
        let s = Rtc::snapshot(300 * 86_400);
        assert_eq!(s.day_low, 300u64 as u8);
        assert_eq!(s.day_high & 0x01, 1);
    }

    #[test]
    fn registers_hold_until_latched() {
        let mut rtc = Rtc::new();
        assert_eq!(rtc.read_seconds(), 0);
        assert_eq!(rtc.read_day_high(), 0);
        rtc.latch();
        // Wall time has advanced past the epoch in any sane environment.
        let any = rtc.read_seconds() as u32
            + rtc.read_minutes() as u32
            + rtc.read_hours() as u32
            + rtc.read_day_low() as u32;
        assert!(any > 0);
    }
}
