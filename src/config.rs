// Engine configuration: bank counts, mixer sample rate.
// Stored as JSON, loadable from a host-chosen path.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Master clock in ticks per second. Four ticks make one machine cycle.
pub const CLOCK_HZ: u32 = 4_194_304;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Work RAM banks of 4 KiB (2..=256).
    pub wram_banks: usize,
    /// Static RAM banks of 8 KiB (1..=256).
    pub sram_banks: usize,
    /// Data store banks of 16 KiB (2..=65536).
    pub data_banks: usize,
    /// Mixer output sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wram_banks: 2,
            sram_banks: 1,
            data_banks: 2,
            sample_rate: 48_000,
        }
    }
}

impl EngineConfig {
    /// Load a config from disk. Invalid or missing files fall back to
    /// defaults with a log line, so a bad config never blocks startup.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("cannot read config {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("cannot parse config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
