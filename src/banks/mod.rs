//! Banked storage: work RAM, static RAM, high RAM, and the read-only
//! data store.  Each store validates addresses, clamps bank selectors,
//! and supports dynamic resizing that preserves contents on growth and
//! truncates on shrink.

pub mod data_store;
pub mod hram;
pub mod sram;
pub mod wram;

pub use data_store::{DataHandle, DataStore};
pub use hram::HighRam;
pub use sram::StaticRam;
pub use wram::WorkRam;
