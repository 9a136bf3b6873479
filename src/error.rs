//! Error taxonomy for the runtime.
//!
//! Three kinds of failure flow through the crate:
//! - precondition violations (bad address, bad bit index, bad restart
//!   vector): programming bugs in host code, fatal to the current call;
//! - bounded domain failures (save-file size, handle collisions): the
//!   operation reports failure and engine state is unchanged;
//! - transport failures never surface as `Err`; the network status
//!   register records them and the Network interrupt is requested.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Address routed to no memory region or hardware port.
    #[error("no owner for address {0:#06x}")]
    BadAddress(u16),

    /// Bit index outside 0..=7 passed to a bit operation.
    #[error("bit index {0} out of range")]
    BadBit(u8),

    /// Restart vector outside 0..=7.
    #[error("restart vector {0} out of range")]
    BadVector(u8),

    /// One of the eleven holes in the primary opcode map.
    #[error("illegal opcode {0:#04x}")]
    IllegalOpcode(u8),

    /// Opcode dispatched without the immediate operand its encoding
    /// carries (or with the wrong kind).
    #[error("opcode {0:#04x} needs its immediate operand")]
    MissingImmediate(u8),

    /// An interrupt or restart handler reported failure.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A data handle with this name already exists in the store.
    #[error("data handle {0:?} already exists")]
    HandleExists(String),

    /// Data handle name is empty or longer than the 32-byte limit.
    #[error("invalid data handle name {0:?}")]
    HandleName(String),

    /// The named asset does not fit in the remaining space of its bank.
    #[error("asset of {len} bytes does not fit in bank {bank} at offset {offset:#06x}")]
    BankOverflow { bank: u16, offset: u16, len: usize },

    /// Bank index outside the store's configured range.
    #[error("bank {0} out of range")]
    BadBank(u16),

    /// Save file is empty, not a multiple of the bank size, or too large.
    #[error("save file size {0} is not a non-zero multiple of 8 KiB (max 2 MiB)")]
    BadSaveSize(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
