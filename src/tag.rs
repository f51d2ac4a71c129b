//! Tag identifiers and the read events recovered from the reader stream.

use std::fmt;

/// Width of an EPC identifier in bytes.
pub const EPC_LEN: usize = 12;

/// A 96-bit EPC tag identifier stored as raw bytes.
///
/// Stored as a fixed array so it is `Copy` and cheap to hash, which keeps the
/// deduplication map free of per-read string allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epc(pub [u8; EPC_LEN]);

impl fmt::Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// A single tag observation extracted from one reader buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEvent {
    /// Tag identifier, always starting with the frame marker
    pub epc: Epc,
    /// Received signal strength in dBm, absent when the buffer ended right after the EPC
    pub rssi: Option<i8>,
}
