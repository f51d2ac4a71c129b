//! Byte source abstraction for the RFID reader.
//!
//! The poll loop only needs to know how many bytes are waiting, to take them,
//! and to release the device when it stops. Link setup (port, line settings,
//! the start-inventory command) belongs to the concrete backend.

pub mod serial;

pub use serial::SerialReader;

use thiserror::Error;

/// Error type for device transport operations.
///
/// Any of these ends the poll loop.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    /// Read or write on an open device failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Device was used after `close`
    #[error("Reader is closed")]
    Closed,
}

/// Device transport owned exclusively by the poll loop.
pub trait TagReader: Send {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, ReaderError>;

    /// Take every byte currently buffered by the device.
    ///
    /// Returns an empty buffer when nothing is waiting.
    fn read_available(&mut self) -> Result<Vec<u8>, ReaderError>;

    /// Release the device. Calling it again is a no-op.
    fn close(&mut self);
}
