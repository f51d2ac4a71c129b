//! Serial line backend for UHF readers speaking the CF-series inventory protocol.

use super::{ReaderError, TagReader};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Command that switches the reader into continuous inventory mode.
///
/// Frame layout: length, reader address, command, two checksum bytes.
pub const START_INVENTORY_COMMAND: [u8; 5] = [0x04, 0x00, 0x01, 0xDB, 0x4B];

/// Read timeout for the port. Reads are only issued for bytes already
/// buffered, so this only bounds a device that vanishes mid-read.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Reader attached to a serial port.
pub struct SerialReader {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialReader {
    /// Open the serial port and start continuous inventory.
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, ReaderError> {
        let mut port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        // Drop whatever the reader sent before we were listening
        port.clear(ClearBuffer::Input)?;
        port.write_all(&START_INVENTORY_COMMAND)?;
        port.flush()?;

        tracing::info!("Opened serial port {} at {} baud", path, baud_rate);

        Ok(SerialReader {
            path: path.to_string(),
            port: Some(port),
        })
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ReaderError> {
        self.port.as_mut().ok_or(ReaderError::Closed)
    }
}

impl TagReader for SerialReader {
    fn bytes_available(&mut self) -> Result<usize, ReaderError> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, ReaderError> {
        let available = self.bytes_available()?;
        let mut buf = vec![0u8; available];
        if available == 0 {
            return Ok(buf);
        }

        let n = match self.port()?.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };
        buf.truncate(n);
        Ok(buf)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!("Closed serial port {}", self.path);
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.close();
    }
}
