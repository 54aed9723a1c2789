// src/transport.rs

use crate::error::TransportError;

/// Register-level access to one I2C device. The slave address is fixed
/// when the handle is opened, so callers only name registers.
///
/// Handles are owned by exactly one sensor driver. After `close()` every
/// other method fails with [`TransportError::Closed`].
pub trait I2cTransport: Send {
    fn read_byte(&mut self, reg: u8) -> Result<u8, TransportError>;
    fn read_block(&mut self, reg: u8, len: usize) -> Result<Vec<u8>, TransportError>;
    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), TransportError>;
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Byte-write / line-read access to one serial port.
///
/// Several drivers may talk over the same physical wire; they must
/// serialize their write+read exchanges through a
/// [`BusArbiter`](crate::arbiter::BusArbiter). The handle itself is owned
/// by exactly one driver and closed exactly once.
pub trait SerialTransport: Send {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;
    /// Blocks until the port's line terminator (or the transport's own
    /// timeout). The terminator is left in the returned string; decoders
    /// trim it.
    fn read_line(&mut self) -> Result<String, TransportError>;
    fn reset_input_buffer(&mut self) -> Result<(), TransportError>;
    fn reset_output_buffer(&mut self) -> Result<(), TransportError>;
    fn close(&mut self) -> Result<(), TransportError>;
}
