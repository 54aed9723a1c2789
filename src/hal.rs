// src/hal.rs

//! Linux transport backends: I2C through the kernel's i2c-dev interface,
//! serial through `serialport`. Everything here is glue; the traits in
//! [`transport`](crate::transport) are the surface the drivers see.

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use serialport::{ClearBuffer, SerialPort};

use crate::error::TransportError;
use crate::transport::{I2cTransport, SerialTransport};

/// Bus index the Pi exposes its primary I2C header on.
pub const DEFAULT_I2C_BUS: u8 = 1;
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// A line that has not arrived by then counts as a transport fault.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Owned connection to one I2C slave. The address is fixed at open.
pub struct I2cHandle {
    dev: Option<LinuxI2CDevice>,
}

impl I2cHandle {
    pub fn open(bus: u8, address: u16) -> Result<Self, TransportError> {
        let dev = LinuxI2CDevice::new(format!("/dev/i2c-{bus}"), address)
            .map_err(|e| TransportError::Bus(e.to_string()))?;
        Ok(Self { dev: Some(dev) })
    }

    fn dev(&mut self) -> Result<&mut LinuxI2CDevice, TransportError> {
        self.dev.as_mut().ok_or(TransportError::Closed)
    }
}

impl I2cTransport for I2cHandle {
    fn read_byte(&mut self, reg: u8) -> Result<u8, TransportError> {
        self.dev()?
            .smbus_read_byte_data(reg)
            .map_err(|e| TransportError::Bus(e.to_string()))
    }

    fn read_block(&mut self, reg: u8, len: usize) -> Result<Vec<u8>, TransportError> {
        let dev = self.dev()?;
        dev.write(&[reg])
            .map_err(|e| TransportError::Bus(e.to_string()))?;
        let mut buf = vec![0u8; len];
        dev.read(&mut buf)
            .map_err(|e| TransportError::Bus(e.to_string()))?;
        Ok(buf)
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.dev()?
            .smbus_write_byte_data(reg, value)
            .map_err(|e| TransportError::Bus(e.to_string()))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the device releases the file descriptor.
        self.dev.take();
        Ok(())
    }
}

/// Owned connection to one serial port.
pub struct SerialHandle {
    port: Option<BufReader<Box<dyn SerialPort>>>,
}

impl SerialHandle {
    pub fn open(path: &str, baud: u32) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud)
            .timeout(SERIAL_READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::Bus(e.to_string()))?;
        Ok(Self {
            port: Some(BufReader::new(port)),
        })
    }

    /// Opens the repository's shared default port.
    pub fn open_default() -> Result<Self, TransportError> {
        Self::open(DEFAULT_SERIAL_PORT, DEFAULT_BAUD_RATE)
    }

    fn port(&mut self) -> Result<&mut BufReader<Box<dyn SerialPort>>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl SerialTransport for SerialHandle {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let port = self.port()?.get_mut();
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let mut line = String::new();
        self.port()?.read_line(&mut line)?;
        Ok(line)
    }

    fn reset_input_buffer(&mut self) -> Result<(), TransportError> {
        // Rebuild the reader so locally buffered bytes are dropped along
        // with the kernel queue.
        let reader = self.port.take().ok_or(TransportError::Closed)?;
        let inner = reader.into_inner();
        let result = inner.clear(ClearBuffer::Input);
        self.port = Some(BufReader::new(inner));
        result.map_err(|e| TransportError::Bus(e.to_string()))
    }

    fn reset_output_buffer(&mut self) -> Result<(), TransportError> {
        self.port()?
            .get_ref()
            .clear(ClearBuffer::Output)
            .map_err(|e| TransportError::Bus(e.to_string()))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.port.take();
        Ok(())
    }
}
