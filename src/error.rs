// src/error.rs

use thiserror::Error;

/// Fault raised by a transport handle.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The handle was closed; no further operation is possible.
    #[error("transport handle already closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bus error: {0}")]
    Bus(String),
}

/// Fault raised by a sensor driver. Everything here is fatal for the
/// worker that hit it, except that parse failures on line-based sensors
/// are retried a bounded number of times first.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("could not parse sensor response {0:?}")]
    Parse(String),
    #[error("giving up after {attempts} failed read attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("sensor driver fault: {0}")]
    Driver(String),
}

impl SensorError {
    /// True for failures the line-based retry path may absorb.
    pub fn is_transient(&self) -> bool {
        matches!(self, SensorError::Parse(_))
    }
}
