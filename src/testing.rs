// src/testing.rs

//! Deterministic doubles for the transport and driver boundaries, used by
//! this crate's tests and available to downstream consumers for theirs.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::{SensorError, TransportError};
use crate::sensors::pulse_wave::PulseWaveDriver;
use crate::transport::{I2cTransport, SerialTransport};

/// Call counters a test can keep after handing the mock to a driver.
#[derive(Debug, Default)]
pub struct MockStats {
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub closes: AtomicUsize,
}

/// I2C double backed by a register map and a fixed block readout.
#[derive(Default)]
pub struct MockI2c {
    regs: HashMap<u8, u8>,
    block: Vec<u8>,
    closed: bool,
    stats: Arc<MockStats>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, reg: u8, value: u8) -> Self {
        self.regs.insert(reg, value);
        self
    }

    pub fn with_block(mut self, block: Vec<u8>) -> Self {
        self.block = block;
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl I2cTransport for MockI2c {
    fn read_byte(&mut self, reg: u8) -> Result<u8, TransportError> {
        self.check_open()?;
        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        self.regs
            .get(&reg)
            .copied()
            .ok_or_else(|| TransportError::Bus(format!("no register 0x{reg:02x}")))
    }

    fn read_block(&mut self, _reg: u8, _len: usize) -> Result<Vec<u8>, TransportError> {
        self.check_open()?;
        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.block.clone())
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.check_open()?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        self.regs.insert(reg, value);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// Serial double that replays a fixed script of response lines.
pub struct ScriptedSerial {
    script: VecDeque<String>,
    /// Line returned forever once the script runs dry.
    repeated: Option<String>,
    fail_resets: bool,
    closed: bool,
    stats: Arc<MockStats>,
}

impl ScriptedSerial {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines.into_iter().map(Into::into).collect(),
            repeated: None,
            fail_resets: false,
            closed: false,
            stats: Arc::default(),
        }
    }

    /// A source that answers every read with the same line.
    pub fn repeating(line: impl Into<String>) -> Self {
        let mut mock = Self::new(Vec::<String>::new());
        mock.repeated = Some(line.into());
        mock
    }

    /// Keeps answering with `line` once the scripted lines run out.
    pub fn then_repeating(mut self, line: impl Into<String>) -> Self {
        self.repeated = Some(line.into());
        self
    }

    /// Makes `reset_*_buffer` fail, for setup-failure tests.
    pub fn fail_resets(mut self) -> Self {
        self.fail_resets = true;
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), TransportError> {
        self.check_open()?;
        if self.fail_resets {
            return Err(TransportError::Bus("buffer reset refused".into()));
        }
        Ok(())
    }
}

impl SerialTransport for ScriptedSerial {
    fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        self.check_open()?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        self.check_open()?;
        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        if let Some(line) = self.script.pop_front() {
            return Ok(line);
        }
        match &self.repeated {
            Some(line) => Ok(line.clone()),
            None => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "script exhausted",
            ))),
        }
    }

    fn reset_input_buffer(&mut self) -> Result<(), TransportError> {
        self.reset()
    }

    fn reset_output_buffer(&mut self) -> Result<(), TransportError> {
        self.reset()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// State of a simulated physical wire shared by several [`EchoSerial`]
/// handles. `pending` holds the id of the handle whose request byte is on
/// the wire and has not been answered yet.
#[derive(Debug, Default)]
pub struct SharedWire {
    pending: Mutex<Option<usize>>,
    pub violations: AtomicUsize,
}

impl SharedWire {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }
}

/// Serial double that echoes its handle id back as a numeric line, and
/// flags a violation whenever a write or read interleaves with another
/// handle's unfinished exchange.
pub struct EchoSerial {
    id: usize,
    wire: Arc<SharedWire>,
    /// How long a read keeps the wire busy, to widen the race window.
    hold: Duration,
    closed: bool,
    stats: Arc<MockStats>,
}

impl EchoSerial {
    pub fn new(id: usize, wire: Arc<SharedWire>, hold: Duration) -> Self {
        Self {
            id,
            wire,
            hold,
            closed: false,
            stats: Arc::default(),
        }
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl SerialTransport for EchoSerial {
    fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        self.check_open()?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.wire.pending.lock().unwrap();
        if pending.is_some() {
            self.wire.violations.fetch_add(1, Ordering::Relaxed);
        }
        *pending = Some(self.id);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        self.check_open()?;
        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        thread::sleep(self.hold);
        let mut pending = self.wire.pending.lock().unwrap();
        if *pending != Some(self.id) {
            self.wire.violations.fetch_add(1, Ordering::Relaxed);
        }
        *pending = None;
        Ok(format!("{}\n", self.id))
    }

    fn reset_input_buffer(&mut self) -> Result<(), TransportError> {
        self.check_open()
    }

    fn reset_output_buffer(&mut self) -> Result<(), TransportError> {
        self.check_open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// Pulse-wave driver double returning the same measurement every call.
pub struct MockPulseDriver {
    measurement: Vec<f64>,
    probe_fails: bool,
}

impl MockPulseDriver {
    pub fn new(measurement: Vec<f64>) -> Self {
        Self {
            measurement,
            probe_fails: false,
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }
}

impl PulseWaveDriver for MockPulseDriver {
    fn reset(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn probe(&mut self) -> Result<(), SensorError> {
        if self.probe_fails {
            return Err(SensorError::Driver("probe found no device".into()));
        }
        Ok(())
    }

    fn measure_single_get(&mut self) -> Result<Vec<f64>, SensorError> {
        Ok(self.measurement.clone())
    }
}
