// src/sensors/mod.rs
//
// The closed set of supported sensors. Each driver owns its transport
// handle and an Arc of its published-state struct; the `Driver` enum is
// the dispatch point the worker loop drives.

pub mod accelerometer;
pub mod pressure;
pub mod pulse_wave;
pub mod temperature_humidity;
pub mod thermistor;

use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::arbiter::BusArbiter;
use crate::error::SensorError;
use crate::transport::SerialTransport;

pub use accelerometer::{AccelerometerReading, AccelerometerSensor, AccelerometerState};
pub use pressure::{PressureReading, PressureSensor, PressureState};
pub use pulse_wave::{PulseWaveDriver, PulseWaveReading, PulseWaveSensor, PulseWaveState};
pub use temperature_humidity::{
    TemperatureHumidityReading, TemperatureHumiditySensor, TemperatureHumidityState,
};
pub use thermistor::{ThermistorReading, ThermistorSensor, ThermistorState};

/// Decode failures on a line-based sensor are retried this many times
/// (so four attempts in total) before the worker gives up and closes.
pub const MAX_RETRIES: u32 = 3;

/// Settle time a serial device gets after its port is opened, held under
/// the arbiter so neighbours on the wire do not talk into the drain.
pub(crate) const SERIAL_SETTLE: Duration = Duration::from_millis(1500);

/// One sensor driver, ready to be moved into a worker.
pub enum Driver {
    Pressure(PressureSensor),
    TemperatureHumidity(TemperatureHumiditySensor),
    PulseWave(PulseWaveSensor),
    Thermistor(ThermistorSensor),
    Accelerometer(AccelerometerSensor),
}

impl Driver {
    pub fn kind(&self) -> &'static str {
        match self {
            Driver::Pressure(_) => pressure::KIND,
            Driver::TemperatureHumidity(_) => temperature_humidity::KIND,
            Driver::PulseWave(_) => pulse_wave::KIND,
            Driver::Thermistor(_) => thermistor::KIND,
            Driver::Accelerometer(_) => accelerometer::KIND,
        }
    }

    /// Handle to the published state, cloned by the worker before the
    /// driver moves into its thread.
    pub fn shared(&self) -> SharedState {
        match self {
            Driver::Pressure(s) => SharedState::Pressure(s.state()),
            Driver::TemperatureHumidity(s) => SharedState::TemperatureHumidity(s.state()),
            Driver::PulseWave(s) => SharedState::PulseWave(s.state()),
            Driver::Thermistor(s) => SharedState::Thermistor(s.state()),
            Driver::Accelerometer(s) => SharedState::Accelerometer(s.state()),
        }
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        match self {
            Driver::Pressure(s) => s.setup(),
            Driver::TemperatureHumidity(s) => s.setup(),
            Driver::PulseWave(s) => s.setup(),
            Driver::Thermistor(s) => s.setup(),
            Driver::Accelerometer(s) => s.setup(),
        }
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        match self {
            Driver::Pressure(s) => s.sample(),
            Driver::TemperatureHumidity(s) => s.sample(),
            Driver::PulseWave(s) => s.sample(),
            Driver::Thermistor(s) => s.sample(),
            Driver::Accelerometer(s) => s.sample(),
        }
    }

    pub(crate) fn close(&mut self) {
        match self {
            Driver::Pressure(s) => s.close(),
            Driver::TemperatureHumidity(s) => s.close(),
            Driver::PulseWave(s) => s.close(),
            Driver::Thermistor(s) => s.close(),
            Driver::Accelerometer(s) => s.close(),
        }
    }
}

/// Reader-side handle to one sensor's published fields.
#[derive(Clone)]
pub enum SharedState {
    Pressure(std::sync::Arc<PressureState>),
    TemperatureHumidity(std::sync::Arc<TemperatureHumidityState>),
    PulseWave(std::sync::Arc<PulseWaveState>),
    Thermistor(std::sync::Arc<ThermistorState>),
    Accelerometer(std::sync::Arc<AccelerometerState>),
}

impl SharedState {
    pub fn reading(&self) -> Reading {
        match self {
            SharedState::Pressure(s) => Reading::Pressure(s.reading()),
            SharedState::TemperatureHumidity(s) => Reading::TemperatureHumidity(s.reading()),
            SharedState::PulseWave(s) => Reading::PulseWave(s.reading()),
            SharedState::Thermistor(s) => Reading::Thermistor(s.reading()),
            SharedState::Accelerometer(s) => Reading::Accelerometer(s.reading()),
        }
    }
}

/// Owned copy of one sensor's snapshot. Serializes to a flat field-name
/// to value map, `type` and `model_number` included.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Pressure(PressureReading),
    TemperatureHumidity(TemperatureHumidityReading),
    PulseWave(PulseWaveReading),
    Thermistor(ThermistorReading),
    Accelerometer(AccelerometerReading),
}

impl Reading {
    /// `measured_time` of whichever sensor this is.
    pub fn measured_time(&self) -> f64 {
        match self {
            Reading::Pressure(r) => r.measured_time,
            Reading::TemperatureHumidity(r) => r.measured_time,
            Reading::PulseWave(r) => r.measured_time,
            Reading::Thermistor(r) => r.measured_time,
            Reading::Accelerometer(r) => r.measured_time,
        }
    }
}

/// Drain both port buffers under the arbiter after the settle delay.
pub(crate) fn serial_setup(
    port: &mut dyn SerialTransport,
    arbiter: &BusArbiter,
) -> Result<(), SensorError> {
    let _bus = arbiter.lock();
    thread::sleep(SERIAL_SETTLE);
    port.reset_input_buffer()?;
    port.reset_output_buffer()?;
    Ok(())
}

/// One signal-write + line-read exchange. The arbiter is held for the
/// exchange only; it is released before the caller decodes or publishes.
fn serial_exchange(
    port: &mut dyn SerialTransport,
    arbiter: &BusArbiter,
    signal: &str,
) -> Result<String, SensorError> {
    let _bus = arbiter.lock();
    port.write(signal.as_bytes())?;
    Ok(port.read_line()?)
}

/// Sample one line-based sensor with the bounded retry policy: attempt,
/// then check the counter. No sleep between retries, nothing published
/// on a failed attempt, counter reset on success.
pub(crate) fn sample_line<T>(
    port: &mut dyn SerialTransport,
    arbiter: &BusArbiter,
    signal: &str,
    retry: &mut u32,
    decode: impl Fn(&str) -> Result<T, SensorError>,
) -> Result<T, SensorError> {
    loop {
        let line = serial_exchange(port, arbiter, signal)?;
        match decode(&line) {
            Ok(value) => {
                *retry = 0;
                return Ok(value);
            }
            Err(e) if e.is_transient() => {
                log::debug!("serial decode failed ({e}), retry {}", *retry + 1);
                *retry += 1;
                if *retry > MAX_RETRIES {
                    return Err(SensorError::RetriesExhausted { attempts: *retry });
                }
            }
            Err(e) => return Err(e),
        }
    }
}
