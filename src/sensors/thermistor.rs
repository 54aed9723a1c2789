// src/sensors/thermistor.rs

use std::sync::Arc;

use serde::Serialize;

use crate::arbiter::BusArbiter;
use crate::decode;
use crate::error::SensorError;
use crate::sensors::{sample_line, serial_setup};
use crate::snapshot::{unix_now, SharedF64};
use crate::transport::SerialTransport;

pub const KIND: &str = "thermistor";
pub const MODEL_NUMBER: &str = "103JT-050";

#[derive(Debug, Default)]
pub struct ThermistorState {
    pub measured_time: SharedF64,
    pub temperature_celsius: SharedF64,
}

impl ThermistorState {
    pub fn reading(&self) -> ThermistorReading {
        ThermistorReading {
            kind: KIND,
            model_number: MODEL_NUMBER,
            measured_time: self.measured_time.load(),
            temperature_celsius: self.temperature_celsius.load(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermistorReading {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_number: &'static str,
    pub measured_time: f64,
    pub temperature_celsius: f64,
}

pub struct ThermistorSensor {
    port: Box<dyn SerialTransport>,
    /// Probe byte(s) written to request one reading from this sensor.
    signal: String,
    arbiter: BusArbiter,
    retry: u32,
    state: Arc<ThermistorState>,
}

impl ThermistorSensor {
    pub fn new(
        port: Box<dyn SerialTransport>,
        signal: impl Into<String>,
        arbiter: BusArbiter,
    ) -> Self {
        Self {
            port,
            signal: signal.into(),
            arbiter,
            retry: 0,
            state: Arc::new(ThermistorState::default()),
        }
    }

    pub fn state(&self) -> Arc<ThermistorState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        serial_setup(self.port.as_mut(), &self.arbiter)
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        let temperature = sample_line(
            self.port.as_mut(),
            &self.arbiter,
            &self.signal,
            &mut self.retry,
            decode::thermistor_celsius,
        )?;
        self.state.temperature_celsius.store(temperature);
        self.state.measured_time.store(unix_now());
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if let Err(e) = self.port.close() {
            log::warn!("{KIND}: close failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSerial;

    #[test]
    fn retry_counter_resets_on_success() {
        let mock = ScriptedSerial::new(["bad\n", "bad\n", "21.5\n", "22.0\n"]);
        let stats = mock.stats();
        let mut sensor = ThermistorSensor::new(Box::new(mock), "1", BusArbiter::new());
        let state = sensor.state();

        sensor.sample().unwrap();
        assert_eq!(state.temperature_celsius.load(), 21.5);
        assert_eq!(sensor.retry, 0);
        assert_eq!(stats.reads.load(std::sync::atomic::Ordering::Relaxed), 3);

        sensor.sample().unwrap();
        assert_eq!(state.temperature_celsius.load(), 22.0);
    }

    #[test]
    fn four_failed_attempts_exhaust_the_budget() {
        let mock = ScriptedSerial::repeating("nope\n");
        let stats = mock.stats();
        let mut sensor = ThermistorSensor::new(Box::new(mock), "1", BusArbiter::new());
        let state = sensor.state();

        let err = sensor.sample().unwrap_err();
        assert!(matches!(err, SensorError::RetriesExhausted { attempts: 4 }));
        assert_eq!(stats.reads.load(std::sync::atomic::Ordering::Relaxed), 4);
        assert_eq!(state.temperature_celsius.load(), 0.0);
        assert_eq!(state.measured_time.load(), 0.0);
    }
}
