// src/sensors/pressure.rs

use std::sync::Arc;

use serde::Serialize;

use crate::decode;
use crate::error::SensorError;
use crate::snapshot::{unix_now, SharedF64};
use crate::transport::I2cTransport;

pub const KIND: &str = "pressure_sensor";
pub const MODEL_NUMBER: &str = "LPS251B";
pub const DEFAULT_ADDRESS: u16 = 0x5c;

const CTRL_REG1: u8 = 0x20;
/// Power on, 25 Hz output data rate.
const CTRL_REG1_ODR_25HZ: u8 = 0xc0;
/// First of five output registers: three pressure bytes, two temperature bytes.
const PRESS_OUT_XL: u8 = 0x28;

/// Published state: one writer (the worker), any number of readers.
#[derive(Debug, Default)]
pub struct PressureState {
    pub measured_time: SharedF64,
    pub pressure_hpa: SharedF64,
    pub temperature_celsius: SharedF64,
    pub altitude_meters: SharedF64,
}

impl PressureState {
    pub fn reading(&self) -> PressureReading {
        PressureReading {
            kind: KIND,
            model_number: MODEL_NUMBER,
            measured_time: self.measured_time.load(),
            pressure_hpa: self.pressure_hpa.load(),
            temperature_celsius: self.temperature_celsius.load(),
            altitude_meters: self.altitude_meters.load(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PressureReading {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_number: &'static str,
    pub measured_time: f64,
    pub pressure_hpa: f64,
    pub temperature_celsius: f64,
    pub altitude_meters: f64,
}

pub struct PressureSensor {
    bus: Box<dyn I2cTransport>,
    state: Arc<PressureState>,
}

impl PressureSensor {
    pub fn new(bus: Box<dyn I2cTransport>) -> Self {
        Self {
            bus,
            state: Arc::new(PressureState::default()),
        }
    }

    pub fn state(&self) -> Arc<PressureState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        self.bus.write_byte(CTRL_REG1, CTRL_REG1_ODR_25HZ)?;
        Ok(())
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        let mut raw = [0u8; 5];
        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = self.bus.read_byte(PRESS_OUT_XL + i as u8)?;
        }
        let pressure = decode::pressure_hpa([raw[0], raw[1], raw[2]]);
        let temperature = decode::pressure_temperature_celsius([raw[3], raw[4]]);

        self.state.pressure_hpa.store(pressure);
        self.state.temperature_celsius.store(temperature);
        self.state
            .altitude_meters
            .store(decode::altitude_meters(pressure, temperature));
        self.state.measured_time.store(unix_now());
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if let Err(e) = self.bus.close() {
            log::warn!("{KIND}: close failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockI2c;

    #[test]
    fn sample_publishes_converted_fields() {
        let mock = MockI2c::new()
            .with_register(0x28, 0x00)
            .with_register(0x29, 0x00)
            .with_register(0x2a, 0x40)
            .with_register(0x2b, 0x00)
            .with_register(0x2c, 0x80);
        let stats = mock.stats();
        let mut sensor = PressureSensor::new(Box::new(mock));
        let state = sensor.state();

        sensor.setup().unwrap();
        sensor.sample().unwrap();

        assert_eq!(state.pressure_hpa.load(), 1024.0);
        let expected_temp = 42.5 + (32768.0 - 65535.0) / 480.0;
        assert!((state.temperature_celsius.load() - expected_temp).abs() < 1e-9);
        assert!(state.measured_time.load() > 0.0);
        assert_eq!(stats.writes.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(stats.reads.load(std::sync::atomic::Ordering::Relaxed), 5);
    }

    #[test]
    fn close_is_idempotent() {
        let mock = MockI2c::new();
        let stats = mock.stats();
        let mut sensor = PressureSensor::new(Box::new(mock));
        sensor.close();
        sensor.close();
        assert_eq!(stats.closes.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
