// src/sensors/pulse_wave.rs

use std::sync::Arc;

use serde::Serialize;

use crate::error::SensorError;
use crate::snapshot::{unix_now, SharedF64};

pub const KIND: &str = "pulse_wave_sensor";
pub const MODEL_NUMBER: &str = "BH1792GLC";

/// External vendor driver for the pulse-wave front end. It manages its
/// own bus connection; the worker only drives this interface.
pub trait PulseWaveDriver: Send {
    fn reset(&mut self) -> Result<(), SensorError>;
    fn probe(&mut self) -> Result<(), SensorError>;
    /// One single-shot measurement; the first element is the heart-rate value.
    fn measure_single_get(&mut self) -> Result<Vec<f64>, SensorError>;
}

#[derive(Debug, Default)]
pub struct PulseWaveState {
    pub measured_time: SharedF64,
    pub heart_bpm_fifo_1204hz: SharedF64,
}

impl PulseWaveState {
    pub fn reading(&self) -> PulseWaveReading {
        PulseWaveReading {
            kind: KIND,
            model_number: MODEL_NUMBER,
            measured_time: self.measured_time.load(),
            heart_bpm_fifo_1204hz: self.heart_bpm_fifo_1204hz.load(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PulseWaveReading {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_number: &'static str,
    pub measured_time: f64,
    pub heart_bpm_fifo_1204hz: f64,
}

pub struct PulseWaveSensor {
    driver: Box<dyn PulseWaveDriver>,
    state: Arc<PulseWaveState>,
}

impl PulseWaveSensor {
    pub fn new(driver: Box<dyn PulseWaveDriver>) -> Self {
        Self {
            driver,
            state: Arc::new(PulseWaveState::default()),
        }
    }

    pub fn state(&self) -> Arc<PulseWaveState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        self.driver.reset()?;
        self.driver.probe()?;
        Ok(())
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        let measurement = self.driver.measure_single_get()?;
        let bpm = *measurement
            .first()
            .ok_or_else(|| SensorError::Driver("empty measurement".into()))?;

        self.state.heart_bpm_fifo_1204hz.store(bpm);
        self.state.measured_time.store(unix_now());
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        // The vendor driver owns its connection; nothing to release here.
        log::debug!("{KIND}: closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPulseDriver;

    #[test]
    fn sample_publishes_first_element() {
        let mut sensor = PulseWaveSensor::new(Box::new(MockPulseDriver::new(vec![72.0, 1.0, 2.0])));
        let state = sensor.state();

        sensor.setup().unwrap();
        sensor.sample().unwrap();

        assert_eq!(state.heart_bpm_fifo_1204hz.load(), 72.0);
        assert!(state.measured_time.load() > 0.0);
    }

    #[test]
    fn empty_measurement_is_a_fault() {
        let mut sensor = PulseWaveSensor::new(Box::new(MockPulseDriver::new(vec![])));
        let state = sensor.state();

        assert!(sensor.sample().is_err());
        assert_eq!(state.measured_time.load(), 0.0);
    }

    #[test]
    fn failed_probe_fails_setup() {
        let mut sensor =
            PulseWaveSensor::new(Box::new(MockPulseDriver::new(vec![72.0]).failing_probe()));
        assert!(sensor.setup().is_err());
    }
}
