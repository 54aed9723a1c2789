// src/sensors/accelerometer.rs

use std::sync::Arc;

use serde::Serialize;

use crate::arbiter::BusArbiter;
use crate::decode;
use crate::error::SensorError;
use crate::sensors::{sample_line, serial_setup};
use crate::snapshot::{unix_now, SharedF64};
use crate::transport::SerialTransport;

pub const KIND: &str = "accelerometer";
pub const MODEL_NUMBER: &str = "KX224-1053";

#[derive(Debug, Default)]
pub struct AccelerometerState {
    pub measured_time: SharedF64,
    pub accelerometer_x_mps2: SharedF64,
    pub accelerometer_y_mps2: SharedF64,
    pub accelerometer_z_mps2: SharedF64,
}

impl AccelerometerState {
    pub fn reading(&self) -> AccelerometerReading {
        AccelerometerReading {
            kind: KIND,
            model_number: MODEL_NUMBER,
            measured_time: self.measured_time.load(),
            accelerometer_x_mps2: self.accelerometer_x_mps2.load(),
            accelerometer_y_mps2: self.accelerometer_y_mps2.load(),
            accelerometer_z_mps2: self.accelerometer_z_mps2.load(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccelerometerReading {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_number: &'static str,
    pub measured_time: f64,
    pub accelerometer_x_mps2: f64,
    pub accelerometer_y_mps2: f64,
    pub accelerometer_z_mps2: f64,
}

pub struct AccelerometerSensor {
    port: Box<dyn SerialTransport>,
    signal: String,
    arbiter: BusArbiter,
    retry: u32,
    state: Arc<AccelerometerState>,
}

impl AccelerometerSensor {
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
            state: Arc::new(AccelerometerState::default()),
        }
    }

    pub fn state(&self) -> Arc<AccelerometerState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        serial_setup(self.port.as_mut(), &self.arbiter)
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        let [x, y, z] = sample_line(
            self.port.as_mut(),
            &self.arbiter,
            &self.signal,
            &mut self.retry,
            decode::accelerometer_mps2,
        )?;
        // All three axes come from the same line; they publish together.
        self.state.accelerometer_x_mps2.store(x);
        self.state.accelerometer_y_mps2.store(y);
        self.state.accelerometer_z_mps2.store(z);
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
    fn bad_token_discards_all_axes() {
        let mock = ScriptedSerial::new(["1.0,bad,3.0\n", "4.0,5.0,6.0\n"]);
        let mut sensor = AccelerometerSensor::new(Box::new(mock), "2", BusArbiter::new());
        let state = sensor.state();

        sensor.sample().unwrap();
        // The bad line was retried; nothing from it leaked into the state.
        assert_eq!(state.accelerometer_x_mps2.load(), 4.0);
        assert_eq!(state.accelerometer_y_mps2.load(), 5.0);
        assert_eq!(state.accelerometer_z_mps2.load(), 6.0);
    }

    #[test]
    fn transport_fault_is_not_retried() {
        // Script runs dry after one bad line: the second attempt hits the
        // transport error and must surface it unchanged.
        let mock = ScriptedSerial::new(["x,y,z\n"]);
        let stats = mock.stats();
        let mut sensor = AccelerometerSensor::new(Box::new(mock), "2", BusArbiter::new());

        let err = sensor.sample().unwrap_err();
        assert!(matches!(err, SensorError::Transport(_)));
        assert_eq!(stats.reads.load(std::sync::atomic::Ordering::Relaxed), 2);
    }
}
