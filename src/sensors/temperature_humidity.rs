// src/sensors/temperature_humidity.rs

use std::sync::Arc;

use serde::Serialize;

use crate::decode;
use crate::error::SensorError;
use crate::snapshot::{unix_now, SharedF64};
use crate::transport::I2cTransport;

pub const KIND: &str = "temperature_humidity_sensor";
pub const MODEL_NUMBER: &str = "SHT31";
pub const DEFAULT_ADDRESS: u16 = 0x45;

/// Periodic measurement command 0x2130, written as register 0x21 + byte 0x30.
const CMD_PERIODIC: (u8, u8) = (0x21, 0x30);
/// Fetch-data command 0xE000, issued before every block read.
const CMD_FETCH: (u8, u8) = (0xe0, 0x00);
/// Temperature word, CRC, humidity word, CRC. CRC bytes are not checked.
const READOUT_LEN: usize = 6;

#[derive(Debug, Default)]
pub struct TemperatureHumidityState {
    pub measured_time: SharedF64,
    pub temperature_celsius: SharedF64,
    pub humidity_percent: SharedF64,
}

impl TemperatureHumidityState {
    pub fn reading(&self) -> TemperatureHumidityReading {
        TemperatureHumidityReading {
            kind: KIND,
            model_number: MODEL_NUMBER,
            measured_time: self.measured_time.load(),
            temperature_celsius: self.temperature_celsius.load(),
            humidity_percent: self.humidity_percent.load(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureHumidityReading {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_number: &'static str,
    pub measured_time: f64,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
}

pub struct TemperatureHumiditySensor {
    bus: Box<dyn I2cTransport>,
    state: Arc<TemperatureHumidityState>,
}

impl TemperatureHumiditySensor {
    pub fn new(bus: Box<dyn I2cTransport>) -> Self {
        Self {
            bus,
            state: Arc::new(TemperatureHumidityState::default()),
        }
    }

    pub fn state(&self) -> Arc<TemperatureHumidityState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn setup(&mut self) -> Result<(), SensorError> {
        self.bus.write_byte(CMD_PERIODIC.0, CMD_PERIODIC.1)?;
        Ok(())
    }

    pub(crate) fn sample(&mut self) -> Result<(), SensorError> {
        self.bus.write_byte(CMD_FETCH.0, CMD_FETCH.1)?;
        let raw = self.bus.read_block(0x00, READOUT_LEN)?;
        if raw.len() != READOUT_LEN {
            return Err(SensorError::Parse(format!(
                "short readout: {} bytes",
                raw.len()
            )));
        }

        self.state
            .temperature_celsius
            .store(decode::sht31_temperature_celsius(raw[0], raw[1]));
        self.state
            .humidity_percent
            .store(decode::sht31_humidity_percent(raw[3], raw[4]));
        self.state.measured_time.store(unix_now());
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if let Err(e) = self.bus.close() {
            log::warn!("{KIND}: close failed: {e}");
        }
    }
}
