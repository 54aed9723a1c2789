// src/bin/simulate.rs
//
// Runs the full worker stack against simulated transports: one I2C
// pressure sensor plus a thermistor and an accelerometer sharing a
// simulated serial wire. Prints each worker's snapshot as JSON once per
// second, then shuts everything down.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sensor_hub::error::TransportError;
use sensor_hub::sensors::{AccelerometerSensor, PressureSensor, ThermistorSensor};
use sensor_hub::transport::{I2cTransport, SerialTransport};
use sensor_hub::{BusArbiter, Driver, SensorWorker};

/// I2C double producing a plausible pressure/temperature readout around
/// 1024 hPa with noise in the low bytes.
struct SimI2c {
    rng: StdRng,
}

impl SimI2c {
    fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl I2cTransport for SimI2c {
    fn read_byte(&mut self, reg: u8) -> Result<u8, TransportError> {
        Ok(match reg {
            0x28 => self.rng.random(),
            0x29 => self.rng.random_range(0x40..=0x60),
            0x2a => 0x40,
            0x2b => self.rng.random(),
            0x2c => self.rng.random_range(0x80..=0x82),
            _ => 0,
        })
    }

    fn read_block(&mut self, _reg: u8, len: usize) -> Result<Vec<u8>, TransportError> {
        Ok(vec![0; len])
    }

    fn write_byte(&mut self, _reg: u8, _value: u8) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Serial double answering every probe with a random reading, and now and
/// then with line noise to exercise the retry path.
struct SimSerial {
    rng: StdRng,
    axes: bool,
}

impl SimSerial {
    fn new(axes: bool) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            axes,
        }
    }
}

impl SerialTransport for SimSerial {
    fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        if self.rng.random_range(0..20) == 0 {
            return Ok("?#!\n".to_owned());
        }
        if self.axes {
            Ok(format!(
                "{:.2},{:.2},{:.2}\n",
                self.rng.random_range(-1.0..1.0),
                self.rng.random_range(-1.0..1.0),
                self.rng.random_range(9.0..10.5),
            ))
        } else {
            Ok(format!("{:.2}\n", self.rng.random_range(20.0..25.0)))
        }
    }

    fn reset_input_buffer(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn reset_output_buffer(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let arbiter = BusArbiter::new();
    let mut workers = vec![
        SensorWorker::spawn(Driver::Pressure(PressureSensor::new(Box::new(SimI2c::new())))),
        SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
            Box::new(SimSerial::new(false)),
            "1",
            arbiter.clone(),
        ))),
        SensorWorker::spawn(Driver::Accelerometer(AccelerometerSensor::new(
            Box::new(SimSerial::new(true)),
            "2",
            arbiter.clone(),
        ))),
    ];

    for _ in 0..10 {
        thread::sleep(Duration::from_secs(1));
        for worker in &workers {
            let json = serde_json::to_string(&worker.reading()).expect("snapshot serializes");
            println!("active={} {}", worker.is_active(), json);
        }
    }

    for worker in &mut workers {
        worker.stop();
    }
    log::info!("all workers stopped");
}
