// src/lib.rs

//! Supervised acquisition from heterogeneous I2C and serial sensors.
//!
//! Each sensor runs in its own worker thread behind a fault boundary: a
//! transport error, a blown retry budget, or a panic closes that worker
//! and nothing else. The latest readings are published through per-field
//! atomic snapshots any thread can read without locks, and sensors that
//! share one physical serial line serialize their exchanges through a
//! [`BusArbiter`].
//!
//! The example below runs against the mock transports from
//! [`testing`]; on hardware, swap in the handles from `hal`
//! (`I2cHandle::open`, `SerialHandle::open_default`), available with the
//! default `linux-hal` feature.
//!
//! ```no_run
//! use sensor_hub::sensors::{PressureSensor, ThermistorSensor};
//! use sensor_hub::testing::{MockI2c, ScriptedSerial};
//! use sensor_hub::{BusArbiter, Driver, SensorWorker};
//!
//! let bus = MockI2c::new()
//!     .with_register(0x28, 0x00)
//!     .with_register(0x29, 0x00)
//!     .with_register(0x2a, 0x40)
//!     .with_register(0x2b, 0x00)
//!     .with_register(0x2c, 0x80);
//! let pressure = SensorWorker::spawn(Driver::Pressure(PressureSensor::new(Box::new(bus))));
//!
//! let arbiter = BusArbiter::new();
//! let port = ScriptedSerial::repeating("21.5\n");
//! let thermistor = SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
//!     Box::new(port),
//!     "1",
//!     arbiter.clone(),
//! )));
//!
//! println!("{:?}", pressure.reading());
//! println!("alive: {}", thermistor.is_active());
//! ```

pub mod arbiter;
pub mod decode;
pub mod error;
#[cfg(feature = "linux-hal")]
pub mod hal;
pub mod sensors;
pub mod snapshot;
pub mod testing;
pub mod transport;
pub mod worker;

pub use arbiter::{BusArbiter, BusGuard};
pub use error::{SensorError, TransportError};
pub use sensors::{Driver, Reading, SharedState};
pub use snapshot::SharedF64;
pub use worker::{SensorWorker, SAMPLE_INTERVAL};
